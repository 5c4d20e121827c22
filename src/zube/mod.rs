//! Zube REST API access.

pub mod api_types;
pub mod client;
pub mod helpers;
pub mod types;

pub use client::ZubeClient;
