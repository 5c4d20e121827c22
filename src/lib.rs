//! Access layer for the Zube.io REST API.
//!
//! - [`query`] encodes list parameters into Zube's query string format
//! - [`auth`] keeps a valid access token around, refreshing it with a signed assertion
//! - [`cache`] stores ETag validated responses on disk
//! - [`zube`] ties them together into a typed client

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod zube;

pub use error::{Error, Result};
