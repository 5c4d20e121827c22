//! ETag validated response cache.
//!
//! This module provides a best-effort local store for API responses that:
//! - Keys each response by the SHA-1 of its full request URL
//! - Remembers the `ETag` the server sent so the next request can be conditional
//! - Never fails a request: read and write problems degrade to a cache miss

mod entry;
mod storage;

pub use entry::{cache_key, CacheEntry};
pub use storage::{CacheStorage, FileStorage, NoopStorage};
