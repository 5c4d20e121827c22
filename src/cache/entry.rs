//! Cache entry format and key derivation.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// A cached response body together with the validator it was served with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  /// Remote resource `ETag`
  pub etag: String,
  /// Response body, stored untyped since every resource shares the format
  pub data: serde_json::Value,
}

/// Cache key for a request URL: lowercase SHA-1 hex of the exact URL string.
///
/// No normalization happens here. Two URLs that differ by a single byte are
/// two entries.
pub fn cache_key(url: &str) -> String {
  let mut hasher = Sha1::new();
  hasher.update(url.as_bytes());
  hex::encode(hasher.finalize())
}
