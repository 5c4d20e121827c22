//! Serde-deserializable wrappers matching Zube API responses.
//!
//! Resource records themselves live in `types`; this module only covers the
//! envelopes Zube wraps them in.

use serde::Deserialize;

// ============================================================================
// Paginated list endpoints
// ============================================================================

/// Envelope returned by every Zube list endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiPaginated<T> {
  #[serde(default)]
  pub page: u64,
  #[serde(default)]
  pub per_page: u64,
  #[serde(default)]
  pub total_pages: u64,
  #[serde(default)]
  pub total: u64,
  pub data: Vec<T>,
}

// ============================================================================
// Token endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiAccessToken {
  #[serde(default)]
  pub access_token: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_paginated_tolerates_missing_metadata() {
    let page: ApiPaginated<serde_json::Value> =
      serde_json::from_str(r#"{"data":[{"id":1},{"id":2}]}"#).unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 0);
  }

  #[test]
  fn test_paginated_requires_data() {
    assert!(serde_json::from_str::<ApiPaginated<serde_json::Value>>(r#"{"page":1}"#).is_err());
  }
}
