//! Error types shared by every layer of the client.

use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Missing or unreadable profile, key file or directory.
  #[error("configuration error: {0}")]
  Config(String),

  /// No usable credential, signing failure or token issuance failure.
  #[error("authentication error: {0}")]
  Auth(String),

  #[error("failed to reach {url}: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("failed to decode {context}: {source}")]
  Decode {
    context: String,
    #[source]
    source: serde_json::Error,
  },

  /// A request body or cached payload could not be serialized.
  #[error("failed to encode {context}: {source}")]
  Encode {
    context: String,
    #[source]
    source: serde_json::Error,
  },

  /// Local cache could not be read or written. Never fatal to a request.
  #[error("cache error: {0}")]
  Cache(String),

  #[error("{url} responded with {status}: {body}")]
  Api {
    url: String,
    status: StatusCode,
    body: String,
  },

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),
}

impl Error {
  pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
    Error::Decode {
      context: context.into(),
      source,
    }
  }

  pub(crate) fn encode(context: impl Into<String>, source: serde_json::Error) -> Self {
    Error::Encode {
      context: context.into(),
      source,
    }
  }
}
