use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Name used for the profile directory, cache directory and key file.
pub const APP_NAME: &str = "zube";

pub const DEFAULT_BASE_URL: &str = "https://zube.io";

pub const USER_AGENT: &str = "Zube-CLI";

/// Locally saved profile: who we are and the last issued access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  #[serde(default)]
  pub client_id: String,
  /// Access JWT, valid for 24h once issued
  #[serde(default)]
  pub access_token: String,
}

impl Profile {
  /// Load the profile.
  ///
  /// Uses the explicit path if provided, otherwise `~/config/zube/config.yml`.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    if !path.exists() {
      return Err(Error::Config(format!(
        "Profile not found at {}. Run `zube config init --client-id <ID>` first.",
        path.display()
      )));
    }

    Self::load_from_path(&path)
  }

  pub fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| Error::Config(format!("Failed to read profile {}: {}", path.display(), e)))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| Error::Config(format!("Failed to parse profile {}: {}", path.display(), e)))
  }

  /// Write the whole profile back to `path`, creating parent directories.
  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        Error::Config(format!(
          "Failed to create profile directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let contents = serde_yaml::to_string(self)
      .map_err(|e| Error::Config(format!("Failed to serialize profile: {}", e)))?;

    std::fs::write(path, contents)
      .map_err(|e| Error::Config(format!("Failed to write profile {}: {}", path.display(), e)))
  }

  /// `~/config/zube/config.yml`
  pub fn default_path() -> Result<PathBuf> {
    Ok(home_dir()?.join("config").join(APP_NAME).join("config.yml"))
  }
}

/// `~/.ssh/zube_api_key.pem`
pub fn private_key_path() -> Result<PathBuf> {
  Ok(
    home_dir()?
      .join(".ssh")
      .join(format!("{}_api_key.pem", APP_NAME)),
  )
}

/// Per-user cache directory, e.g. `~/.cache/zube` on Linux.
pub fn cache_dir() -> Result<PathBuf> {
  let base = dirs::cache_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
    .ok_or_else(|| Error::Config("Could not determine cache directory".into()))?;

  Ok(base.join(APP_NAME))
}

fn home_dir() -> Result<PathBuf> {
  dirs::home_dir().ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Transport settings for the REST client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Scheme and host every API path is resolved against
  pub base_url: String,
  pub timeout: Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout: Duration::from_secs(10),
    }
  }
}

impl ClientConfig {
  pub fn with_base_url(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      ..Self::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_profile_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yml");

    let profile = Profile {
      client_id: "client-123".into(),
      access_token: "token-abc".into(),
    };
    profile.save(&path).unwrap();

    assert_eq!(Profile::load(Some(&path)).unwrap(), profile);
  }

  #[test]
  fn test_profile_written_as_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");

    Profile {
      client_id: "abc".into(),
      access_token: String::new(),
    }
    .save(&path)
    .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("client_id: abc"));
    assert!(contents.contains("access_token:"));
  }

  #[test]
  fn test_missing_access_token_defaults_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(&path, "client_id: only-id\n").unwrap();

    let profile = Profile::load_from_path(&path).unwrap();
    assert_eq!(profile.client_id, "only-id");
    assert!(profile.access_token.is_empty());
  }

  #[test]
  fn test_missing_profile_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Profile::load(Some(&dir.path().join("nope.yml"))).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
  }

  #[test]
  fn test_malformed_profile_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(&path, "client_id: [unterminated\n").unwrap();

    assert!(matches!(
      Profile::load_from_path(&path),
      Err(Error::Config(_))
    ));
  }
}
