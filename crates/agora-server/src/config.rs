//! Runtime configuration, layered from an optional TOML file and `AGORA_*`
//! environment variables.

use std::path::{Path, PathBuf};

use agora_core::service::DEFAULT_PAGE_SIZE;
use axum::http::{HeaderName, header::InvalidHeaderName};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Number of questions returned by the listing.
  #[serde(default = "default_page_size")]
  pub page_size:           usize,
  /// Trusted header set by the upstream identity provider.
  #[serde(default = "default_identity_header")]
  pub identity_header:     String,
  /// Total attempts for a vote write that hits a busy database.
  #[serde(default = "default_vote_retry_attempts")]
  pub vote_retry_attempts: u32,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("agora.db") }
fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }
fn default_identity_header() -> String { agora_api::DEFAULT_IDENTITY_HEADER.into() }
fn default_vote_retry_attempts() -> u32 { 3 }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `AGORA_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("AGORA"))
      .build()?
      .try_deserialize()
  }

  pub fn identity_header_name(&self) -> Result<HeaderName, InvalidHeaderName> {
    HeaderName::from_bytes(self.identity_header.trim().to_ascii_lowercase().as_bytes())
  }

  /// `store_path` with a leading `~/` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;
  use config::{Config, File, FileFormat};

  fn from_toml(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_apply_to_empty_file() {
    let cfg = from_toml("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.page_size, 5);
    assert_eq!(cfg.identity_header, "x-remote-user");
    assert_eq!(cfg.vote_retry_attempts, 3);
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = from_toml(
      r#"
      port = 9090
      page_size = 10
      identity_header = "X-Forwarded-User"
      store_path = "/var/lib/agora/polls.db"
      "#,
    );
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.page_size, 10);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/agora/polls.db"));
    assert_eq!(cfg.identity_header_name().unwrap().as_str(), "x-forwarded-user");
  }

  #[test]
  fn invalid_identity_header_is_rejected() {
    let cfg = from_toml(r#"identity_header = "not a header""#);
    assert!(cfg.identity_header_name().is_err());
  }

  #[test]
  fn absolute_store_path_is_untouched() {
    let cfg = from_toml(r#"store_path = "/tmp/agora.db""#);
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("/tmp/agora.db"));
  }
}
