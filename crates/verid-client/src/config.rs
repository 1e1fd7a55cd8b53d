//! Connection settings for the verification service.

use std::time::Duration;

use serde::Deserialize;

fn default_base_url() -> String { "http://localhost:8000".to_owned() }

fn default_probe_timeout_secs() -> u64 { 5 }

/// Settings for [`HttpBackend`](crate::HttpBackend), usually deserialised
/// from the `[backend]` table of the CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  #[serde(default = "default_base_url")]
  pub base_url:             String,
  /// Upper bound on the reachability probe and the health check.
  #[serde(default = "default_probe_timeout_secs")]
  pub probe_timeout_secs:   u64,
  /// Optional bound on the verification request itself. Unset by default:
  /// the probe is what keeps the workflow from hanging on a dead service.
  #[serde(default)]
  pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      base_url:             default_base_url(),
      probe_timeout_secs:   default_probe_timeout_secs(),
      request_timeout_secs: None,
    }
  }
}

impl BackendConfig {
  pub fn with_base_url(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      ..Self::default()
    }
  }

  pub fn probe_timeout(&self) -> Duration { Duration::from_secs(self.probe_timeout_secs) }

  pub fn request_timeout(&self) -> Option<Duration> {
    self.request_timeout_secs.map(Duration::from_secs)
  }
}
