//! Layered configuration: optional TOML file, then `VERID_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use verid_client::BackendConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub backend:    BackendConfig,
  /// SQLite file holding the identity record.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("verid.db") }

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Default)]
pub struct Overrides {
  pub url:   Option<String>,
  pub store: Option<PathBuf>,
}

impl Settings {
  /// Build settings from `file` (if it exists), the environment and
  /// `overrides`, in increasing precedence.
  ///
  /// Nested keys use `__` in the environment, e.g.
  /// `VERID_BACKEND__BASE_URL`.
  pub fn load(file: &Path, overrides: Overrides) -> anyhow::Result<Self> {
    Self::build(file, environment(), overrides)
  }

  fn build(
    file: &Path,
    env: config::Environment,
    overrides: Overrides,
  ) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file.to_path_buf()).required(false))
      .add_source(env)
      .set_override_option("backend.base_url", overrides.url)?
      .set_override_option(
        "store_path",
        overrides.store.map(|p| p.to_string_lossy().into_owned()),
      )?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut settings: Self = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// `VERID_` prefix, `__` between nested keys.
fn environment() -> config::Environment {
  config::Environment::with_prefix("VERID")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
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
  use std::io::Write as _;

  use super::*;

  fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
  }

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml"), Overrides::default()).unwrap();
    assert_eq!(settings.backend.base_url, "http://localhost:8000");
    assert_eq!(settings.backend.request_timeout_secs, None);
    assert_eq!(settings.store_path, PathBuf::from("verid.db"));
  }

  #[test]
  fn file_values_are_read() {
    let file = config_file(
      r#"
      store_path = "/var/lib/verid/records.db"

      [backend]
      base_url = "http://10.0.0.5:8000"
      request_timeout_secs = 120
      "#,
    );
    let settings = Settings::load(file.path(), Overrides::default()).unwrap();
    assert_eq!(settings.backend.base_url, "http://10.0.0.5:8000");
    assert_eq!(settings.backend.request_timeout_secs, Some(120));
    assert_eq!(settings.store_path, PathBuf::from("/var/lib/verid/records.db"));
  }

  #[test]
  fn flags_override_file() {
    let file = config_file("[backend]\nbase_url = \"http://file:8000\"\n");
    let settings = Settings::load(
      file.path(),
      Overrides {
        url:   Some("http://flag:9000".into()),
        store: Some(PathBuf::from("flag.db")),
      },
    )
    .unwrap();
    assert_eq!(settings.backend.base_url, "http://flag:9000");
    assert_eq!(settings.store_path, PathBuf::from("flag.db"));
  }

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let vars = vars
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect();
    environment().source(Some(vars))
  }

  #[test]
  fn environment_overrides_file() {
    let file = config_file("[backend]\nbase_url = \"http://file:8000\"\n");
    let settings = Settings::build(
      file.path(),
      env(&[
        ("VERID_BACKEND__BASE_URL", "http://env:1234"),
        ("VERID_BACKEND__PROBE_TIMEOUT_SECS", "9"),
        ("VERID_STORE_PATH", "/tmp/env.db"),
      ]),
      Overrides::default(),
    )
    .unwrap();
    assert_eq!(settings.backend.base_url, "http://env:1234");
    assert_eq!(settings.backend.probe_timeout_secs, 9);
    assert_eq!(settings.store_path, PathBuf::from("/tmp/env.db"));
  }

  #[test]
  fn flags_override_environment() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::build(
      &dir.path().join("absent.toml"),
      env(&[("VERID_BACKEND__BASE_URL", "http://env:1234")]),
      Overrides {
        url:   Some("http://flag:9000".into()),
        store: None,
      },
    )
    .unwrap();
    assert_eq!(settings.backend.base_url, "http://flag:9000");
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/verid.db")), PathBuf::from(home).join("verid.db"));
    assert_eq!(expand_tilde(Path::new("/abs/verid.db")), PathBuf::from("/abs/verid.db"));
  }
}
