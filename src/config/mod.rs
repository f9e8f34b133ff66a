//! Configuration management.
//!
//! The backend is addressed through a single base URL. It is resolved with
//! this priority:
//! 1. `--api-url` flag / `TB_API_URL` environment variable
//! 2. `api_url` in `<taskboard dir>/config.json`
//! 3. [`DEFAULT_API_URL`]
//!
//! The taskboard directory is `~/.taskboard`, or `TB_HOME` when set.

mod session_file;

pub use session_file::{clear_session, read_session, write_session, StoredSession};

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:9000/api";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE: &str = "config.json";

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Where the effective base URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlSource {
    /// Command-line flag or `TB_API_URL`
    Override,
    File,
    Default,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub api_url: String,
    pub api_url_source: UrlSource,
    pub timeout_secs: u64,
}

impl Config {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The taskboard directory: `TB_HOME`, else `~/.taskboard`.
#[must_use]
pub fn taskboard_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("TB_HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    directories::BaseDirs::new().map(|b| b.home_dir().join(".taskboard"))
}

/// Like [`taskboard_dir`], but an error when no home directory exists.
pub fn require_taskboard_dir() -> Result<PathBuf> {
    taskboard_dir().ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load `config.json` from `dir`. A missing file is an empty config.
pub fn load_config_file(dir: &Path) -> Result<ConfigFile> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save `config.json` into `dir`, merging with what is already there.
pub fn save_config_file(dir: &Path, update: &ConfigFile) -> Result<ConfigFile> {
    if let Some(url) = &update.api_url {
        validate_api_url(url)?;
    }

    let existing = load_config_file(dir)?;
    let merged = ConfigFile {
        api_url: update.api_url.clone().or(existing.api_url),
        timeout_secs: update.timeout_secs.or(existing.timeout_secs),
    };

    fs::create_dir_all(dir)
        .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;

    let content = serde_json::to_string_pretty(&merged)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(dir.join(CONFIG_FILE), content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(merged)
}

/// Only absolute http(s) URLs are accepted as a base URL.
pub fn validate_api_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::Config(format!("Invalid API URL '{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Invalid API URL '{url}': scheme must be http or https"
        )));
    }
    Ok(())
}

/// Resolve the effective configuration from an override and a config file.
pub fn resolve_with(override_url: Option<&str>, file: &ConfigFile) -> Result<Config> {
    let override_url = override_url.map(str::trim).filter(|u| !u.is_empty());

    let (api_url, api_url_source) = match (override_url, file.api_url.as_deref()) {
        (Some(url), _) => (url.to_string(), UrlSource::Override),
        (None, Some(url)) => (url.to_string(), UrlSource::File),
        (None, None) => (DEFAULT_API_URL.to_string(), UrlSource::Default),
    };
    validate_api_url(&api_url)?;

    let timeout_secs = file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::Config("timeout_secs must be at least 1".into()));
    }

    Ok(Config {
        api_url: api_url.trim_end_matches('/').to_string(),
        api_url_source,
        timeout_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_priority() {
        let file = ConfigFile {
            api_url: Some("http://file.example/api".into()),
            timeout_secs: Some(5),
        };

        let cfg = resolve_with(Some("https://flag.example/api/"), &file).unwrap();
        assert_eq!(cfg.api_url, "https://flag.example/api");
        assert_eq!(cfg.api_url_source, UrlSource::Override);
        assert_eq!(cfg.timeout(), Duration::from_secs(5));

        let cfg = resolve_with(None, &file).unwrap();
        assert_eq!(cfg.api_url, "http://file.example/api");
        assert_eq!(cfg.api_url_source, UrlSource::File);

        let cfg = resolve_with(Some("  "), &ConfigFile::default()).unwrap();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.api_url_source, UrlSource::Default);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_urls_rejected() {
        assert!(resolve_with(Some("localhost:9000"), &ConfigFile::default()).is_err());
        assert!(resolve_with(Some("ftp://host/api"), &ConfigFile::default()).is_err());
        let zero = ConfigFile {
            timeout_secs: Some(0),
            ..ConfigFile::default()
        };
        assert!(resolve_with(None, &zero).is_err());
    }

    #[test]
    fn test_save_merges_with_existing() {
        let dir = tempfile::tempdir().unwrap();
        save_config_file(
            dir.path(),
            &ConfigFile {
                api_url: Some("http://a.example/api".into()),
                timeout_secs: None,
            },
        )
        .unwrap();
        let merged = save_config_file(
            dir.path(),
            &ConfigFile {
                api_url: None,
                timeout_secs: Some(10),
            },
        )
        .unwrap();

        assert_eq!(merged.api_url.as_deref(), Some("http://a.example/api"));
        assert_eq!(load_config_file(dir.path()).unwrap(), merged);
    }

    #[test]
    fn test_missing_file_is_empty_and_bad_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config_file(dir.path()).unwrap(), ConfigFile::default());

        fs::write(dir.path().join(CONFIG_FILE), "nope").unwrap();
        let err = load_config_file(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
