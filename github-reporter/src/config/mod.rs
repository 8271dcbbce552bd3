//! Configuration loading.
//!
//! This module handles parsing the reporter's `config.toml`, which holds the
//! rating thresholds together with cache and server settings. Every key is
//! optional; a missing key falls back to its default.

mod error;
mod policy;

pub use error::ConfigError;
pub use policy::RatingPolicy;

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default number of repositories rated concurrently within a page.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default freshness window for cached pages (1 hour).
pub const DEFAULT_CACHE_EXPIRY_SECS: u64 = 60 * 60;

/// Default address of the rating server.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Parsed contents of a `config.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReporterConfig {
    /// Maximum repositories rated concurrently within a page.
    pub concurrency: usize,

    /// Rating thresholds.
    pub rating: RatingPolicy,

    /// Client-side cache settings.
    pub cache: CacheSettings,

    /// Rating server settings.
    pub server: ServerSettings,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            rating: RatingPolicy::default(),
            cache: CacheSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

/// Client-side cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheSettings {
    /// Seconds a cached page stays fresh.
    pub expiry_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expiry_secs: DEFAULT_CACHE_EXPIRY_SECS,
        }
    }
}

impl CacheSettings {
    /// Returns the freshness window as a [`Duration`].
    #[must_use]
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

/// Rating server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerSettings {
    /// Base URL the client sends page requests to.
    pub url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl ReporterConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid TOML,
    /// or contains out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading config");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config = Self::parse(&content, path)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Loads the configuration at `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a path is given and loading it fails.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parses and validates configuration text. `path` is only used in errors.
    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })?;

        validate_config(&config, path)?;
        Ok(config)
    }
}

/// Validates configuration values.
fn validate_config(config: &ReporterConfig, path: &Path) -> Result<(), ConfigError> {
    let path_str = path.display().to_string();

    if config.concurrency == 0 {
        return Err(ConfigError::ValidationError {
            path: path_str,
            message: "concurrency must be at least 1".to_string(),
        });
    }

    if config.cache.expiry_secs == 0 {
        return Err(ConfigError::ValidationError {
            path: path_str,
            message: "cache.expiry-secs must be at least 1".to_string(),
        });
    }

    if config.rating.old_pull_request_days == 0 {
        return Err(ConfigError::ValidationError {
            path: path_str,
            message: "rating.old-pull-request-days must be at least 1".to_string(),
        });
    }

    if Url::parse(&config.server.url).is_err() {
        return Err(ConfigError::ValidationError {
            path: path_str,
            message: format!("server.url is not a valid URL: {}", config.server.url),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<ReporterConfig, ConfigError> {
        ReporterConfig::parse(content, Path::new("config.toml"))
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse("").unwrap();

        assert_eq!(config, ReporterConfig::default());
        assert_eq!(config.rating.readme_min_lines, 100);
        assert_eq!(config.rating.max_stale_branches, 5);
        assert_eq!(config.rating.old_pull_request_days, 21);
        assert_eq!(config.rating.max_old_pull_requests, 10);
        assert_eq!(config.cache.expiry(), Duration::from_secs(3600));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse(
            r#"
concurrency = 2

[rating]
max-stale-branches = 8
"#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 2);
        assert_eq!(config.rating.max_stale_branches, 8);
        assert_eq!(config.rating.readme_min_lines, 100);
        assert_eq!(config.server.url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let result = parse("concurrency = 0");
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_invalid_server_url() {
        let result = parse(
            r#"
[server]
url = "not-a-url"
"#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_unknown_value_types() {
        let result = parse("concurrency = \"many\"");
        assert!(matches!(result, Err(ConfigError::TomlError { .. })));
    }

    #[test]
    fn load_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[cache]\nexpiry-secs = 60\n").unwrap();

        let config = ReporterConfig::load(&path).unwrap();
        assert_eq!(config.cache.expiry_secs, 60);
    }

    #[test]
    fn load_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = ReporterConfig::load(&temp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn load_or_default_without_path() {
        let config = ReporterConfig::load_or_default(None).unwrap();
        assert_eq!(config, ReporterConfig::default());
    }
}
