use std::path::PathBuf;
use std::time::Duration;

use github_reporter::{ConfigError, ReporterConfig};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/config")
}

#[test]
fn load_config_from_fixture() {
    let config = ReporterConfig::load(&fixtures_root().join("custom.toml")).unwrap();

    assert_eq!(config.concurrency, 3);
    assert_eq!(config.rating.readme_min_lines, 50);
    assert_eq!(config.rating.max_stale_branches, 2);
    assert_eq!(config.rating.old_pull_request_days, 14);
    assert_eq!(config.rating.max_old_pull_requests, 4);
    assert_eq!(config.cache.expiry(), Duration::from_secs(600));
    assert_eq!(config.server.url, "http://127.0.0.1:8080/api/");
}

#[test]
fn load_config_rejects_invalid_fixture() {
    let result = ReporterConfig::load(&fixtures_root().join("invalid.toml"));

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}
