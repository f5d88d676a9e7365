//! Tests for configuration loading

use review_harvester::config::Config;
use serial_test::serial;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    "HARVEST_MAX_RPS",
    "HARVEST_PAGE_DELAY_MIN",
    "HARVEST_PAGE_DELAY_MAX",
    "HARVEST_TARGET_LANGUAGE",
    "HARVEST_CHECKPOINT_EVERY",
    "HARVEST_OUTPUT_DIR",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_bundled_config_matches_defaults() {
    clear_env();
    let config = Config::load(Some(Path::new("config.toml"))).expect("config.toml should load");
    let defaults = Config::default();

    assert_eq!(config.http.max_requests_per_second, defaults.http.max_requests_per_second);
    assert_eq!(config.harvest.checkpoint_every, defaults.harvest.checkpoint_every);
    assert_eq!(config.api.endpoint_template, defaults.api.endpoint_template);
    assert_eq!(config.html.review_item, defaults.html.review_item);
    assert_eq!(config.language.target, "en");
}

#[test]
#[serial]
fn test_partial_file_keeps_defaults() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[harvest]\nmax_consecutive_errors = 5\n\n[language]\ntarget = \"fr\"").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.harvest.max_consecutive_errors, 5);
    assert_eq!(config.harvest.checkpoint_every, 100_000);
    assert_eq!(config.language.target, "fr");
    assert_eq!(config.delays.entity_min_secs, 30.0);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[http]\nmax_requests_per_second = 4").unwrap();

    std::env::set_var("HARVEST_MAX_RPS", "9");
    std::env::set_var("HARVEST_TARGET_LANGUAGE", "de");
    std::env::set_var("HARVEST_OUTPUT_DIR", "/tmp/harvest-out");

    let config = Config::load(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(config.http.max_requests_per_second, 9);
    assert_eq!(config.language.target, "de");
    assert_eq!(config.output.dir, Path::new("/tmp/harvest-out"));
}

#[test]
#[serial]
fn test_env_invalid_delay_window_rejected() {
    clear_env();
    std::env::set_var("HARVEST_PAGE_DELAY_MIN", "12");
    std::env::set_var("HARVEST_PAGE_DELAY_MAX", "3");

    let result = Config::load(None);
    clear_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_unparseable_env_value_ignored() {
    clear_env();
    std::env::set_var("HARVEST_CHECKPOINT_EVERY", "lots");
    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.harvest.checkpoint_every, 100_000);
}

#[test]
#[serial]
fn test_malformed_file_is_error() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[http\nmax_requests_per_second = ").unwrap();
    assert!(Config::load(Some(file.path())).is_err());
}
