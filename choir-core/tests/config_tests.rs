//! Config error-message and persistence integration tests.
//! Layout: ~/.choir/config.yaml

use assert_fs::prelude::*;
use choir_core::{
    config::{self, ChoirConfig},
    AccountId, ConfigError,
};
use predicates::prelude::predicate;

fn sample() -> ChoirConfig {
    ChoirConfig::new("https://choir.example.org/api", "demo", AccountId::from("p-01"))
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
    assert!(err.to_string().contains("choir config init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".choir/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_rejects_invalid_values() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".choir/config.yaml")
        .write_str("server_url: choir.example.org\nsite_id: demo\naccount_id: p-01\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    assert!(err.to_string().contains("server_url"));
}

// ---------------------------------------------------------------------------
// 2. Save / load
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_roundtrip() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut cfg = sample();
    cfg.token_env = "STUDY_TOKEN".into();
    cfg.refresh_wait_ms = 250;

    config::save_at(home.path(), &cfg).expect("save");
    let loaded = config::load_at(home.path()).expect("load");
    assert_eq!(loaded, cfg);
}

#[test]
fn saved_file_is_human_readable_yaml() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    home.child(".choir/config.yaml")
        .assert(predicate::str::contains("site_id: demo"));
    home.child(".choir/config.yaml")
        .assert(predicate::str::contains("account_id: p-01"));
    home.child(".choir/config.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn save_refuses_invalid_config() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut cfg = sample();
    cfg.site_id = "  ".into();

    let err = config::save_at(home.path(), &cfg).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    home.child(".choir/config.yaml")
        .assert(predicate::path::missing());
}
