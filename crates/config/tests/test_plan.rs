//! Loader tests for `genie-config`: built-in defaults, where `genie.toml`
//! is looked for, `GENIE__*` overrides and rejected input.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use genie_config::{load, ApiConfig, AppConfig, AuthConfig, AuthMode, StorageConfig};

const ENV_VARS_TO_RESET: &[&str] = &[
    "GENIE_CONFIG",
    "GENIE__API__BASE_URL",
    "GENIE__AUTH__DEMO_EMAIL",
    "GENIE__AUTH__DEMO_PASSWORD",
    "GENIE__AUTH__MODE",
    "GENIE__AUTH__SIMULATED_LATENCY_MS",
    "GENIE__STORAGE__PATH",
];

/// Isolates a test from the caller's `GENIE*` variables and working
/// directory, putting both back on drop.
struct ScopedEnv {
    saved_vars: Vec<(String, Option<String>)>,
    saved_dir: PathBuf,
}

impl ScopedEnv {
    fn isolated_in(dir: &Path) -> Self {
        let saved_dir = std::env::current_dir().expect("failed to capture current directory");
        let mut env = Self {
            saved_vars: Vec::new(),
            saved_dir,
        };
        for key in ENV_VARS_TO_RESET {
            env.put(key, None);
        }
        std::env::set_current_dir(dir).expect("failed to enter test directory");
        env
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        self.put(key, Some(value.as_ref()));
    }

    fn put(&mut self, key: &str, value: Option<&str>) {
        self.saved_vars.push((key.to_string(), std::env::var(key).ok()));
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.saved_dir);
        for (key, value) in self.saved_vars.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let _env = ScopedEnv::isolated_in(temp_dir.path());

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.api.base_url, defaults.api.base_url);
    assert_eq!(config.storage.path, defaults.storage.path);
    assert_eq!(config.auth.mode, AuthMode::Local);
    assert_eq!(
        config.auth.simulated_latency_ms,
        defaults.auth.simulated_latency_ms
    );
    assert_eq!(config.auth.demo_email, defaults.auth.demo_email);
    assert_eq!(config.auth.demo_password, defaults.auth.demo_password);
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let _env = ScopedEnv::isolated_in(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "genie.toml",
        r#"
        [auth]
        simulated_latency_ms = 25
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/genie.toml",
        r#"
        [auth]
        simulated_latency_ms = 75
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.auth.simulated_latency_ms, 25);
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let _env = ScopedEnv::isolated_in(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "config/genie.toml",
        r#"
        [auth]
        mode = "cloud"

        [storage]
        path = "state/browser.json"
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(config.auth.mode, AuthMode::Cloud);
    assert_eq!(config.storage.path, PathBuf::from("state/browser.json"));
    assert_eq!(config.auth.demo_email, defaults.auth.demo_email);
    assert_eq!(config.api.base_url, defaults.api.base_url);
}

#[test]
#[serial]
fn load_reads_explicit_file_from_environment() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut env = ScopedEnv::isolated_in(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "elsewhere/custom.toml",
        r#"
        [api]
        base_url = "https://api.example.com"
        "#,
    );
    env.set_var(
        "GENIE_CONFIG",
        temp_dir.path().join("elsewhere/custom.toml").to_string_lossy(),
    );

    let config = load().expect("configuration load should read GENIE_CONFIG");
    assert_eq!(config.api.base_url, "https://api.example.com");
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut env = ScopedEnv::isolated_in(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "genie.toml",
        r#"
        [auth]
        simulated_latency_ms = 300
        "#,
    );

    env.set_var("GENIE__AUTH__SIMULATED_LATENCY_MS", "0");
    env.set_var("GENIE__AUTH__DEMO_EMAIL", "someone@local.test");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.auth.simulated_latency_ms, 0);
    assert_eq!(config.auth.demo_email, "someone@local.test");
}

#[test]
#[serial]
fn load_errors_on_unknown_auth_mode() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut env = ScopedEnv::isolated_in(temp_dir.path());

    env.set_var("GENIE__AUTH__MODE", "hybrid");

    let error = load().expect_err("unknown auth mode should fail");
    assert!(
        error.to_string().contains("invalid configuration"),
        "unexpected error message: {error}"
    );
}

#[test]
#[serial]
fn load_errors_on_invalid_toml_contents() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let _env = ScopedEnv::isolated_in(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "genie.toml",
        r#"
        [auth]
        simulated_latency_ms = "not-a-number
        "#,
    );

    let error = load().expect_err("invalid TOML should cause load to fail");
    let message = error.to_string();
    assert!(
        message.contains("invalid configuration") || message.contains("unable to build configuration"),
        "unexpected error message: {message}"
    );
}

#[test]
fn auth_config_defaults_to_local_mode() {
    let defaults = AuthConfig::default();
    assert_eq!(defaults.mode, AuthMode::Local);
    assert_eq!(defaults.demo_password, "google-pass");
}

#[test]
fn storage_and_api_defaults_point_at_local_development() {
    assert_eq!(
        StorageConfig::default().path,
        PathBuf::from("genie_local_storage.json")
    );
    assert_eq!(ApiConfig::default().base_url, "http://127.0.0.1:8080");
}
