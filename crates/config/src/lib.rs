use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "genie.toml",
    "config/genie.toml",
    "crates/config/genie.toml",
    "../genie.toml",
    "../config/genie.toml",
    "../crates/config/genie.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// Location of the remote API the client talks to once a user is signed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("genie_local_storage.json"),
        }
    }
}

/// Which identity backend the client is wired against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Local,
    Cloud,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Local => "local",
            AuthMode::Cloud => "cloud",
        }
    }
}

/// Authentication settings.
///
/// ```
/// use genie_config::{AuthConfig, AuthMode};
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.mode, AuthMode::Local);
/// assert_eq!(auth.simulated_latency_ms, 500);
/// assert_eq!(auth.demo_email, "demo_google@local.com");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default = "AuthConfig::default_latency")]
    pub simulated_latency_ms: u64,
    #[serde(default = "AuthConfig::default_demo_email")]
    pub demo_email: String,
    #[serde(default = "AuthConfig::default_demo_password")]
    pub demo_password: String,
}

impl AuthConfig {
    const fn default_latency() -> u64 {
        500
    }

    fn default_demo_email() -> String {
        "demo_google@local.com".to_string()
    }

    fn default_demo_password() -> String {
        "google-pass".to_string()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            simulated_latency_ms: Self::default_latency(),
            demo_email: Self::default_demo_email(),
            demo_password: Self::default_demo_password(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use genie_config::load;
///
/// std::env::remove_var("GENIE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.api.base_url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let latency = i64::try_from(defaults.auth.simulated_latency_ms).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("api.base_url", defaults.api.base_url.clone())?
        .set_default(
            "storage.path",
            defaults.storage.path.to_string_lossy().into_owned(),
        )?
        .set_default("auth.mode", defaults.auth.mode.as_str())?
        .set_default("auth.simulated_latency_ms", latency)?
        .set_default("auth.demo_email", defaults.auth.demo_email.clone())?
        .set_default("auth.demo_password", defaults.auth.demo_password.clone())?;

    let environment_overrides = config::Environment::with_prefix("GENIE").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("GENIE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via GENIE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded client configuration");
    Ok(config)
}
