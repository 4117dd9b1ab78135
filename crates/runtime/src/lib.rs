use std::sync::Arc;

use anyhow::{bail, Context, Result};
use genie_auth::{IdentityProvider, LocalIdentity};
use genie_config::{AppConfig, AuthMode};
use genie_storage::{FileStore, KeyValueStore};
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct ClientServices {
    pub storage: Arc<dyn KeyValueStore>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Where signed-in requests are sent, without a trailing slash.
    pub api_base_url: String,
}

impl ClientServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let path = &config.storage.path;
        let storage: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(path)
                .await
                .with_context(|| format!("failed to open local storage {}", path.display()))?,
        );

        let identity = connect_identity(config, Arc::clone(&storage))?;
        let api_base_url = config.api.base_url.trim_end_matches('/').to_owned();
        info!(mode = identity.mode(), api = %api_base_url, "identity provider ready");

        Ok(Self {
            storage,
            identity,
            api_base_url,
        })
    }
}

/// Picks the identity provider for the configured mode.
pub fn connect_identity(
    config: &AppConfig,
    storage: Arc<dyn KeyValueStore>,
) -> Result<Arc<dyn IdentityProvider>> {
    match config.auth.mode {
        AuthMode::Local => {
            info!(
                latency_ms = config.auth.simulated_latency_ms,
                "running in local identity mode"
            );
            Ok(Arc::new(LocalIdentity::from_config(storage, &config.auth)))
        }
        // The hosted provider is reached through its own client SDK.
        AuthMode::Cloud => bail!("cloud identity mode is not available in this client build"),
    }
}
