use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://hydra.nixos.org";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hydra-client/config.toml";
pub const CONFIG_PATH_ENV: &str = "HYDRA_CLIENT_CONFIG";
pub const ENV_PREFIX: &str = "HYDRA_CLIENT";

/// Settings for a [`HydraClient`](crate::HydraClient).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the Hydra instance, without trailing slash.
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout enforced by the HTTP client; zero disables it.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// When both are set the CLI logs in before running a command.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout: Duration::from_secs(30),
            username: None,
            password: None,
        }
    }
}

pub fn default_user_agent() -> String {
    format!("hydra-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Reads the file named by `HYDRA_CLIENT_CONFIG` (or the default path),
    /// then applies `HYDRA_CLIENT__*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        debug!("{} => {}", CONFIG_PATH_ENV, config_path);
        Self::load_from(&config_path)
    }

    /// Like [`load`](Self::load) with an explicit file. A missing file is not
    /// an error.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("loading configuration")?;

        settings
            .try_deserialize::<Self>()
            .context("parsing configuration")
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Username and password, when both are configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

pub fn debug_print_config(cfg: &ClientConfig) {
    debug!("Loaded Configuration:");
    debug!("  base_url = {}", cfg.base_url);
    debug!("  user_agent = {}", cfg.user_agent);
    debug!("  timeout = {:?}", cfg.timeout);
    if let Some(username) = &cfg.username {
        debug!("  username = {}", username);
    }
    if let Some(password) = &cfg.password {
        debug!("  password = {}", "*".repeat(password.chars().count()));
    }
}
