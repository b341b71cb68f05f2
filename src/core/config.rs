use crate::core::cache::DEFAULT_TTL_MS;
use crate::core::quote::{Currency, MetalType};
use crate::core::source::FailurePolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_METAL_BASE_URL: &str = "https://api.gold-api.com";
pub const DEFAULT_EXCHANGE_BASE_URL: &str = "https://hexarate.paikama.co";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub metal: Option<ProviderConfig>,
    pub exchange: Option<ProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            metal: Some(ProviderConfig {
                base_url: DEFAULT_METAL_BASE_URL.to_string(),
            }),
            exchange: Some(ProviderConfig {
                base_url: DEFAULT_EXCHANGE_BASE_URL.to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn metal_base_url(&self) -> &str {
        self.metal
            .as_ref()
            .map_or(DEFAULT_METAL_BASE_URL, |p| &p.base_url)
    }

    pub fn exchange_base_url(&self) -> &str {
        self.exchange
            .as_ref()
            .map_or(DEFAULT_EXCHANGE_BASE_URL, |p| &p.base_url)
    }
}

fn default_cache_ttl_secs() -> u64 {
    (DEFAULT_TTL_MS / 1000) as u64
}

fn default_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    300
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub metal: MetalType,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub on_fetch_failure: FailurePolicy,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            metal: MetalType::default(),
            currency: Currency::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            on_fetch_failure: FailurePolicy::default(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults when
    /// no file exists there yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "mithqal", "mithqal")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
