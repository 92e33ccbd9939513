//! YAML configuration file.
//!
//! Settings are read from `--config` when given, otherwise from
//! `<config_dir>/headline_browser/config.yaml`. A missing default file is not
//! an error; every field has a default. Command-line flags override whatever
//! is loaded here (see [`AppConfig::apply_cli`]).
//!
//! ```yaml
//! api_token: "your-gnews-token"
//! base_url: "https://gnews.io/api/v4"
//! page_size: 9
//! debounce_ms: 500
//! request_timeout_secs: 15
//! stale_results: discard   # or last_write_wins
//! ```

use crate::api::DEFAULT_BASE_URL;
use crate::cli::Cli;
use crate::controller::{DEFAULT_PAGE_SIZE, StalePolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "headline_browser";

/// Search input must be idle this long before a search fires.
pub const MIN_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub stale_results: StalePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: MIN_DEBOUNCE_MS,
            request_timeout_secs: 15,
            stale_results: StalePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay command-line values onto the loaded file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(token) = &cli.api_key {
            self.api_token = Some(token.clone());
        }
        if let Some(page_size) = cli.page_size {
            self.page_size = page_size;
        }
        if let Some(policy) = cli.stale_results {
            self.stale_results = policy;
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.page_size == 0 {
            return Err("page_size must be at least 1".into());
        }
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".into());
        }
        Ok(())
    }

    /// The API token, or an error explaining how to provide one.
    pub fn require_token(&self) -> Result<&str, Box<dyn Error>> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                "no API token configured (use --api-key, GNEWS_API_KEY, or api_token in config.yaml)"
                    .into()
            })
    }

    /// Quiet period for search input, never shorter than [`MIN_DEBOUNCE_MS`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(MIN_DEBOUNCE_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Default location of the configuration file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

/// Load configuration from `explicit` or the default location.
///
/// # Errors
///
/// An explicitly given file that cannot be read is an error; a missing
/// default file is not. Invalid YAML or values are always errors.
#[instrument(level = "info")]
pub async fn load_config(explicit: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    let path = match explicit {
        Some(p) => PathBuf::from(p),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("No config file found; using defaults");
                return Ok(AppConfig::default());
            }
        },
    };
    read_config(&path).await
}

async fn read_config(path: &Path) -> Result<AppConfig, Box<dyn Error>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
    let config = AppConfig::from_yaml(&raw)
        .map_err(|e| format!("invalid config {}: {e}", path.display()))?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
