//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` (if present) and deserializes into strongly-typed
//! structs. Every field has a default, so the monitor runs with no config
//! file at all. Secrets (Telegram bot token, chat id) are referenced by
//! env-var name in the config and resolved at startup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::journal::DEFAULT_LOG_FILE;
use crate::types::MonitorError;

const DEFAULT_PRODUCT_URL: &str =
    "https://eu.store.bambulab.com/it-it/products/x1-carbon?variant=53735784939868";
const DEFAULT_REFERER: &str = "https://eu.store.bambulab.com/it-it/products/x1-carbon";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub product: ProductConfig,
    pub monitor: MonitorConfig,
    pub selectors: SelectorConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProductConfig {
    /// Human-readable name used in notification titles.
    pub name: String,
    pub url: String,
    pub referer: String,
    pub user_agent: String,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            name: "Bambulab".to_string(),
            url: DEFAULT_PRODUCT_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub log_file: String,
    /// Enables debug output and the countdown. `--debug` also turns it on.
    pub debug: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1800,
            request_timeout_secs: 30,
            log_file: DEFAULT_LOG_FILE.to_string(),
            debug: false,
        }
    }
}

/// CSS selectors locating the price on the product page.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelectorConfig {
    /// Outer price-list container.
    pub container: String,
    /// Highlighted price span inside the container.
    pub price: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: "div.ProductMeta__PriceList.Heading".to_string(),
            price: "span.ProductMeta__Price.Price.Price--highlight.Text--subdued.u-h4"
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    pub desktop_enabled: bool,
    pub telegram_enabled: bool,
    pub telegram_api_base: String,
    pub telegram_bot_token_env: String,
    pub telegram_chat_id_env: String,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            desktop_enabled: true,
            telegram_enabled: true,
            telegram_api_base: "https://api.telegram.org".to_string(),
            telegram_bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            telegram_chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists. `Ok(None)` means the caller should fall
    /// back to built-in defaults.
    pub fn load_optional(path: &str) -> Result<Option<Self>> {
        if Path::new(path).exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.monitor.interval_secs == 0 {
            return Err(MonitorError::Config(
                "monitor.interval_secs must be greater than zero".into(),
            ));
        }
        if self.product.url.trim().is_empty() {
            return Err(MonitorError::Config("product.url must not be empty".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.monitor.request_timeout_secs)
    }

    /// Title shown on desktop and chat notifications.
    pub fn notification_title(&self) -> String {
        format!("{} Price Monitor", self.product.name)
    }

    /// Resolve an environment variable name to its value.
    /// Unset and empty variables both count as missing.
    pub fn resolve_env(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }
}
