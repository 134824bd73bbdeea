//! Telegram bot notifications.
//!
//! API: `POST {api_base}/bot{token}/sendMessage`
//! Auth: bot token in the URL path.
//! Body: form fields `chat_id`, `text`, `parse_mode=Markdown`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Notifier, PriceAlert};
use crate::config::{AlertsConfig, AppConfig};
use crate::types::MonitorError;

const CHANNEL: &str = "telegram";

/// Error envelope Telegram returns alongside non-200 statuses.
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    http: Client,
    api_base: String,
    token: SecretString,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_base: impl Into<String>,
        token: SecretString,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build Telegram HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
            chat_id: chat_id.into(),
        })
    }

    /// Build from config, resolving the token and chat id from the
    /// environment. Returns `Ok(None)` when credentials are missing.
    pub fn from_config(alerts: &AlertsConfig, timeout: Duration) -> Result<Option<Self>, MonitorError> {
        let token = AppConfig::resolve_env(&alerts.telegram_bot_token_env);
        let chat_id = AppConfig::resolve_env(&alerts.telegram_chat_id_env);

        match (token, chat_id) {
            (Some(token), Some(chat_id)) => Ok(Some(Self::new(
                alerts.telegram_api_base.clone(),
                SecretString::new(token),
                chat_id,
                timeout,
            )?)),
            _ => {
                warn!(
                    token_env = %alerts.telegram_bot_token_env,
                    chat_id_env = %alerts.telegram_chat_id_env,
                    "Telegram credentials not set, Telegram alerts disabled"
                );
                Ok(None)
            }
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token.expose_secret())
    }

    fn error(message: impl Into<String>) -> MonitorError {
        MonitorError::Notify {
            channel: CHANNEL.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), MonitorError> {
        let text = alert.markdown();
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "Markdown"),
        ];

        // reqwest errors embed the URL, which carries the token.
        let resp = self
            .http
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| Self::error(format!("request failed: {}", e.without_url())))?;

        let status = resp.status();
        if status == StatusCode::OK {
            debug!("Telegram notification sent");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<TelegramResponse>(&body)
            .ok()
            .and_then(|r| r.description)
            .unwrap_or(body);
        Err(Self::error(format!("status {status}: {detail}")))
    }

    fn channel(&self) -> &'static str {
        CHANNEL
    }
}
