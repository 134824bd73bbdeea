//! Change notifications.
//!
//! Defines the `Notifier` trait and provides implementations for:
//! - Desktop (one backend per OS, picked once at startup)
//! - Telegram bot messages

pub mod desktop;
pub mod telegram;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{MonitorError, PriceReading};

/// A detected price change, ready to be announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAlert {
    pub title: String,
    pub previous: Option<PriceReading>,
    pub current: PriceReading,
}

impl PriceAlert {
    pub fn new(title: impl Into<String>, previous: Option<PriceReading>, current: PriceReading) -> Self {
        Self {
            title: title.into(),
            previous,
            current,
        }
    }

    /// Body line shared by every channel.
    pub fn message(&self) -> String {
        format!("The new price is: {}€", self.current)
    }

    /// Signed difference from the previous price, when both parse.
    pub fn delta(&self) -> Option<Decimal> {
        let prev = self.previous.as_ref()?.as_decimal()?;
        let cur = self.current.as_decimal()?;
        Some(cur - prev)
    }

    /// Markdown text for chat messages.
    pub fn markdown(&self) -> String {
        let mut text = format!(
            "📢 *{}*\n\nThe new price is: *{}€*",
            self.title, self.current
        );
        if let (Some(prev), Some(delta)) = (&self.previous, self.delta()) {
            let sign = if delta > Decimal::ZERO { "+" } else { "" };
            text.push_str(&format!("\nPrevious: {prev}€ ({sign}{delta}€)"));
        }
        text
    }
}

/// A best-effort notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the alert. Errors are reported by the caller, never retried.
    async fn notify(&self, alert: &PriceAlert) -> Result<(), MonitorError>;

    /// Channel name for logging.
    fn channel(&self) -> &'static str;
}
