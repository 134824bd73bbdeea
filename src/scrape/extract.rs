//! Price extraction from product page markup.
//!
//! Finds the outer price-list element, then the highlighted price span
//! inside it, and normalizes the span text into a [`PriceReading`].

use scraper::{Html, Selector};
use tracing::debug;

use crate::config::SelectorConfig;
use crate::types::{MonitorError, PriceReading};

/// Compiled selector pair for the two-level price lookup.
#[derive(Debug, Clone)]
pub struct PriceExtractor {
    container: Selector,
    price: Selector,
}

impl PriceExtractor {
    pub fn new(cfg: &SelectorConfig) -> Result<Self, MonitorError> {
        Ok(Self {
            container: parse_selector(&cfg.container)?,
            price: parse_selector(&cfg.price)?,
        })
    }

    /// Scan `html` for the price. Returns `Err(Markup)` when either element
    /// is missing or the span holds no amount.
    pub fn extract(&self, html: &str) -> Result<PriceReading, MonitorError> {
        let document = Html::parse_document(html);

        let container = document
            .select(&self.container)
            .next()
            .ok_or_else(|| MonitorError::Markup("price list container".into()))?;

        let span = container
            .select(&self.price)
            .next()
            .ok_or_else(|| MonitorError::Markup("highlighted price span".into()))?;

        let raw: String = span.text().collect();
        debug!(raw = %raw.trim(), "Price text found");

        normalize_price(&raw).ok_or_else(|| MonitorError::Markup("empty price text".into()))
    }
}

fn parse_selector(css: &str) -> Result<Selector, MonitorError> {
    Selector::parse(css).map_err(|e| MonitorError::Config(format!("invalid selector {css:?}: {e}")))
}

/// Strip the currency symbol/suffix and whitespace; append `.00` when the
/// text carries no comma decimal separator.
pub fn normalize_price(raw: &str) -> Option<PriceReading> {
    let mut text = raw.trim().replace('€', "").replace(" EUR", "");
    text = text.trim().to_string();
    if text.is_empty() {
        return None;
    }
    if !text.contains(',') {
        text.push_str(".00");
    }
    Some(PriceReading::new(text))
}
