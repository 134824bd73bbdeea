//! Product page retrieval.
//!
//! Defines the `PageSource` trait and the reqwest-backed implementation
//! that fetches the product page with browser-like headers.

pub mod extract;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::config::ProductConfig;
use crate::types::MonitorError;

pub use extract::{normalize_price, PriceExtractor};

/// Abstraction over where the product page markup comes from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page body. Any status other than 200 is an error.
    async fn fetch_page(&self) -> Result<String, MonitorError>;

    /// Page location for logging.
    fn url(&self) -> &str;
}

/// Fetches the product page over HTTP.
pub struct HttpPageSource {
    http: Client,
    url: String,
    headers: HeaderMap,
}

impl HttpPageSource {
    pub fn new(product: &ProductConfig, timeout: Duration) -> Result<Self, MonitorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&product.user_agent)?);
        headers.insert(REFERER, header_value(&product.referer)?);

        Ok(Self {
            http,
            url: product.url.clone(),
            headers,
        })
    }
}

fn header_value(v: &str) -> Result<HeaderValue, MonitorError> {
    HeaderValue::from_str(v).map_err(|e| MonitorError::Config(format!("invalid header value {v:?}: {e}")))
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self) -> Result<String, MonitorError> {
        let resp = self
            .http
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| MonitorError::Fetch {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(MonitorError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(|e| MonitorError::Fetch {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        debug!(bytes = body.len(), "Product page fetched");
        Ok(body)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
