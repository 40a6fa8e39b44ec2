//! Order source collaborator.
//!
//! The poller only needs "fetch the current batch"; the trait keeps it
//! object-safe so tests can script the source without a network.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use rfq_core::OrderBook;
use tracing::{debug, warn};

use crate::error::{PollError, PollResult};

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default timeout for order source requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error bodies are truncated to this many characters in `FetchFailure`.
const MAX_ERROR_BODY: usize = 256;

/// Supplier of signed order batches.
pub trait OrderSource: Send + Sync {
    /// Fetch the current order batch and market snapshot.
    fn fetch(&self) -> BoxFuture<'_, PollResult<OrderBook>>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "order-source"
    }
}

/// HTTP order source: `GET <url>` returning `{ data: { orders, market_data } }`.
pub struct HttpOrderSource {
    client: Client,
    url: String,
    bearer_token: Option<String>,
}

impl HttpOrderSource {
    /// Create a source with the default request timeout.
    pub fn new(url: impl Into<String>) -> PollResult<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> PollResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PollError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            bearer_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_book(&self) -> PollResult<OrderBook> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PollError::FetchFailure(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(url = %self.url, %status, "Order source returned error status");
            return Err(PollError::FetchFailure(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PollError::FetchFailure(format!("failed to read body: {e}")))?;

        let book = OrderBook::from_json(&body)
            .map_err(|e| PollError::FetchFailure(format!("malformed response: {e}")))?;

        debug!(
            url = %self.url,
            orders = book.orders.len(),
            malformed = book.malformed,
            "Fetched order batch"
        );
        Ok(book)
    }
}

impl std::fmt::Debug for HttpOrderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOrderSource")
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OrderSource for HttpOrderSource {
    fn fetch(&self) -> BoxFuture<'_, PollResult<OrderBook>> {
        Box::pin(self.fetch_book())
    }

    fn name(&self) -> &str {
        "http"
    }
}
