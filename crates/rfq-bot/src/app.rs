//! Main application logic.

use std::path::Path;
use std::sync::Arc;

use rfq_core::{Address, OrderBook, SubmissionPayload};
use rfq_poller::{
    HttpOrderSource, OrderPoller, OrderSource, PollState, PollerConfig, PollerHandle,
};
use rfq_risk::{get_recommendation, PsychologyProfile, TradeRecommendation};
use rfq_selector::{FeedRegistry, OrderQuery, OrderSelector, SelectionResult};
use rfq_telemetry::Metrics;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::report::{record_selection, SelectionSummary};

/// Recommendation for a completed questionnaire.
pub fn recommend(profile: &PsychologyProfile) -> AppResult<TradeRecommendation> {
    let recommendation = get_recommendation(profile)?;
    info!(
        score = recommendation.score,
        profile_type = %recommendation.profile_type,
        duration = %recommendation.duration,
        "Recommendation computed"
    );
    Ok(recommendation)
}

/// Main application.
pub struct Application {
    config: AppConfig,
    selector: OrderSelector,
    referrer: Option<Address>,
}

impl Application {
    /// Validate configuration and build the selector.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let feeds = FeedRegistry::from_config(&config.feeds)?;
        let referrer = config.referrer()?;

        info!(
            feeds = feeds.len(),
            query = %config.query.to_query(),
            referrer = ?referrer,
            "Application initialized"
        );

        Ok(Self {
            config,
            selector: OrderSelector::new(feeds),
            referrer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Query from configuration.
    #[must_use]
    pub fn query(&self) -> OrderQuery {
        self.config.query.to_query()
    }

    /// Submission payload for the best order, when a referrer is configured.
    #[must_use]
    pub fn submission(&self, result: &SelectionResult) -> Option<SubmissionPayload> {
        self.referrer.and_then(|referrer| result.submission(referrer))
    }

    /// HTTP order source from configuration.
    pub fn http_source(&self) -> AppResult<HttpOrderSource> {
        let source = HttpOrderSource::with_timeout(
            self.config.order_source.url.clone(),
            self.config.request_timeout(),
        )?
        .with_bearer_token(self.config.api_token());
        Ok(source)
    }

    /// Start polling `source` for `query`.
    #[must_use]
    pub fn spawn_poller(&self, source: Arc<dyn OrderSource>, query: OrderQuery) -> PollerHandle {
        let config = PollerConfig::new(query).with_interval(self.config.poll_interval());
        OrderPoller::new(source, self.selector.clone(), config).spawn()
    }

    /// Offline selection over a saved order source response body.
    pub fn select_from_str(
        &self,
        body: &str,
        query: &OrderQuery,
        now: u64,
    ) -> AppResult<SelectionResult> {
        let book = OrderBook::from_json(body)?;
        if book.malformed > 0 {
            warn!(malformed = book.malformed, "Skipped undecodable orders");
        }
        Metrics::batch_received(book.orders.len() + book.malformed, book.malformed);

        let result = self.selector.select_from_book(&book, query, now);
        record_selection(&result);
        Ok(result)
    }

    /// Offline selection over a saved response file.
    pub fn select_file(
        &self,
        path: &Path,
        query: &OrderQuery,
        now: u64,
    ) -> AppResult<SelectionResult> {
        let body = std::fs::read_to_string(path)?;
        info!(path = %path.display(), bytes = body.len(), "Loaded saved order response");
        self.select_from_str(&body, query, now)
    }

    /// Poll the configured order source until Ctrl-C.
    pub async fn run(&self) -> AppResult<()> {
        let source: Arc<dyn OrderSource> = Arc::new(self.http_source()?);
        let query = self.query();

        info!(
            url = %self.config.order_source.url,
            %query,
            interval_ms = self.config.poller.interval_ms,
            "Watching order source"
        );

        let handle = self.spawn_poller(source, query);
        let mut rx = handle.subscribe();

        let result = self.watch(&handle, &mut rx).await;

        handle.shutdown().await;
        self.export_metrics()?;
        result
    }

    async fn watch(
        &self,
        handle: &PollerHandle,
        rx: &mut watch::Receiver<PollState>,
    ) -> AppResult<()> {
        let mut last_sequence = 0u64;
        let mut stale_reported = false;
        let mut age_interval = tokio::time::interval(self.config.poll_interval());

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        warn!("Order poller stopped unexpectedly");
                        return Ok(());
                    }
                    let state = rx.borrow_and_update().clone();
                    if state.sequence != last_sequence {
                        last_sequence = state.sequence;
                        self.on_poll(&state);
                    }
                }

                _ = age_interval.tick() => {
                    if let Some(age) = handle.age() {
                        Metrics::result_age(age.num_milliseconds() as f64 / 1_000.0);
                    }
                    let stale = handle.is_stale(self.config.stale_after());
                    if stale && !stale_reported && last_sequence > 0 {
                        warn!(
                            stale_after_ms = self.config.poller.stale_after_ms,
                            "Published result is stale"
                        );
                    }
                    stale_reported = stale;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    return Ok(());
                }
            }
        }
    }

    fn on_poll(&self, state: &PollState) {
        let latency_ms = state
            .last_latency
            .map(|l| l.as_secs_f64() * 1_000.0)
            .unwrap_or_default();

        if let Some(error) = &state.last_error {
            Metrics::poll_failed(latency_ms);
            warn!(
                sequence = state.sequence,
                error = %error,
                has_result = state.result.is_some(),
                "Order source poll failed"
            );
            return;
        }

        Metrics::poll_succeeded(latency_ms);
        Metrics::batch_received(state.orders_received, state.orders_malformed);

        let Some(result) = state.result.as_deref() else {
            return;
        };
        record_selection(result);

        match result.best() {
            Some(best) => info!(
                sequence = state.sequence,
                query = %result.query,
                maker = %best.maker(),
                premium_per_contract = %best.premium_per_contract.normalize(),
                contracts = %best.contracts.normalize(),
                fill_window_secs = best.fill_window_secs(result.evaluated_at),
                eligible = result.stats.eligible,
                "Best order"
            ),
            None => info!(
                sequence = state.sequence,
                query = %result.query,
                total = result.stats.total,
                "No eligible order"
            ),
        }

        if let Some(payload) = self.submission(result) {
            match serde_json::to_string(&payload) {
                Ok(json) => debug!(payload = %json, "Submission payload ready"),
                Err(e) => warn!(error = %e, "Failed to serialize submission payload"),
            }
        }
    }

    fn export_metrics(&self) -> AppResult<()> {
        let Some(path) = &self.config.telemetry.metrics_path else {
            return Ok(());
        };
        std::fs::write(path, Metrics::gather_text()?)?;
        info!(path = %path, "Metrics exported");
        Ok(())
    }

    /// Printable summary of a selection pass.
    #[must_use]
    pub fn summarize(result: &SelectionResult) -> SelectionSummary {
        SelectionSummary::from(result)
    }
}
