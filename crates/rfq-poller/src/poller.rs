//! Fixed-interval order polling.
//!
//! One task per poller drives `IDLE -> FETCHING -> IDLE` on a fixed interval.
//! The fetch is awaited inline, so at most one fetch is ever in flight; ticks
//! that elapse during a fetch are skipped rather than queued.
//!
//! State is published through a `watch` channel: the task is the single
//! writer, readers always observe a complete `PollState`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rfq_core::OrderBook;
use rfq_selector::{OrderQuery, OrderSelector, SelectionResult};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::PollError;
use crate::source::OrderSource;

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Poller configuration.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub query: OrderQuery,
}

impl PollerConfig {
    #[must_use]
    pub fn new(query: OrderQuery) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            query,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poller state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Fetching,
}

/// Published poller state.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub phase: PollPhase,
    /// Latest successful selection; kept across failures.
    pub result: Option<Arc<SelectionResult>>,
    /// Error of the latest completed fetch, cleared on success.
    pub last_error: Option<String>,
    /// Completion time of the latest successful fetch.
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Duration of the latest completed fetch.
    pub last_latency: Option<Duration>,
    /// Orders in the latest successful batch.
    pub orders_received: usize,
    /// Orders in the latest successful batch that failed to decode.
    pub orders_malformed: usize,
    /// Sequence number of the latest completed fetch (0 before any).
    pub sequence: u64,
}

impl PollState {
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.phase == PollPhase::Fetching
    }

    /// Time since the last successful fetch.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_updated_at.map(|at| now - at)
    }

    /// Apply a completed fetch unless a newer one was already published.
    ///
    /// Returns whether the state changed.
    fn complete(&mut self, sequence: u64, outcome: Completion) -> bool {
        if sequence <= self.sequence {
            return false;
        }
        self.sequence = sequence;
        self.phase = PollPhase::Idle;
        self.last_latency = Some(outcome.latency);

        match outcome.result {
            Ok((result, received, malformed)) => {
                self.result = Some(Arc::new(result));
                self.last_error = None;
                self.last_updated_at = Some(outcome.finished_at);
                self.orders_received = received;
                self.orders_malformed = malformed;
            }
            Err(error) => {
                self.last_error = Some(error.to_string());
            }
        }
        true
    }
}

struct Completion {
    result: Result<(SelectionResult, usize, usize), PollError>,
    latency: Duration,
    finished_at: DateTime<Utc>,
}

/// Order poller: fetches, selects and publishes.
pub struct OrderPoller {
    source: Arc<dyn OrderSource>,
    selector: OrderSelector,
    config: PollerConfig,
}

impl OrderPoller {
    #[must_use]
    pub fn new(
        source: Arc<dyn OrderSource>,
        selector: OrderSelector,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            selector,
            config,
        }
    }

    /// Start polling. The first fetch runs immediately.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let (tx, rx) = watch::channel(PollState::default());
        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn(self.run(tx, cancel.clone(), refresh.clone()));

        PollerHandle {
            rx,
            cancel,
            refresh,
            task: Some(task),
        }
    }

    async fn run(
        self,
        tx: watch::Sender<PollState>,
        cancel: CancellationToken,
        refresh: Arc<Notify>,
    ) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sequence: u64 = 0;

        info!(
            source = self.source.name(),
            query = %self.config.query,
            interval_ms = self.config.interval.as_millis() as u64,
            "Order poller started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = refresh.notified() => {
                    debug!("Manual refresh requested");
                    ticker.reset();
                }
            }

            sequence += 1;
            tx.send_modify(|state| state.phase = PollPhase::Fetching);

            let started = Instant::now();
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                fetched = self.source.fetch() => fetched,
            };
            let completion = self.complete(fetched, started.elapsed());

            match &completion.result {
                Ok((result, received, _)) => debug!(
                    sequence,
                    orders = received,
                    eligible = result.stats.eligible,
                    latency_ms = completion.latency.as_millis() as u64,
                    "Poll succeeded"
                ),
                Err(e) => warn!(
                    sequence,
                    error = %e,
                    latency_ms = completion.latency.as_millis() as u64,
                    "Poll failed, keeping previous result"
                ),
            }

            let applied = tx.send_if_modified(|state| state.complete(sequence, completion));
            if !applied {
                debug!(sequence, "Discarded stale poll completion");
                tx.send_modify(|state| state.phase = PollPhase::Idle);
            }
        }

        tx.send_modify(|state| state.phase = PollPhase::Idle);
        info!(source = self.source.name(), "Order poller stopped");
    }

    fn complete(&self, fetched: Result<OrderBook, PollError>, latency: Duration) -> Completion {
        let finished_at = Utc::now();
        let now = u64::try_from(finished_at.timestamp()).unwrap_or(0);

        let result = fetched.map(|book| {
            let selection = self.selector.select_from_book(&book, &self.config.query, now);
            let received = book.orders.len() + book.malformed;
            (selection, received, book.malformed)
        });

        Completion {
            result,
            latency,
            finished_at,
        }
    }
}

/// Handle to a running poller.
///
/// Dropping the handle cancels the task, including an in-flight fetch.
#[derive(Debug)]
pub struct PollerHandle {
    rx: watch::Receiver<PollState>,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// New receiver observing every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.rx.clone()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PollState {
        self.rx.borrow().clone()
    }

    /// Latest successful selection.
    #[must_use]
    pub fn result(&self) -> Option<Arc<SelectionResult>> {
        self.rx.borrow().result.clone()
    }

    /// Time since the last successful fetch.
    #[must_use]
    pub fn age(&self) -> Option<chrono::Duration> {
        self.rx.borrow().age_at(Utc::now())
    }

    /// True if no fetch has succeeded yet or the result is older than `max_age`.
    #[must_use]
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match (self.age(), chrono::Duration::from_std(max_age)) {
            (Some(age), Ok(max)) => age > max,
            (Some(_), Err(_)) => false,
            (None, _) => true,
        }
    }

    /// Request an immediate fetch.
    ///
    /// Runs through the same loop, so it never overlaps an outstanding fetch.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Stop polling and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Order poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BoxFuture;
    use parking_lot::Mutex;
    use rfq_core::{Asset, SignedOrder};
    use rfq_selector::{Direction, FeedConfig, FeedRegistry};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BTC_FEED: &str = "0x0000000000000000000000000000000000000b7c";
    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Clone)]
    enum Step {
        Book(&'static str),
        Fail(&'static str),
    }

    /// Scripted source; the last step repeats once the script runs out.
    struct ScriptedSource {
        steps: Mutex<VecDeque<Step>>,
        delay: Duration,
        fetches: AtomicUsize,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: AtomicUsize,
    }

    struct InFlightGuard(Arc<AtomicUsize>);

    impl Drop for InFlightGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                delay,
                fetches: AtomicUsize::new(0),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn next_step(&self) -> Step {
            let mut steps = self.steps.lock();
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                steps.front().cloned().unwrap()
            }
        }
    }

    impl OrderSource for ScriptedSource {
        fn fetch(&self) -> BoxFuture<'_, Result<OrderBook, PollError>> {
            Box::pin(async move {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                let _guard = InFlightGuard(self.in_flight.clone());

                let step = self.next_step();
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                match step {
                    Step::Book(maker) => Ok(book(maker)),
                    Step::Fail(reason) => Err(PollError::FetchFailure(reason.to_string())),
                }
            })
        }
    }

    fn book(maker: &str) -> OrderBook {
        let order = format!(
            r#"{{"order":{{"maker":"{maker}","orderExpiryTimestamp":"4000000000","collateral":"0x00000000000000000000000000000000000000c1","isCall":true,"priceFeed":"{BTC_FEED}","implementation":"0x00000000000000000000000000000000000000e1","isLong":false,"maxCollateralUsable":"1000000000","strikes":["10000000000000"],"expiry":"4100000000","price":"5000000","numContracts":"1000000","extraOptionData":"0x"}},"signature":"0xsig","nonce":"1"}}"#
        );
        let body = format!(r#"{{"data":{{"orders":[{order}],"market_data":{{"BTC":100000.0}}}}}}"#);
        let book = OrderBook::from_json(&body).unwrap();
        assert_eq!(book.orders.len(), 1);
        book
    }

    fn best_maker(state: &PollState) -> String {
        let order: &SignedOrder = state.result.as_ref().unwrap().best_order().unwrap();
        order.order.maker.to_lowercase()
    }

    fn poller(source: Arc<ScriptedSource>, interval: Duration) -> OrderPoller {
        let feeds = FeedRegistry::from_config(&[FeedConfig {
            asset: Asset::Btc,
            price_feed: BTC_FEED.to_string(),
        }])
        .unwrap();
        let config =
            PollerConfig::new(OrderQuery::new(Direction::Moon, Asset::Btc)).with_interval(interval);
        OrderPoller::new(source, OrderSelector::new(feeds), config)
    }

    async fn wait_for(
        rx: &mut watch::Receiver<PollState>,
        f: impl FnMut(&PollState) -> bool,
    ) -> PollState {
        tokio::time::timeout(WAIT, rx.wait_for(f))
            .await
            .expect("timed out waiting for poll state")
            .expect("poller dropped")
            .clone()
    }

    const MAKER_A: &str = "0x00000000000000000000000000000000000000aa";
    const MAKER_B: &str = "0x00000000000000000000000000000000000000bb";

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let source = ScriptedSource::new(
            vec![Step::Book(MAKER_A), Step::Fail("boom"), Step::Book(MAKER_B)],
            Duration::ZERO,
        );
        let handle = poller(source, Duration::from_secs(3_600)).spawn();
        let mut rx = handle.subscribe();

        let first = wait_for(&mut rx, |s| s.sequence >= 1).await;
        assert_eq!(best_maker(&first), MAKER_A);
        assert!(first.last_error.is_none());
        assert_eq!(first.orders_received, 1);
        let first_result = first.result.clone().unwrap();

        handle.refresh_now();
        let failed = wait_for(&mut rx, |s| s.sequence >= 2).await;
        assert_eq!(failed.sequence, 2);
        assert!(failed.last_error.as_deref().unwrap().contains("boom"));
        assert!(Arc::ptr_eq(failed.result.as_ref().unwrap(), &first_result));
        assert_eq!(failed.last_updated_at, first.last_updated_at);

        handle.refresh_now();
        let recovered = wait_for(&mut rx, |s| s.sequence >= 3).await;
        assert!(recovered.last_error.is_none());
        assert_eq!(best_maker(&recovered), MAKER_B);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_never_two_fetches_in_flight() {
        let source = ScriptedSource::new(vec![Step::Book(MAKER_A)], Duration::from_millis(40));
        let handle = poller(source.clone(), Duration::from_millis(5)).spawn();

        for _ in 0..10 {
            handle.refresh_now();
            tokio::time::sleep(Duration::from_millis(15)).await;
        }

        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.sequence >= 2).await;
        handle.shutdown().await;

        assert!(source.fetches.load(Ordering::SeqCst) >= 2);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_now_fetches_before_next_tick() {
        let source = ScriptedSource::new(vec![Step::Book(MAKER_A)], Duration::ZERO);
        let handle = poller(source.clone(), Duration::from_secs(3_600)).spawn();
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| s.sequence >= 1).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        handle.refresh_now();
        let state = wait_for(&mut rx, |s| s.sequence >= 2).await;
        assert_eq!(state.sequence, 2);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_cancels_in_flight_fetch() {
        let source = ScriptedSource::new(vec![Step::Book(MAKER_A)], Duration::from_secs(60));
        let handle = poller(source.clone(), Duration::from_millis(10)).spawn();
        let mut rx = handle.subscribe();

        wait_for(&mut rx, PollState::is_fetching).await;
        assert_eq!(source.in_flight.load(Ordering::SeqCst), 1);

        drop(handle);

        let stopped = wait_for(&mut rx, |s| !s.is_fetching()).await;
        assert_eq!(stopped.sequence, 0);
        assert!(stopped.result.is_none());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_polling() {
        let source = ScriptedSource::new(vec![Step::Book(MAKER_A)], Duration::ZERO);
        let handle = poller(source.clone(), Duration::from_millis(10)).spawn();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.sequence >= 2).await;

        handle.shutdown().await;
        let fetches = source.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), fetches);
    }

    #[tokio::test]
    async fn test_staleness() {
        let source = ScriptedSource::new(vec![Step::Fail("down")], Duration::ZERO);
        let handle = poller(source, Duration::from_secs(3_600)).spawn();
        let mut rx = handle.subscribe();

        let state = wait_for(&mut rx, |s| s.sequence >= 1).await;
        assert!(state.result.is_none());
        assert!(state.last_error.is_some());
        assert!(handle.age().is_none());
        assert!(handle.is_stale(Duration::from_secs(3_600)));
    }

    #[test]
    fn test_stale_completion_discarded() {
        let mut state = PollState {
            sequence: 5,
            ..PollState::default()
        };
        let outcome = Completion {
            result: Err(PollError::FetchFailure("late".to_string())),
            latency: Duration::from_millis(1),
            finished_at: Utc::now(),
        };
        assert!(!state.complete(4, outcome));
        assert_eq!(state.sequence, 5);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_age_at() {
        let updated = Utc::now();
        let state = PollState {
            last_updated_at: Some(updated),
            ..PollState::default()
        };
        let age = state.age_at(updated + chrono::Duration::seconds(42)).unwrap();
        assert_eq!(age.num_seconds(), 42);
    }
}
