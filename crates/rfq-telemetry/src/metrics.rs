//! Prometheus metrics for the RFQ selector.
//!
//! Covers order polling (outcomes, latency, staleness) and order selection
//! (eligible candidates, best normalized premium, filter rejections).
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a fatal startup error. These panics only
//! occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram,
    register_int_gauge, CounterVec, Encoder, Gauge, GaugeVec, Histogram, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Poll attempts by outcome (success/failure).
pub static POLL_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("rfq_poll_total", "Order source poll attempts", &["outcome"]).unwrap()
});

/// Poll latency in milliseconds.
pub static POLL_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "rfq_poll_latency_ms",
        "Order source fetch latency in milliseconds",
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Seconds since the last successful poll.
pub static RESULT_AGE_SECONDS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "rfq_result_age_seconds",
        "Age of the published selection result in seconds"
    )
    .unwrap()
});

/// Orders in the last fetched batch.
pub static ORDERS_RECEIVED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("rfq_orders_received", "Orders in the last fetched batch").unwrap()
});

/// Orders that failed to decode in the last batch.
pub static ORDERS_MALFORMED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rfq_orders_malformed",
        "Orders in the last batch that failed to decode"
    )
    .unwrap()
});

/// Eligible candidates per query.
pub static ELIGIBLE_ORDERS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "rfq_eligible_orders",
        "Eligible orders for the query",
        &["direction", "asset"]
    )
    .unwrap()
});

/// Best normalized premium per query.
pub static BEST_PREMIUM: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "rfq_best_premium",
        "Best normalized premium per contract",
        &["direction", "asset"]
    )
    .unwrap()
});

/// Filter rejections by reason.
pub static ORDERS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rfq_orders_rejected_total",
        "Orders rejected by the selection filter",
        &["reason"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a successful poll.
    pub fn poll_succeeded(latency_ms: f64) {
        POLL_TOTAL.with_label_values(&["success"]).inc();
        POLL_LATENCY_MS.observe(latency_ms);
    }

    /// Record a failed poll.
    pub fn poll_failed(latency_ms: f64) {
        POLL_TOTAL.with_label_values(&["failure"]).inc();
        POLL_LATENCY_MS.observe(latency_ms);
    }

    /// Record the age of the published result.
    pub fn result_age(age_secs: f64) {
        RESULT_AGE_SECONDS.set(age_secs);
    }

    /// Record batch size and decode failures.
    pub fn batch_received(orders: usize, malformed: usize) {
        ORDERS_RECEIVED.set(orders as i64);
        ORDERS_MALFORMED.set(malformed as i64);
    }

    /// Record the selection outcome for a query.
    ///
    /// A missing best premium resets the gauge to 0.
    pub fn selection(direction: &str, asset: &str, eligible: usize, best_premium: Option<f64>) {
        ELIGIBLE_ORDERS
            .with_label_values(&[direction, asset])
            .set(eligible as f64);
        BEST_PREMIUM
            .with_label_values(&[direction, asset])
            .set(best_premium.unwrap_or(0.0));
    }

    /// Record filter rejections.
    pub fn orders_rejected(reason: &str, count: usize) {
        ORDERS_REJECTED_TOTAL
            .with_label_values(&[reason])
            .inc_by(count as f64);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render() {
        Metrics::poll_succeeded(12.0);
        Metrics::poll_failed(30.0);
        Metrics::batch_received(5, 1);
        Metrics::selection("MOON", "BTC", 3, Some(0.04));
        Metrics::orders_rejected("expired", 2);
        Metrics::result_age(1.5);

        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("rfq_poll_total"));
        assert!(text.contains("rfq_orders_received 5"));
        assert!(text.contains("rfq_eligible_orders{"));
        assert!(text.contains(r#"direction="MOON""#));
        assert!(text.contains(r#"rfq_orders_rejected_total{reason="expired"} 2"#));
    }
}
