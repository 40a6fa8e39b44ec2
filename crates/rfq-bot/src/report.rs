//! Printable selection summaries and metric recording.

use std::collections::BTreeMap;

use rfq_selector::{Candidate, SelectionResult};
use rfq_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Display view of the selected order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestOrderSummary {
    pub maker: String,
    /// Exact premium per contract, in USDC.
    pub premium_per_contract: String,
    pub contracts: String,
    pub strikes: Vec<f64>,
    pub expiry: u64,
    pub order_expiry_timestamp: u64,
    /// Seconds left to fill the order.
    pub fill_window_secs: u64,
    /// Distance of the first strike from spot, in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_distance_pct: Option<f64>,
}

impl BestOrderSummary {
    fn new(candidate: &Candidate, spot: Option<f64>, now: u64) -> Self {
        Self {
            maker: candidate.maker().to_string(),
            premium_per_contract: candidate.premium_per_contract.normalize().to_string(),
            contracts: candidate.contracts.normalize().to_string(),
            strikes: candidate.strikes.clone(),
            expiry: candidate.parsed.expiry,
            order_expiry_timestamp: candidate.parsed.order_expiry_timestamp,
            fill_window_secs: candidate.fill_window_secs(now),
            strike_distance_pct: spot.and_then(|s| candidate.strike_distance_pct(s)),
        }
    }
}

/// Display view of one selection pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    pub direction: String,
    pub asset: String,
    pub evaluated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot: Option<f64>,
    pub total: usize,
    pub eligible: usize,
    pub rejected: BTreeMap<&'static str, usize>,
    pub best: Option<BestOrderSummary>,
}

impl From<&SelectionResult> for SelectionSummary {
    fn from(result: &SelectionResult) -> Self {
        Self {
            direction: result.query.direction.to_string(),
            asset: result.query.asset.to_string(),
            evaluated_at: result.evaluated_at,
            spot: result.spot,
            total: result.stats.total,
            eligible: result.stats.eligible,
            rejected: result
                .stats
                .rejected
                .iter()
                .map(|(reason, count)| (reason.as_str(), *count))
                .collect(),
            best: result
                .best()
                .map(|c| BestOrderSummary::new(c, result.spot, result.evaluated_at)),
        }
    }
}

/// Record selection gauges and rejection counters.
pub fn record_selection(result: &SelectionResult) {
    let direction = result.query.direction.to_string();
    let asset = result.query.asset.to_string();
    let best_premium = result.best().and_then(|c| c.premium_per_contract.to_f64());

    Metrics::selection(&direction, &asset, result.stats.eligible, best_premium);
    for (reason, count) in &result.stats.rejected {
        Metrics::orders_rejected(reason.as_str(), *count);
    }
}
