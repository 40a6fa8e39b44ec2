//! Order filtering and ranking.
//!
//! An order is eligible when all of the following hold:
//! 1. its price feed resolves to the queried asset
//! 2. `isCall` matches the direction and the maker is short, so the taker
//!    ends up long the desired exposure
//! 3. both `expiry` and `orderExpiryTimestamp` are strictly after `now`
//! 4. `strikes` is non-empty and `price`/`numContracts` are positive
//! 5. (optional) the option expires within the query horizon
//!
//! Eligible orders are ranked by normalized premium (premium per contract,
//! lowest first), then by latest `orderExpiryTimestamp`, then by smallest
//! maker address. Selection is pure: no I/O and no state between calls.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rfq_core::{Address, OrderBook, ParsedOrder, SignedOrder, SubmissionPayload};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::feeds::FeedRegistry;
use crate::query::OrderQuery;

/// Why an order was filtered out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// A field failed to parse.
    Malformed,
    /// Price feed is not in the registry.
    UnknownFeed,
    AssetMismatch,
    /// Wrong option type, or the maker is long.
    SideMismatch,
    /// Option or RFQ already expired.
    Expired,
    NoStrikes,
    /// Zero price or zero contracts.
    NonPositive,
    BeyondHorizon,
}

impl RejectReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::UnknownFeed => "unknown_feed",
            Self::AssetMismatch => "asset_mismatch",
            Self::SideMismatch => "side_mismatch",
            Self::Expired => "expired",
            Self::NoStrikes => "no_strikes",
            Self::NonPositive => "non_positive",
            Self::BeyondHorizon => "beyond_horizon",
        }
    }
}

/// Filter counters for one selection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub total: usize,
    pub eligible: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl SelectionStats {
    fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_default() += 1;
    }

    #[must_use]
    pub fn rejected_for(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }
}

/// An eligible order with its ranking inputs.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub order: SignedOrder,
    pub parsed: ParsedOrder,
    /// Premium per contract, exact.
    pub premium_per_contract: Decimal,
    /// Contracts on offer, exact.
    pub contracts: Decimal,
    /// Strikes in display units.
    pub strikes: Vec<f64>,
}

impl Candidate {
    /// Maker of the underlying order.
    #[must_use]
    pub fn maker(&self) -> Address {
        self.parsed.maker
    }

    /// Distance of the first strike from spot, in percent.
    #[must_use]
    pub fn strike_distance_pct(&self, spot: f64) -> Option<f64> {
        let strike = *self.strikes.first()?;
        if spot <= 0.0 {
            return None;
        }
        Some((strike - spot) / spot * 100.0)
    }

    /// Seconds until the RFQ can no longer be filled.
    #[must_use]
    pub fn fill_window_secs(&self, now: u64) -> u64 {
        self.parsed.order_expiry_timestamp.saturating_sub(now)
    }
}

/// Ranking: cheapest normalized premium, then longest fill window, then
/// smallest maker address. Makers compare as 20-byte values, so hex case in
/// the source text plays no part.
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.premium_per_contract
        .cmp(&b.premium_per_contract)
        .then_with(|| {
            b.parsed
                .order_expiry_timestamp
                .cmp(&a.parsed.order_expiry_timestamp)
        })
        .then_with(|| a.parsed.maker.cmp(&b.parsed.maker))
}

/// Outcome of one selection pass.
///
/// `candidates` is sorted best-first; an empty set is a normal outcome
/// (empty market), not an error.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub query: OrderQuery,
    /// Unix seconds the orders were evaluated against.
    pub evaluated_at: u64,
    /// Spot of the queried asset, when the snapshot carried one.
    pub spot: Option<f64>,
    pub candidates: Vec<Candidate>,
    pub stats: SelectionStats,
}

impl SelectionResult {
    /// Best candidate, if any order matched.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// The selected order, unmodified.
    #[must_use]
    pub fn best_order(&self) -> Option<&SignedOrder> {
        self.best().map(|c| &c.order)
    }

    /// Submission payload for the selected order.
    #[must_use]
    pub fn submission(&self, referrer: Address) -> Option<SubmissionPayload> {
        self.best_order().map(|o| o.submission(referrer))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Pure order selector.
#[derive(Debug, Clone, Default)]
pub struct OrderSelector {
    feeds: FeedRegistry,
}

impl OrderSelector {
    #[must_use]
    pub fn new(feeds: FeedRegistry) -> Self {
        Self { feeds }
    }

    #[must_use]
    pub fn feeds(&self) -> &FeedRegistry {
        &self.feeds
    }

    /// Select over a polled order book, attaching the asset's spot price.
    #[must_use]
    pub fn select_from_book(
        &self,
        book: &OrderBook,
        query: &OrderQuery,
        now: u64,
    ) -> SelectionResult {
        let mut result = self.select_best_order(&book.orders, query, now);
        result.spot = book.market.spot(query.asset);
        result
    }

    /// Select the best order for `query` at `now` (unix seconds).
    #[must_use]
    pub fn select_best_order(
        &self,
        orders: &[SignedOrder],
        query: &OrderQuery,
        now: u64,
    ) -> SelectionResult {
        let mut stats = SelectionStats {
            total: orders.len(),
            ..SelectionStats::default()
        };
        let mut candidates = Vec::new();

        for order in orders {
            match self.evaluate(order, query, now) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    trace!(
                        maker = %order.order.maker,
                        nonce = %order.nonce,
                        reason = reason.as_str(),
                        "Order rejected"
                    );
                    stats.reject(reason);
                }
            }
        }

        candidates.sort_by(rank);
        stats.eligible = candidates.len();

        debug!(
            query = %query,
            total = stats.total,
            eligible = stats.eligible,
            best_premium = ?candidates.first().map(|c| c.premium_per_contract),
            "Order selection complete"
        );

        SelectionResult {
            query: *query,
            evaluated_at: now,
            spot: None,
            candidates,
            stats,
        }
    }

    fn evaluate(
        &self,
        order: &SignedOrder,
        query: &OrderQuery,
        now: u64,
    ) -> Result<Candidate, RejectReason> {
        let parsed = order.parse().map_err(|_| RejectReason::Malformed)?;

        let asset = self
            .feeds
            .asset_for(&parsed.price_feed)
            .ok_or(RejectReason::UnknownFeed)?;
        if asset != query.asset {
            return Err(RejectReason::AssetMismatch);
        }

        if parsed.is_call != query.direction.is_call() || parsed.is_long {
            return Err(RejectReason::SideMismatch);
        }

        if !parsed.is_live_at(now) {
            return Err(RejectReason::Expired);
        }

        if parsed.strikes.is_empty() {
            return Err(RejectReason::NoStrikes);
        }

        if parsed.price.is_zero() || parsed.num_contracts.is_zero() {
            return Err(RejectReason::NonPositive);
        }

        if let Some(horizon) = query.max_horizon {
            let time_to_expiry = parsed.expiry - now;
            if i64::try_from(time_to_expiry).map_or(true, |secs| secs > horizon.num_seconds()) {
                return Err(RejectReason::BeyondHorizon);
            }
        }

        let contracts = parsed.contracts().map_err(|_| RejectReason::Malformed)?;
        let premium_per_contract = parsed
            .premium_per_contract()
            .map_err(|_| RejectReason::Malformed)?
            .ok_or(RejectReason::NonPositive)?;
        let strikes = parsed
            .strikes_display()
            .map_err(|_| RejectReason::Malformed)?;

        Ok(Candidate {
            order: order.clone(),
            parsed,
            premium_per_contract,
            contracts,
            strikes,
        })
    }
}
