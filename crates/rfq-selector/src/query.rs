//! Directional bet and the query built from it.

use std::fmt;
use std::str::FromStr;

use rfq_core::Asset;
use rfq_risk::TradeDuration;
use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Directional bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Bullish: long a call.
    Moon,
    /// Bearish: long a put.
    Doom,
}

impl Direction {
    /// Whether the taker needs a call (`true`) or a put (`false`).
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::Moon)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moon => write!(f, "MOON"),
            Self::Doom => write!(f, "DOOM"),
        }
    }
}

impl FromStr for Direction {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOON" | "CALL" | "UP" => Ok(Self::Moon),
            "DOOM" | "PUT" | "DOWN" => Ok(Self::Doom),
            other => Err(SelectorError::InvalidQuery(format!(
                "unknown direction `{other}`"
            ))),
        }
    }
}

/// One (direction, asset) selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderQuery {
    pub direction: Direction,
    pub asset: Asset,
    /// Only keep options expiring within this window of `now`.
    pub max_horizon: Option<chrono::Duration>,
}

impl OrderQuery {
    #[must_use]
    pub fn new(direction: Direction, asset: Asset) -> Self {
        Self {
            direction,
            asset,
            max_horizon: None,
        }
    }

    /// Restrict to contracts that fit the recommended duration bucket.
    #[must_use]
    pub fn with_duration(mut self, duration: TradeDuration) -> Self {
        self.max_horizon = Some(duration.horizon());
        self
    }

    #[must_use]
    pub fn with_max_horizon(mut self, horizon: chrono::Duration) -> Self {
        self.max_horizon = Some(horizon);
        self
    }
}

impl fmt::Display for OrderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction, self.asset)
    }
}
