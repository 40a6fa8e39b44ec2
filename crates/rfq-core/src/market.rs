//! Underlying assets, spot snapshots and the polled order book payload.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{CoreError, CoreResult};
use crate::order::SignedOrder;

/// Underlying asset of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Btc, Asset::Eth];

    /// Ticker symbol used by the order source.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTC" => Ok(Self::Btc),
            "ETH" => Ok(Self::Eth),
            other => Err(CoreError::InvalidOrderField {
                field: "asset",
                reason: format!("unknown asset `{other}`"),
            }),
        }
    }
}

/// Spot prices keyed by asset symbol.
///
/// Symbols other than BTC/ETH are kept as delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSnapshot(BTreeMap<String, f64>);

impl MarketSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spot price of `asset`, if quoted.
    #[must_use]
    pub fn spot(&self, asset: Asset) -> Option<f64> {
        self.0.get(asset.symbol()).copied()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, spot: f64) {
        self.0.insert(symbol.into(), spot);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Order source response: `{ data: { orders, market_data } }`.
#[derive(Debug, Deserialize)]
pub struct OrderBookResponse {
    pub data: OrderBookData,
}

/// Payload of [`OrderBookResponse`].
///
/// Orders stay undecoded so one bad entry cannot poison the batch.
#[derive(Debug, Deserialize)]
pub struct OrderBookData {
    #[serde(default)]
    pub orders: Vec<Box<RawValue>>,
    #[serde(default)]
    pub market_data: MarketSnapshot,
}

/// Decoded order batch plus market snapshot.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub orders: Vec<SignedOrder>,
    pub market: MarketSnapshot,
    /// Entries that failed to decode and were dropped.
    pub malformed: usize,
}

impl OrderBook {
    /// Decode a full response body.
    ///
    /// Fails only when the envelope itself is malformed; individual orders
    /// that do not decode are counted in `malformed`.
    pub fn from_json(body: &str) -> CoreResult<Self> {
        let response: OrderBookResponse = serde_json::from_str(body)?;
        Ok(Self::from_response(response))
    }

    #[must_use]
    pub fn from_response(response: OrderBookResponse) -> Self {
        let mut orders = Vec::with_capacity(response.data.orders.len());
        let mut malformed = 0;

        for raw in &response.data.orders {
            match SignedOrder::from_json(raw.get()) {
                Ok(order) => orders.push(order),
                Err(_) => malformed += 1,
            }
        }

        Self {
            orders,
            market: response.data.market_data,
            malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::{envelope, ORDER_JSON};

    #[test]
    fn test_asset_parse_and_display() {
        assert_eq!("btc".parse::<Asset>().unwrap(), Asset::Btc);
        assert_eq!(" ETH ".parse::<Asset>().unwrap(), Asset::Eth);
        assert!("SOL".parse::<Asset>().is_err());
        assert_eq!(Asset::Eth.to_string(), "ETH");
    }

    #[test]
    fn test_order_book_decode() {
        let body = format!(
            r#"{{"data":{{"orders":[{},{{"order":{{"maker":1}},"signature":"0x","nonce":"1"}}],"market_data":{{"BTC":97123.5,"ETH":3456.25,"SOL":180.0}}}}}}"#,
            envelope(ORDER_JSON)
        );
        let book = OrderBook::from_json(&body).unwrap();

        assert_eq!(book.orders.len(), 1);
        assert_eq!(book.malformed, 1);
        assert_eq!(book.market.spot(Asset::Btc), Some(97123.5));
        assert_eq!(book.market.spot(Asset::Eth), Some(3456.25));
        assert_eq!(book.market.iter().count(), 3);
    }

    #[test]
    fn test_order_book_missing_sections_default() {
        let book = OrderBook::from_json(r#"{"data":{}}"#).unwrap();
        assert!(book.orders.is_empty());
        assert!(book.market.is_empty());
    }

    #[test]
    fn test_order_book_malformed_envelope() {
        assert!(matches!(
            OrderBook::from_json(r#"{"orders":[]}"#),
            Err(CoreError::Json(_))
        ));
        assert!(OrderBook::from_json("not json").is_err());
    }
}
