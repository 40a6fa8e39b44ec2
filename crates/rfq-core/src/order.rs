//! Signed RFQ orders.
//!
//! `RawOrder` mirrors the order source wire format field by field and keeps
//! every integer as its exact decimal text. `SignedOrder` additionally keeps
//! the source bytes of the `order` object so the selected order can be handed
//! to submission without any re-serialization drift. `ParsedOrder` is the
//! typed form used for filtering and ranking.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::decimal::{
    parse_raw, raw_to_decimal, to_display, CONTRACTS_DECIMALS, PRICE_DECIMALS, STRIKE_DECIMALS,
};
use crate::error::{CoreError, CoreResult};

/// Text of an integer field that may arrive as a JSON string or a JSON number.
///
/// Numbers keep their literal source text; going through `serde_json::Number`
/// would turn anything above `u64::MAX` into a float.
fn int_literal<E: de::Error>(raw: &RawValue) -> Result<String, E> {
    let text = raw.get().trim();
    match text.as_bytes().first() {
        Some(b'"') => serde_json::from_str(text).map_err(E::custom),
        Some(b'-' | b'0'..=b'9') => Ok(text.to_string()),
        _ => Err(E::custom(format!("expected integer string or number, got `{text}`"))),
    }
}

fn int_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    int_literal(&raw)
}

fn int_text_seq<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Vec::<Box<RawValue>>::deserialize(deserializer)?
        .iter()
        .map(|raw| int_literal(raw))
        .collect()
}

/// RFQ order as published by the order source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    /// Maker address.
    pub maker: String,
    /// Unix seconds after which the RFQ can no longer be filled.
    #[serde(deserialize_with = "int_text")]
    pub order_expiry_timestamp: String,
    /// Collateral token address.
    pub collateral: String,
    pub is_call: bool,
    /// Price feed address; identifies the underlying.
    pub price_feed: String,
    /// Option implementation address.
    pub implementation: String,
    /// Maker side: `true` when the maker is long.
    pub is_long: bool,
    #[serde(deserialize_with = "int_text")]
    pub max_collateral_usable: String,
    /// Strikes, 8-decimal fixed point.
    #[serde(deserialize_with = "int_text_seq")]
    pub strikes: Vec<String>,
    /// Option expiry, unix seconds.
    #[serde(deserialize_with = "int_text")]
    pub expiry: String,
    /// Premium, 8-decimal fixed point.
    #[serde(deserialize_with = "int_text")]
    pub price: String,
    /// Contract count, 6-decimal fixed point.
    #[serde(deserialize_with = "int_text")]
    pub num_contracts: String,
    #[serde(default)]
    pub extra_option_data: String,
}

/// Typed boundary form of a [`RawOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOrder {
    pub maker: Address,
    pub order_expiry_timestamp: u64,
    pub collateral: Address,
    pub is_call: bool,
    pub price_feed: Address,
    pub implementation: Address,
    pub is_long: bool,
    pub max_collateral_usable: U256,
    pub strikes: Vec<U256>,
    pub expiry: u64,
    pub price: U256,
    pub num_contracts: U256,
    pub extra_option_data: Bytes,
}

fn parse_address(field: &'static str, text: &str) -> CoreResult<Address> {
    Address::from_str(text.trim())
        .map_err(|e| CoreError::InvalidAddress(format!("{field} `{text}`: {e}")))
}

fn parse_timestamp(field: &'static str, text: &str) -> CoreResult<u64> {
    text.trim()
        .parse::<u64>()
        .map_err(|e| CoreError::InvalidOrderField {
            field,
            reason: format!("`{text}`: {e}"),
        })
}

fn parse_int(field: &'static str, text: &str) -> CoreResult<U256> {
    parse_raw(text).map_err(|e| CoreError::InvalidOrderField {
        field,
        reason: e.to_string(),
    })
}

impl TryFrom<&RawOrder> for ParsedOrder {
    type Error = CoreError;

    fn try_from(raw: &RawOrder) -> CoreResult<Self> {
        let strikes = raw
            .strikes
            .iter()
            .map(|s| parse_int("strikes", s))
            .collect::<CoreResult<Vec<_>>>()?;

        let extra = raw.extra_option_data.trim();
        let extra_option_data = if extra.is_empty() {
            Bytes::new()
        } else {
            Bytes::from_str(extra).map_err(|e| CoreError::InvalidOrderField {
                field: "extraOptionData",
                reason: e.to_string(),
            })?
        };

        Ok(Self {
            maker: parse_address("maker", &raw.maker)?,
            order_expiry_timestamp: parse_timestamp(
                "orderExpiryTimestamp",
                &raw.order_expiry_timestamp,
            )?,
            collateral: parse_address("collateral", &raw.collateral)?,
            is_call: raw.is_call,
            price_feed: parse_address("priceFeed", &raw.price_feed)?,
            implementation: parse_address("implementation", &raw.implementation)?,
            is_long: raw.is_long,
            max_collateral_usable: parse_int("maxCollateralUsable", &raw.max_collateral_usable)?,
            strikes,
            expiry: parse_timestamp("expiry", &raw.expiry)?,
            price: parse_int("price", &raw.price)?,
            num_contracts: parse_int("numContracts", &raw.num_contracts)?,
            extra_option_data,
        })
    }
}

impl ParsedOrder {
    /// Premium as an exact decimal.
    pub fn premium(&self) -> CoreResult<Decimal> {
        raw_to_decimal(self.price, PRICE_DECIMALS)
    }

    /// Contract count as an exact decimal.
    pub fn contracts(&self) -> CoreResult<Decimal> {
        raw_to_decimal(self.num_contracts, CONTRACTS_DECIMALS)
    }

    /// Premium divided by contract count.
    ///
    /// `None` when the contract count is zero.
    pub fn premium_per_contract(&self) -> CoreResult<Option<Decimal>> {
        let premium = self.premium()?;
        let contracts = self.contracts()?;
        Ok(premium.checked_div(contracts))
    }

    /// Strikes in display units.
    pub fn strikes_display(&self) -> CoreResult<Vec<f64>> {
        self.strikes
            .iter()
            .map(|s| to_display(*s, STRIKE_DECIMALS))
            .collect()
    }

    /// More than one strike means a spread structure.
    #[must_use]
    pub fn is_spread(&self) -> bool {
        self.strikes.len() > 1
    }

    /// Both the option and the RFQ are still live at `now` (unix seconds).
    #[must_use]
    pub fn is_live_at(&self, now: u64) -> bool {
        self.expiry > now && self.order_expiry_timestamp > now
    }
}

/// Wire envelope as borrowed from the source JSON.
#[derive(Deserialize)]
struct EnvelopeIn<'a> {
    #[serde(borrow)]
    order: &'a RawValue,
    signature: String,
    #[serde(deserialize_with = "int_text")]
    nonce: String,
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    order: &'a RawValue,
    signature: &'a str,
    nonce: &'a str,
}

/// Order plus its detached signature and nonce.
#[derive(Clone)]
pub struct SignedOrder {
    pub order: RawOrder,
    pub signature: String,
    pub nonce: String,
    order_json: Box<RawValue>,
}

impl SignedOrder {
    /// Decode one `{ order, signature, nonce }` envelope.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let envelope: EnvelopeIn<'_> = serde_json::from_str(json)?;
        let order: RawOrder = serde_json::from_str(envelope.order.get())?;

        Ok(Self {
            order,
            signature: envelope.signature,
            nonce: envelope.nonce,
            order_json: envelope.order.to_owned(),
        })
    }

    /// Exact source text of the `order` object.
    #[must_use]
    pub fn order_json(&self) -> &RawValue {
        &self.order_json
    }

    /// Parse the order into its typed form.
    pub fn parse(&self) -> CoreResult<ParsedOrder> {
        ParsedOrder::try_from(&self.order)
    }

    /// Build the submission payload for this order.
    #[must_use]
    pub fn submission(&self, referrer: Address) -> SubmissionPayload {
        SubmissionPayload {
            order: self.order_json.clone(),
            signature: self.signature.clone(),
            referrer: referrer.to_string(),
        }
    }
}

impl fmt::Debug for SignedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedOrder")
            .field("maker", &self.order.maker)
            .field("price", &self.order.price)
            .field("num_contracts", &self.order.num_contracts)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

impl PartialEq for SignedOrder {
    fn eq(&self, other: &Self) -> bool {
        self.order_json.get() == other.order_json.get()
            && self.signature == other.signature
            && self.nonce == other.nonce
    }
}

impl Eq for SignedOrder {}

impl Serialize for SignedOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EnvelopeOut {
            order: &self.order_json,
            signature: &self.signature,
            nonce: &self.nonce,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SignedOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_json(raw.get()).map_err(de::Error::custom)
    }
}

/// What the order submission collaborator receives.
///
/// `order` serializes as the exact bytes received from the order source.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub order: Box<RawValue>,
    pub signature: String,
    pub referrer: String,
}
