//! Fixed-point conversions between on-chain integers and display values.
//!
//! On-chain quantities travel as unsigned integers scaled by a per-quantity
//! number of decimals. Every conversion that can move funds works on exact
//! integers (`U256`) or exact decimals (`rust_decimal`); `f64` only ever
//! appears on the display side.
//!
//! `to_display` is exact up to the 96-bit mantissa of `Decimal` and then
//! rounds once into `f64`, so values with more than ~15-17 significant digits
//! lose precision. That is acceptable for display and is never used to size
//! an order.

use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};

/// Decimals of option strikes.
pub const STRIKE_DECIMALS: u32 = 8;
/// Decimals of option premiums (`price`).
pub const PRICE_DECIMALS: u32 = 8;
/// Decimals of USDC collateral.
pub const USDC_DECIMALS: u32 = 6;
/// Decimals of contract counts (`numContracts`).
pub const CONTRACTS_DECIMALS: u32 = 6;
/// Decimals of WETH collateral.
pub const WETH_DECIMALS: u32 = 18;

/// Largest scale `rust_decimal` can represent.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Semantic quantity with a fixed on-chain precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Strike,
    Price,
    UsdcCollateral,
    Contracts,
    WethCollateral,
}

impl Quantity {
    /// Number of decimals the quantity is scaled by on-chain.
    #[must_use]
    pub const fn decimals(self) -> u32 {
        match self {
            Self::Strike => STRIKE_DECIMALS,
            Self::Price => PRICE_DECIMALS,
            Self::UsdcCollateral => USDC_DECIMALS,
            Self::Contracts => CONTRACTS_DECIMALS,
            Self::WethCollateral => WETH_DECIMALS,
        }
    }
}

/// A raw on-chain integer in any of the forms the order source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAmount<'a> {
    Int(u128),
    Text(&'a str),
    Big(U256),
}

impl RawAmount<'_> {
    /// Resolve to a 256-bit integer, rejecting malformed text.
    pub fn to_u256(&self) -> CoreResult<U256> {
        match self {
            Self::Int(v) => Ok(U256::from(*v)),
            Self::Text(s) => parse_raw(s),
            Self::Big(v) => Ok(*v),
        }
    }
}

impl From<u64> for RawAmount<'_> {
    fn from(v: u64) -> Self {
        Self::Int(u128::from(v))
    }
}

impl From<u128> for RawAmount<'_> {
    fn from(v: u128) -> Self {
        Self::Int(v)
    }
}

impl From<U256> for RawAmount<'_> {
    fn from(v: U256) -> Self {
        Self::Big(v)
    }
}

impl<'a> From<&'a str> for RawAmount<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a String> for RawAmount<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(s.as_str())
    }
}

/// Parse a non-negative raw integer (decimal, or `0x`-prefixed hex).
pub fn parse_raw(text: &str) -> CoreResult<U256> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidAmount("empty integer".to_string()));
    }

    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            U256::from_str_radix(hex, 16)
        }
        Some(_) => return Err(CoreError::InvalidAmount(format!("bad hex integer: {text}"))),
        None if trimmed.bytes().all(|b| b.is_ascii_digit()) => U256::from_str_radix(trimmed, 10),
        None => return Err(CoreError::InvalidAmount(format!("not an integer: {text}"))),
    };

    parsed.map_err(|e| CoreError::InvalidAmount(format!("{text}: {e}")))
}

/// `10^decimals` as a 256-bit integer.
fn pow10(decimals: u32) -> U256 {
    U256::from(10u8).pow(U256::from(decimals))
}

/// Lower 128 bits, if the value fits.
fn fit_u128(raw: U256) -> Option<u128> {
    if raw.bit_len() > 128 {
        return None;
    }
    let limbs = raw.as_limbs();
    Some(u128::from(limbs[0]) | (u128::from(limbs[1]) << 64))
}

/// Exact decimal view of `raw / 10^decimals`.
///
/// Fails when the integer exceeds the 96-bit mantissa of `Decimal` or the
/// scale exceeds 28.
pub fn raw_to_decimal(raw: U256, decimals: u32) -> CoreResult<Decimal> {
    if decimals > MAX_DECIMAL_SCALE {
        return Err(CoreError::InvalidAmount(format!(
            "scale {decimals} exceeds {MAX_DECIMAL_SCALE}"
        )));
    }
    let mantissa = fit_u128(raw)
        .and_then(|v| i128::try_from(v).ok())
        .ok_or_else(|| CoreError::InvalidAmount(format!("{raw} exceeds decimal range")))?;

    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map_err(|e| CoreError::InvalidAmount(format!("{raw}: {e}")))
}

/// Convert a raw on-chain integer to its human-readable value.
pub fn to_display<'a>(raw: impl Into<RawAmount<'a>>, decimals: u32) -> CoreResult<f64> {
    let raw = raw.into().to_u256()?;

    if let Ok(exact) = raw_to_decimal(raw, decimals) {
        return exact
            .to_f64()
            .ok_or_else(|| CoreError::InvalidAmount(format!("{exact} not representable")));
    }

    // Beyond exact range: display-only approximation.
    let approx: f64 = raw
        .to_string()
        .parse()
        .map_err(|e| CoreError::InvalidAmount(format!("{raw}: {e}")))?;
    Ok(approx / 10f64.powi(decimals as i32))
}

/// Convert a human-readable amount to its raw on-chain integer.
///
/// Computes `floor(amount * 10^decimals)` on the shortest decimal form of
/// `amount`, so `1.999999` at 6 decimals is `1_999_999`. Never rounds up.
pub fn to_raw(amount: f64, decimals: u32) -> CoreResult<U256> {
    if !amount.is_finite() {
        return Err(CoreError::InvalidAmount(format!("non-finite amount {amount}")));
    }
    if amount < 0.0 {
        return Err(CoreError::InvalidAmount(format!("negative amount {amount}")));
    }
    if decimals > MAX_DECIMAL_SCALE {
        return Err(CoreError::InvalidAmount(format!(
            "scale {decimals} exceeds {MAX_DECIMAL_SCALE}"
        )));
    }
    // Below half a unit the floor is zero regardless of float error.
    if amount * 10f64.powi(decimals as i32) < 0.5 {
        return Ok(U256::ZERO);
    }

    let exact = Decimal::from_str(&amount.to_string())
        .map_err(|e| CoreError::InvalidAmount(format!("{amount}: {e}")))?;
    let scale = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    let scaled = exact.checked_mul(scale).ok_or_else(|| {
        CoreError::InvalidAmount(format!("{amount} overflows at {decimals} decimals"))
    })?;

    scaled
        .trunc()
        .to_u128()
        .map(U256::from)
        .ok_or_else(|| CoreError::InvalidAmount(format!("{amount} not representable")))
}

/// Contracts purchasable with `budget_raw` collateral at `price_raw` per contract.
///
/// `floor(budget / price * 10^CONTRACTS_DECIMALS)` where the budget is scaled
/// by `collateral_decimals` and the price by `PRICE_DECIMALS`. A zero price
/// yields zero contracts.
pub fn contracts_for_collateral(
    budget_raw: U256,
    collateral_decimals: u32,
    price_raw: U256,
) -> CoreResult<U256> {
    if price_raw.is_zero() {
        return Ok(U256::ZERO);
    }

    let numerator = budget_raw
        .checked_mul(pow10(PRICE_DECIMALS + CONTRACTS_DECIMALS))
        .ok_or_else(|| CoreError::InvalidAmount(format!("budget {budget_raw} overflows")))?;
    let denominator = price_raw
        .checked_mul(pow10(collateral_decimals))
        .ok_or_else(|| CoreError::InvalidAmount(format!("price {price_raw} overflows")))?;

    Ok(numerator / denominator)
}

/// Contracts purchasable with a USDC budget at a raw per-contract price.
pub fn contracts_from_budget<'a>(
    usdc_budget: f64,
    raw_price_per_contract: impl Into<RawAmount<'a>>,
) -> CoreResult<U256> {
    let price_raw = raw_price_per_contract.into().to_u256()?;
    let budget_raw = to_raw(usdc_budget, USDC_DECIMALS)?;
    contracts_for_collateral(budget_raw, USDC_DECIMALS, price_raw)
}
