//! Core domain types for the RFQ option selection engine.
//!
//! This crate provides the types every other crate builds on:
//! - `decimal`: fixed-point conversions between on-chain integers and display values
//! - `RawOrder`, `SignedOrder`: signed RFQ orders as delivered by the order source
//! - `ParsedOrder`: the typed boundary form of a `RawOrder`
//! - `Asset`, `MarketSnapshot`, `OrderBook`: the polled market payload

pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use alloy::primitives::{Address, U256};
pub use decimal::{
    contracts_for_collateral, contracts_from_budget, parse_raw, raw_to_decimal, to_display,
    to_raw, Quantity, RawAmount, CONTRACTS_DECIMALS, PRICE_DECIMALS, STRIKE_DECIMALS,
    USDC_DECIMALS, WETH_DECIMALS,
};
pub use error::{CoreError, CoreResult};
pub use market::{Asset, MarketSnapshot, OrderBook, OrderBookResponse};
pub use order::{ParsedOrder, RawOrder, SignedOrder, SubmissionPayload};
