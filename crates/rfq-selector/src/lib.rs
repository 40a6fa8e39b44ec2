//! Order filtering and selection.
//!
//! Given a batch of signed RFQ orders and a directional query, keeps the
//! orders a taker can use to get the desired exposure and ranks them by
//! normalized premium:
//! - `Direction`, `OrderQuery`: what the user wants (MOON/DOOM on BTC/ETH)
//! - `FeedRegistry`: resolves an order's price feed to its underlying asset
//! - `OrderSelector`: pure filter + rank, producing a `SelectionResult`

pub mod error;
pub mod feeds;
pub mod query;
pub mod selector;

pub use error::{SelectorError, SelectorResult};
pub use feeds::{FeedConfig, FeedRegistry};
pub use query::{Direction, OrderQuery};
pub use selector::{Candidate, OrderSelector, RejectReason, SelectionResult, SelectionStats};
