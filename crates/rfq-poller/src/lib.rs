//! Order source polling.
//!
//! Periodically fetches the signed order batch, re-runs order selection and
//! publishes the newest `SelectionResult`:
//! - `OrderSource`: the fetch collaborator (HTTP implementation included)
//! - `OrderPoller`: one fetch in flight at a time, fixed-interval ticks
//! - `PollerHandle`: subscribe to `PollState`, request refreshes, tear down

pub mod error;
pub mod poller;
pub mod source;

pub use error::{PollError, PollResult};
pub use poller::{
    OrderPoller, PollPhase, PollState, PollerConfig, PollerHandle, DEFAULT_POLL_INTERVAL,
};
pub use source::{BoxFuture, HttpOrderSource, OrderSource};
