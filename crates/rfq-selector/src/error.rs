//! Selector error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Invalid feed configuration: {0}")]
    InvalidFeed(String),

    #[error("Duplicate price feed {address} for {first} and {second}")]
    DuplicateFeed {
        address: String,
        first: String,
        second: String,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type SelectorResult<T> = Result<T, SelectorError>;
