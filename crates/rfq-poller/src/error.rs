//! Poller error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    /// Transport error, non-success status or undecodable body.
    #[error("Fetch failure: {0}")]
    FetchFailure(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type PollResult<T> = Result<T, PollError>;
