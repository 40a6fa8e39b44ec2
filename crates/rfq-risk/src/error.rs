//! Risk profiling error types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Invalid profile: score {score} outside 0..={max}")]
    InvalidProfile { score: u8, max: u8 },
}

pub type ProfileResult<T> = Result<T, ProfileError>;
