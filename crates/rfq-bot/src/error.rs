//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Order error: {0}")]
    Core(#[from] rfq_core::CoreError),

    #[error("Profile error: {0}")]
    Profile(#[from] rfq_risk::ProfileError),

    #[error("Selector error: {0}")]
    Selector(#[from] rfq_selector::SelectorError),

    #[error("Poll error: {0}")]
    Poll(#[from] rfq_poller::PollError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] rfq_telemetry::TelemetryError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
