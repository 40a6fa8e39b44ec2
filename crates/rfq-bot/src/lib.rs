//! RFQ option order selector.
//!
//! Wires the components together:
//! - Order source polling and best-order selection
//! - Risk questionnaire recommendation
//! - Offline selection over a saved order source response

pub mod app;
pub mod config;
pub mod error;
pub mod report;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use report::{BestOrderSummary, SelectionSummary};
