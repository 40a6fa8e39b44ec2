//! Shared integration test fixtures.

pub mod fixtures;
pub mod mock_http;
