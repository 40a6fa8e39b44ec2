//! Integration tests for rfq-bot.
//!
//! These tests verify the interaction between components:
//! - HTTP order source against a live socket
//! - Poller publication over real fetches
//! - Offline selection through the application wiring

pub mod common;
