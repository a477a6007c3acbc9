//! Integration tests for tickr-server.
//!
//! These tests exercise the service against local mocks:
//! - exchange stream (tokio-tungstenite)
//! - exchange REST and analysis endpoints (axum)

pub mod common;
