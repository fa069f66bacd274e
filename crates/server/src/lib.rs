//! HTTP layer for the frameflow pipeline: application state, routes, and
//! Prometheus plumbing. The binary in `main.rs` wires this against the real
//! backends; integration tests inject mocks.

pub mod api;
pub mod metrics;
pub mod state;
