//! HTTP server wiring for the Gatehouse authentication gate.

pub mod config;
pub mod context;
pub mod handlers;
pub mod observability;
pub mod server;

pub use context::{AppState, gate_policy};
pub use server::{GatehouseServer, ServerBuilder, build_app};
