//! HTTP middleware for the authentication gate.
//!
//! The gate is an explicit middleware list invoked in fixed order by the
//! server: [`authenticate`] first, [`enforce`] second, each able to
//! short-circuit with a terminal response.

pub mod auth;
pub mod error;
pub mod policy;

pub use auth::{AuthState, CurrentUser, OptionalUser, authenticate, is_preflight};
pub use policy::{PolicyState, enforce};
