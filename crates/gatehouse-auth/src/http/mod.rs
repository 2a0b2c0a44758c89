//! Axum HTTP handlers for the gate's own endpoints.

pub mod login;
pub mod refresh;

pub use login::{CallbackParams, LoginParams, LoginState, callback_handler, login_handler};
pub use refresh::{RefreshRequest, RefreshState, logout_handler, refresh_handler};
