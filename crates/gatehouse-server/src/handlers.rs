//! Request handlers behind the gate.
//!
//! Everything here runs after the middleware list: a handler on a
//! protected path always sees an authorized principal.

use axum::{Json, extract::{Path, State}};
use gatehouse_auth::error::AuthError;
use gatehouse_auth::http::RefreshState;
use gatehouse_auth::middleware::CurrentUser;
use serde_json::{Value, json};

/// Service info page.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "gatehouse",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Returns the caller's identity as the gate sees it.
pub async fn profile(CurrentUser(principal): CurrentUser) -> Json<Value> {
    Json(json!({
        "user_id": principal.user_id,
        "authorities": principal
            .authorities
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>(),
    }))
}

/// Admin operation: revoke a user's refresh token.
///
/// Gated by the `/api/**/admin/**` policy rule; the handler itself only
/// performs the store mutation.
pub async fn revoke_tokens(
    State(state): State<RefreshState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    let revoked = state.token_service.revoke(&user_id).await?;
    Ok(Json(json!({ "user_id": user_id, "revoked": revoked })))
}
