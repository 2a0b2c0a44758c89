//! Token refresh and logout endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::middleware::CurrentUser;
use crate::token::TokenService;
use crate::types::TokenPair;

/// State required by the refresh and logout endpoints.
#[derive(Clone)]
pub struct RefreshState {
    /// Token service performing the exchange.
    pub token_service: Arc<TokenService>,
}

impl RefreshState {
    /// Creates a new refresh state.
    #[must_use]
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

/// Refresh exchange request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The (possibly expired) access token identifying the subject.
    pub access_token: String,

    /// The refresh token to exchange.
    pub refresh_token: String,
}

/// Refresh endpoint handler (`ANY /api/v1/auth/refresh`).
///
/// Public by policy so that clients holding an expired access token can
/// still reach it. Returns a fresh token pair; with rotation enabled the
/// presented refresh token stops working.
///
/// # Errors
/// Fails with 400 `invalid_grant` for unknown, superseded or expired
/// refresh tokens and with 401 for access tokens the gate never signed.
pub async fn refresh_handler(
    State(state): State<RefreshState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = state
        .token_service
        .refresh(&request.access_token, &request.refresh_token)
        .await?;
    Ok(Json(pair))
}

/// Logout endpoint handler (`POST /api/v1/auth/logout`).
///
/// Deletes the caller's refresh-token record; the next refresh attempt
/// fails with `invalid_grant`. The access token naturally lapses at its
/// expiry; the gate keeps no denylist.
///
/// # Errors
/// Fails with 401 when the request carries no authenticated principal.
pub async fn logout_handler(
    State(state): State<RefreshState>,
    CurrentUser(principal): CurrentUser,
) -> Result<StatusCode, AuthError> {
    state.token_service.revoke(&principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
