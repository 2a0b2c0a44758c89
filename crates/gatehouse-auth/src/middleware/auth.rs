//! Request authentication middleware and extractors.
//!
//! The [`authenticate`] middleware runs exactly once per request, before
//! policy evaluation. Per request it walks
//! `Unauthenticated -> TokenExtracted -> Verified -> AuthoritiesBound`,
//! terminating in either a forwarded request (with the principal bound
//! into the request extensions) or a short-circuit rejection.
//!
//! A missing token is not a rejection: the request is forwarded
//! unauthenticated so public endpoints stay reachable, and the policy
//! table decides whether the path needs a principal.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::token::TokenService;
use crate::types::Principal;

// =============================================================================
// Auth State
// =============================================================================

/// State required by the authentication middleware.
///
/// Include it in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Token service used to verify presented bearer tokens.
    pub token_service: Arc<TokenService>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Returns `true` for a cross-origin preflight probe.
///
/// Preflights are always permitted and must never reach token
/// verification; both gate middlewares forward them untouched.
#[must_use]
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Extracts a bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

// =============================================================================
// Authentication Middleware
// =============================================================================

/// Authenticates a request from its bearer token.
///
/// - preflight: forwarded untouched
/// - no token: forwarded unauthenticated
/// - valid token: [`Principal`] bound into the request extensions
/// - invalid token: short-circuits with the typed 401 response
pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_preflight(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        return next.run(request).await;
    };

    match state.token_service.verify(&token) {
        Ok(principal) => {
            tracing::debug!(user_id = %principal.user_id, "request authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "token verification failed");
            err.into_response()
        }
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor for the authenticated principal.
///
/// Rejects with 401 when the request carries no verified principal.
/// Handlers behind the policy table can rely on this never rejecting
/// for paths that require authentication.
///
/// # Example
///
/// ```ignore
/// async fn profile(CurrentUser(principal): CurrentUser) -> Json<Profile> {
///     Json(Profile::for_user(&principal.user_id))
/// }
/// ```
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AuthError::unauthorized("authentication required"))
    }
}

/// Extractor for an optionally authenticated principal.
///
/// Unlike [`CurrentUser`] this never rejects; it yields `None` for
/// unauthenticated requests. Useful for endpoints that behave
/// differently for logged-in callers.
pub struct OptionalUser(pub Option<Principal>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<Principal>().cloned()))
    }
}

// =============================================================================
// Tests
// =============================================================================
