//! OAuth2 login initiation and completion endpoints.
//!
//! Initiation (`GET /oauth2/authorization/{provider}`) stashes the CSRF
//! state in a transient cookie and redirects to the provider. The
//! callback (`GET /login/oauth2/code/{provider}`) completes the flow:
//!
//! - **success**: resolve the identity through the user directory, issue
//!   access + refresh tokens (the refresh record replaces any prior
//!   one), clear the transient cookie, set the refresh cookie and
//!   redirect with the access token attached;
//! - **failure**: clear the transient cookie and redirect to the
//!   failure destination with an `error` parameter, never issuing
//!   tokens.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::config::{CookieConfig, RedirectConfig};
use crate::error::AuthError;
use crate::oauth::{AuthorizationRequest, ProviderRegistry};
use crate::storage::UserDirectory;
use crate::token::TokenService;

/// State required by the login endpoints.
#[derive(Clone)]
pub struct LoginState {
    /// Registered identity providers.
    pub providers: Arc<ProviderRegistry>,

    /// Authority assignment for confirmed identities.
    pub directory: Arc<dyn UserDirectory>,

    /// Token issuance.
    pub token_service: Arc<TokenService>,

    /// Success/failure redirect targets.
    pub redirect: RedirectConfig,

    /// Refresh-token cookie settings.
    pub cookie: CookieConfig,

    /// Public base URL used to build provider callback URIs.
    pub public_url: String,
}

impl LoginState {
    /// Absolute callback URI registered with providers.
    #[must_use]
    pub fn callback_uri(&self, provider_id: &str) -> String {
        format!(
            "{}/login/oauth2/code/{provider_id}",
            self.public_url.trim_end_matches('/')
        )
    }
}

/// Query parameters of the initiation endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginParams {
    /// Requested post-login destination. Honored only when allow-listed.
    pub redirect_uri: Option<String>,
}

/// Query parameters of the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code on success.
    pub code: Option<String>,

    /// CSRF state echoed by the provider.
    pub state: Option<String>,

    /// Error code when the provider aborted the flow.
    pub error: Option<String>,
}

/// Login initiation handler (`GET /oauth2/authorization/{provider}`).
///
/// # Errors
/// Fails with 400 for unknown or disabled providers.
pub async fn login_handler(
    State(state): State<LoginState>,
    Path(provider_id): Path<String>,
    Query(params): Query<LoginParams>,
) -> Result<Response, AuthError> {
    let provider = state
        .providers
        .get(&provider_id)
        .ok_or_else(|| AuthError::invalid_request(format!("unknown provider: {provider_id}")))?;

    // Silently drop destinations that are not allow-listed
    let redirect_uri = params
        .redirect_uri
        .filter(|uri| state.redirect.is_authorized(uri));

    let request = AuthorizationRequest::new(redirect_uri);
    let authorize_url = provider.authorize_url(&request.state, &state.callback_uri(&provider_id))?;

    tracing::debug!(provider = %provider_id, "login initiated");

    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, header_value(&authorize_url)?);
    headers.append(header::SET_COOKIE, header_value(&request.build_cookie())?);

    Ok((StatusCode::FOUND, headers).into_response())
}

/// Provider callback handler (`GET /login/oauth2/code/{provider}`).
pub async fn callback_handler(
    State(state): State<LoginState>,
    Path(provider_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let pending = AuthorizationRequest::from_headers(&headers);

    if let Some(error) = params.error {
        tracing::warn!(provider = %provider_id, error = %error, "provider aborted login");
        return failure_response(&state, "access_denied");
    }

    let Some(pending) = pending else {
        return failure_response(&state, "invalid_state");
    };
    if params.state.as_deref() != Some(pending.state.as_str()) {
        tracing::warn!(provider = %provider_id, "authorization state mismatch");
        return failure_response(&state, "invalid_state");
    }

    let Some(code) = params.code else {
        return failure_response(&state, "invalid_request");
    };
    let Some(provider) = state.providers.get(&provider_id) else {
        return failure_response(&state, "invalid_request");
    };

    let identity = match provider
        .exchange_code(&code, &state.callback_uri(&provider_id))
        .await
    {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(provider = %provider_id, error = %err, "code exchange failed");
            return failure_response(&state, "exchange_failed");
        }
    };

    let principal = match state.directory.resolve(&identity).await {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(provider = %provider_id, error = %err, "identity not resolvable");
            return failure_response(&state, "unknown_user");
        }
    };

    let pair = match state.token_service.issue_token_pair(&principal).await {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(error = %err, "token issuance failed");
            return failure_response(&state, "server_error");
        }
    };

    tracing::info!(
        user_id = %principal.user_id,
        provider = %provider_id,
        "login completed"
    );

    let target = pending
        .redirect_uri
        .unwrap_or_else(|| state.redirect.success_uri.clone());
    let location = append_query(&target, "token", &pair.access_token);

    let refresh_cookie = state.cookie.build_cookie(
        &pair.refresh_token,
        state.token_service.refresh_lifetime_secs().max(0) as u64,
    );

    redirect_with_cookies(&location, &[AuthorizationRequest::clear_cookie(), refresh_cookie])
}

/// Builds the failure redirect: transient state cleared, no tokens.
fn failure_response(state: &LoginState, error: &str) -> Response {
    let location = append_query(&state.redirect.failure_uri, "error", error);
    redirect_with_cookies(&location, &[AuthorizationRequest::clear_cookie()])
}

fn redirect_with_cookies(location: &str, cookies: &[String]) -> Response {
    let mut headers = HeaderMap::new();
    match header_value(location) {
        Ok(value) => {
            headers.insert(header::LOCATION, value);
        }
        Err(err) => return err.into_response(),
    }
    for cookie in cookies {
        match header_value(cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(err) => return err.into_response(),
        }
    }
    (StatusCode::FOUND, headers).into_response()
}

fn header_value(value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value)
        .map_err(|e| AuthError::internal(format!("invalid header value: {e}")))
}

fn append_query(uri: &str, key: &str, value: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}{key}={value}")
}
