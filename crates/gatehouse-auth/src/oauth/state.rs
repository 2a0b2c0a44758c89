//! Transient authorization-request state.
//!
//! The login initiation endpoint stashes a CSRF state value (and the
//! optional post-login destination) in a short-lived cookie; the
//! callback validates against it and both completion paths clear it.
//! Keeping this in a cookie keeps the gate stateless server-side.

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Name of the transient authorization-request cookie.
pub const AUTH_REQUEST_COOKIE: &str = "gatehouse_auth_request";

/// How long a login attempt may take before the state cookie lapses.
const AUTH_REQUEST_MAX_AGE_SECS: u64 = 300;

/// Pending authorization-request state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// CSRF state handed to the provider and expected back.
    pub state: String,

    /// Allow-listed post-login destination, if the client asked for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

impl AuthorizationRequest {
    /// Creates a request with a fresh random state value.
    #[must_use]
    pub fn new(redirect_uri: Option<String>) -> Self {
        Self {
            state: generate_state(),
            redirect_uri,
        }
    }

    /// Serializes into a cookie value (base64url of JSON).
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing a two-field struct of strings cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Parses a cookie value produced by [`encode`](Self::encode).
    #[must_use]
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Reads the pending request from a request's `Cookie` header.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
        for cookie in cookie_header.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=')
                && name.trim() == AUTH_REQUEST_COOKIE
            {
                return Self::decode(value.trim());
            }
        }
        None
    }

    /// Builds the `Set-Cookie` value storing this request.
    #[must_use]
    pub fn build_cookie(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            AUTH_REQUEST_COOKIE,
            self.encode(),
            AUTH_REQUEST_MAX_AGE_SECS
        )
    }

    /// Builds the `Set-Cookie` value clearing the pending request.
    #[must_use]
    pub fn clear_cookie() -> String {
        format!("{AUTH_REQUEST_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax")
    }
}

/// Generates a random CSRF state value (128 bits, base64url).
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
