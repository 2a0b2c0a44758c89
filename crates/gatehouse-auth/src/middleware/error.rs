//! Error responses for the gate.
//!
//! Implements `IntoResponse` for [`AuthError`] so every failure path in
//! the middleware and handlers terminates with a consistent RFC 6749
//! style JSON body.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let oauth_error = self.oauth_error_code();
        // Server-side detail stays in the logs; clients get the generic
        // description for 5xx responses.
        let description = if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "gate error");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": oauth_error,
            "error_description": description,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(oauth_error, &description);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Maps an error to its HTTP status.
fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::Unauthorized { .. }
        | AuthError::InvalidToken { .. }
        | AuthError::TokenExpired
        | AuthError::UnknownSubject { .. } => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AuthError::InvalidGrant { .. } | AuthError::InvalidRequest { .. } => {
            StatusCode::BAD_REQUEST
        }
        AuthError::OAuthExchange { .. } => StatusCode::BAD_GATEWAY,
        AuthError::Storage { .. } | AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Builds the `WWW-Authenticate` header value for 401 responses.
///
/// Format: `Bearer realm="gatehouse", error="invalid_token",
/// error_description="..."`.
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped = description.replace('"', "\\\"");
    format!("Bearer realm=\"gatehouse\", error=\"{error}\", error_description=\"{escaped}\"")
}
