//! Authentication and authorization error types.
//!
//! Every failure path in the gate resolves to one of these variants. No
//! exception crosses into application handlers: by the time a request
//! reaches one, it either carries an authorized principal or the gate
//! has already produced a terminal response from this taxonomy.

use std::fmt;

/// Errors that can occur while authenticating or authorizing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request presented no credential on a path that requires one.
    ///
    /// A missing credential is not an error while the request is still
    /// inside the authentication filter; it becomes this variant only
    /// when the policy table requires an authenticated principal.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The access token is malformed or its signature does not verify.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The access token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token verified but its subject or authority claims cannot be
    /// resolved to a known principal.
    #[error("Unknown subject: {subject}")]
    UnknownSubject {
        /// The unresolvable subject value.
        subject: String,
    },

    /// The authenticated principal lacks the authority a path requires.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// The refresh-token exchange was rejected (unknown, superseded or
    /// expired refresh token).
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The request itself is malformed (missing parameters, bad JSON).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The third-party login flow aborted before yielding an identity.
    #[error("OAuth exchange failed: {provider} - {message}")]
    OAuthExchange {
        /// The identity provider id.
        provider: String,
        /// Description of the failure.
        message: String,
    },

    /// The credential store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The gate configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownSubject` error.
    #[must_use]
    pub fn unknown_subject(subject: impl Into<String>) -> Self {
        Self::UnknownSubject {
            subject: subject.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `OAuthExchange` error.
    #[must_use]
    pub fn oauth_exchange(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OAuthExchange {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an authentication error (identity could
    /// not be established).
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::InvalidToken { .. }
                | Self::TokenExpired
                | Self::UnknownSubject { .. }
        )
    }

    /// Returns `true` if this is an authorization error (identity known,
    /// access denied).
    #[must_use]
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.is_authentication_error()
            || self.is_authorization_error()
            || matches!(self, Self::InvalidGrant { .. } | Self::InvalidRequest { .. })
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
                | Self::OAuthExchange { .. }
        )
    }

    /// Returns the error category for logging and monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::InvalidToken { .. } | Self::TokenExpired | Self::UnknownSubject { .. } => {
                ErrorCategory::Token
            }
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::InvalidGrant { .. } | Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::OAuthExchange { .. } => ErrorCategory::Federation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error (RFC 6749).
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidToken { .. } | Self::TokenExpired | Self::UnknownSubject { .. } => {
                "invalid_token"
            }
            Self::Forbidden { .. } => "access_denied",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::OAuthExchange { .. }
            | Self::Storage { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of gate errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity could not be established.
    Authentication,
    /// Identity known, permission denied.
    Authorization,
    /// Token validation failures.
    Token,
    /// Request or grant validation failures.
    Validation,
    /// Third-party identity provider failures.
    Federation,
    /// Credential store failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Federation => write!(f, "federation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::unauthorized("no credential presented");
        assert_eq!(err.to_string(), "Unauthorized: no credential presented");

        let err = AuthError::TokenExpired;
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::unknown_subject("???");
        assert_eq!(err.to_string(), "Unknown subject: ???");

        let err = AuthError::oauth_exchange("google", "state mismatch");
        assert_eq!(
            err.to_string(),
            "OAuth exchange failed: google - state mismatch"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_token("garbage");
        assert!(err.is_authentication_error());
        assert!(!err.is_authorization_error());
        assert!(err.is_client_error());

        let err = AuthError::forbidden("missing admin authority");
        assert!(!err.is_authentication_error());
        assert!(err.is_authorization_error());
        assert!(err.is_client_error());

        let err = AuthError::storage("store unavailable");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());

        let err = AuthError::invalid_grant("refresh token superseded");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::unauthorized("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(AuthError::TokenExpired.category(), ErrorCategory::Token);
        assert_eq!(
            AuthError::forbidden("x").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            AuthError::oauth_exchange("p", "x").category(),
            ErrorCategory::Federation
        );
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(AuthError::TokenExpired.oauth_error_code(), "invalid_token");
        assert_eq!(
            AuthError::invalid_token("x").oauth_error_code(),
            "invalid_token"
        );
        assert_eq!(AuthError::forbidden("x").oauth_error_code(), "access_denied");
        assert_eq!(
            AuthError::invalid_grant("x").oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(AuthError::internal("x").oauth_error_code(), "server_error");
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::Authorization.to_string(), "authorization");
        assert_eq!(ErrorCategory::Token.to_string(), "token");
        assert_eq!(ErrorCategory::Federation.to_string(), "federation");
    }
}
