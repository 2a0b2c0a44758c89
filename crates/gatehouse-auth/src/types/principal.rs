//! Principals, token claims and issued token pairs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;
use crate::types::authority::Authority;

/// Claims carried by an access token.
///
/// Signed and time-bounded; the token is a pure function of these
/// claims, the issue timestamp and the signing key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer (the gate's public URL).
    pub iss: String,

    /// Subject (user identifier).
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// JWT ID (unique identifier of this token).
    pub jti: String,

    /// Authority tags held by the subject.
    pub authorities: Vec<String>,
}

impl AccessTokenClaims {
    /// Creates claims for a principal, expiring `lifetime_secs` from now.
    #[must_use]
    pub fn new(issuer: impl Into<String>, principal: &Principal, lifetime_secs: i64) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: principal.user_id.clone(),
            exp: now + lifetime_secs,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
            authorities: principal
                .authorities
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
        }
    }
}

/// Authenticated identity bound to a single request.
///
/// Derived from verified token claims, carried in the request's
/// extensions and discarded when the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Subject identifier from the token.
    pub user_id: String,

    /// Authority tags held by the subject.
    pub authorities: Vec<Authority>,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(user_id: impl Into<String>, authorities: Vec<Authority>) -> Self {
        Self {
            user_id: user_id.into(),
            authorities,
        }
    }

    /// Returns `true` if the principal holds the given authority.
    #[must_use]
    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }
}

impl TryFrom<AccessTokenClaims> for Principal {
    type Error = AuthError;

    /// Builds a principal from verified claims.
    ///
    /// Fails with [`AuthError::UnknownSubject`] when the subject is empty
    /// or an authority tag does not resolve.
    fn try_from(claims: AccessTokenClaims) -> Result<Self, Self::Error> {
        if claims.sub.is_empty() {
            return Err(AuthError::unknown_subject("<empty>"));
        }
        let authorities = claims
            .authorities
            .iter()
            .map(|tag| {
                Authority::parse(tag).ok_or_else(|| AuthError::unknown_subject(&claims.sub))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            user_id: claims.sub,
            authorities,
        })
    }
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,

    /// Opaque refresh token. Only the hash is persisted server-side.
    pub refresh_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Identity confirmed by a third-party provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider-scoped subject identifier.
    pub subject: String,

    /// Email address, if the provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name, if the provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}
