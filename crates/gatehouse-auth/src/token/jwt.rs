//! JWT signing and verification.
//!
//! HMAC-SHA256 over a configured secret: the token is a pure function of
//! claims, timestamp and key, and cannot be forged without the secret.
//! All failure paths return a typed [`JwtError`]; attacker-supplied
//! garbage never panics.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token does not decode (malformed structure or payload).
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of why the token is malformed.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature does not match.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid (wrong issuer, missing claim).
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why the claims are invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            _ => Self::malformed(err.to_string()),
        }
    }
}

/// Signs and verifies JWT tokens with a shared secret.
///
/// Thread-safe (`Send + Sync`); share it across tasks behind an `Arc`.
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtSigner {
    /// Seconds of clock skew tolerated when validating `exp`.
    const LEEWAY_SECS: u64 = 30;

    /// Creates a signer from a secret and the issuer claim value.
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Encodes claims into a signed token.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a token (signature, issuer, expiry).
    ///
    /// # Errors
    /// Returns a typed error when the token is malformed, the signature
    /// does not match, the issuer differs or the expiry has passed.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        decode(token, &self.decoding_key, &self.validation(true)).map_err(JwtError::from)
    }

    /// Decodes a token without validating expiration.
    ///
    /// The signature and issuer are still validated. Used by the refresh
    /// exchange, which must accept the expired access token it renews.
    ///
    /// # Errors
    /// Returns a typed error when the token is malformed, the signature
    /// does not match or the issuer differs.
    pub fn decode_allow_expired<T: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<TokenData<T>, JwtError> {
        decode(token, &self.decoding_key, &self.validation(false)).map_err(JwtError::from)
    }

    /// Returns the issuer claim value.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = validate_exp;
        validation.validate_aud = false;
        validation.leeway = Self::LEEWAY_SECS;
        validation
    }
}
