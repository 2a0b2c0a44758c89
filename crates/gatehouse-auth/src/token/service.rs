//! Token issuance, verification and refresh.

use std::sync::Arc;

use crate::AuthResult;
use crate::config::TokenSettings;
use crate::error::AuthError;
use crate::storage::RefreshTokenStore;
use crate::token::jwt::{JwtError, JwtSigner};
use crate::types::{AccessTokenClaims, Principal, RefreshTokenRecord, TokenPair};

/// Issues and verifies access tokens and manages refresh tokens.
///
/// Stateless apart from the credential store: verification is a pure
/// function of token, key and clock.
pub struct TokenService {
    signer: Arc<JwtSigner>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    settings: TokenSettings,
}

impl TokenService {
    /// Creates a token service.
    #[must_use]
    pub fn new(
        signer: Arc<JwtSigner>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        settings: TokenSettings,
    ) -> Self {
        Self {
            signer,
            refresh_store,
            settings,
        }
    }

    /// Issues a signed, time-bounded access token for a principal.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_access_token(&self, principal: &Principal) -> AuthResult<String> {
        let claims = AccessTokenClaims::new(
            self.signer.issuer(),
            principal,
            self.access_lifetime_secs(),
        );
        self.signer
            .encode(&claims)
            .map_err(|e| AuthError::internal(format!("token encoding failed: {e}")))
    }

    /// Issues a refresh token for a user and persists its record.
    ///
    /// The store replaces any existing record for the user, so the
    /// previously issued refresh token stops working immediately.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn issue_refresh_token(&self, user_id: &str) -> AuthResult<String> {
        let token = RefreshTokenRecord::generate_token();
        let lifetime = time::Duration::seconds(self.refresh_lifetime_secs());
        let record = RefreshTokenRecord::new(user_id, &token, lifetime);
        self.refresh_store.put(record).await?;
        Ok(token)
    }

    /// Issues an access/refresh token pair.
    ///
    /// # Errors
    /// Returns an error if encoding fails or the store is unavailable.
    pub async fn issue_token_pair(&self, principal: &Principal) -> AuthResult<TokenPair> {
        let access_token = self.issue_access_token(principal)?;
        let refresh_token = self.issue_refresh_token(&principal.user_id).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_lifetime_secs(),
        })
    }

    /// Verifies an access token and returns the principal it encodes.
    ///
    /// # Errors
    /// Fails with [`AuthError::TokenExpired`] past the validity window,
    /// [`AuthError::InvalidToken`] for malformed tokens or bad
    /// signatures, and [`AuthError::UnknownSubject`] when the claims do
    /// not resolve to a principal. Never panics on garbage input.
    pub fn verify(&self, token: &str) -> AuthResult<Principal> {
        let decoded = self
            .signer
            .decode::<AccessTokenClaims>(token)
            .map_err(map_jwt_error)?;
        Principal::try_from(decoded.claims)
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// The (possibly expired) access token identifies the subject; the
    /// refresh token must match the user's stored record. With rotation
    /// enabled the record is replaced, invalidating the presented
    /// refresh token; otherwise the old refresh token is returned again.
    ///
    /// # Errors
    /// Fails with [`AuthError::InvalidGrant`] when the refresh token is
    /// unknown, superseded or expired, and with the usual verification
    /// errors when the access token is not ours.
    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> AuthResult<TokenPair> {
        let decoded = self
            .signer
            .decode_allow_expired::<AccessTokenClaims>(access_token)
            .map_err(map_jwt_error)?;
        let principal = Principal::try_from(decoded.claims)?;

        let hash = RefreshTokenRecord::hash_token(refresh_token);
        let record = self
            .refresh_store
            .find_by_user_and_hash(&principal.user_id, &hash)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("refresh token not recognized"))?;

        if !record.is_valid() {
            return Err(AuthError::invalid_grant("refresh token expired"));
        }

        let access_token = self.issue_access_token(&principal)?;
        let refresh_token = if self.settings.refresh_token_rotation {
            self.issue_refresh_token(&principal.user_id).await?
        } else {
            refresh_token.to_string()
        };

        tracing::debug!(user_id = %principal.user_id, "refresh token exchanged");

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_lifetime_secs(),
        })
    }

    /// Revokes a user's refresh token (logout).
    ///
    /// Returns `true` if a record existed.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn revoke(&self, user_id: &str) -> AuthResult<bool> {
        let removed = self.refresh_store.remove_by_user(user_id).await?;
        if removed {
            tracing::debug!(user_id = %user_id, "refresh token revoked");
        }
        Ok(removed)
    }

    /// Returns the configured access-token lifetime in seconds.
    #[must_use]
    pub fn access_lifetime_secs(&self) -> i64 {
        self.settings.access_token_lifetime.as_secs() as i64
    }

    /// Returns the configured refresh-token lifetime in seconds.
    #[must_use]
    pub fn refresh_lifetime_secs(&self) -> i64 {
        self.settings.refresh_token_lifetime.as_secs() as i64
    }
}

fn map_jwt_error(err: JwtError) -> AuthError {
    match err {
        JwtError::Expired => AuthError::TokenExpired,
        other => AuthError::invalid_token(other.to_string()),
    }
}
