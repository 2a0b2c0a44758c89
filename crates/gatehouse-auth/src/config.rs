//! Gate configuration.
//!
//! Configuration for token signing and lifetimes, OAuth2 login
//! completion (redirect targets, refresh-token cookie) and external
//! identity providers. All sections deserialize with defaults so a
//! minimal TOML file only needs to override the signing secret.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "https://gate.example.com"
//! secret = "change-me-to-a-long-random-value-123456"
//!
//! [auth.tokens]
//! access_token_lifetime = "1h"
//! refresh_token_lifetime = "7d"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL placed into the token `iss` claim and required back on
    /// verification. Typically the public base URL of the service.
    pub issuer: String,

    /// HMAC signing secret for access tokens. Must be long and random;
    /// anyone holding it can forge tokens.
    pub secret: String,

    /// Token lifetimes and rotation behavior.
    pub tokens: TokenSettings,

    /// Redirect targets for OAuth2 login completion.
    pub redirect: RedirectConfig,

    /// Refresh-token cookie settings.
    pub cookie: CookieConfig,

    /// External identity providers, keyed by `id` in the login routes.
    pub providers: Vec<IdentityProviderConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            secret: String::new(),
            tokens: TokenSettings::default(),
            redirect: RedirectConfig::default(),
            cookie: CookieConfig::default(),
            providers: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::invalid("auth.issuer must not be empty"));
        }
        if self.secret.len() < 32 {
            return Err(ConfigError::invalid(
                "auth.secret must be at least 32 bytes",
            ));
        }
        if self.tokens.access_token_lifetime.is_zero()
            || self.tokens.refresh_token_lifetime.is_zero()
        {
            return Err(ConfigError::invalid("auth.tokens lifetimes must be > 0"));
        }
        if self.tokens.refresh_token_lifetime <= self.tokens.access_token_lifetime {
            return Err(ConfigError::invalid(
                "auth.tokens.refresh_token_lifetime must exceed access_token_lifetime",
            ));
        }
        for provider in &self.providers {
            provider.validate()?;
        }
        Ok(())
    }
}

/// Token lifetimes and refresh rotation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Access token lifetime. Shorter is safer but refreshes more often.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Rotate the refresh token on every refresh. The stored record is
    /// replaced, so a superseded token is unusable immediately.
    pub refresh_token_rotation: bool,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(3600), // 1 hour
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 3600), // 7 days
            refresh_token_rotation: true,
        }
    }
}

/// Redirect targets for OAuth2 login completion.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Where a successful login lands when the client did not ask for a
    /// specific destination.
    pub success_uri: String,

    /// Where a failed login lands. Receives an `error` query parameter.
    pub failure_uri: String,

    /// Client-supplied post-login destinations that may override
    /// `success_uri`. Anything not on this list is ignored.
    pub authorized_redirects: Vec<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            success_uri: "/".to_string(),
            failure_uri: "/login/error".to_string(),
            authorized_redirects: Vec::new(),
        }
    }
}

impl RedirectConfig {
    /// Returns `true` if the client-supplied destination is allow-listed.
    #[must_use]
    pub fn is_authorized(&self, uri: &str) -> bool {
        self.authorized_redirects.iter().any(|allowed| allowed == uri)
    }
}

/// Refresh-token cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Send only over HTTPS.
    pub secure: bool,

    /// Hide from client-side scripts.
    pub http_only: bool,

    /// `SameSite` attribute: "strict", "lax" or "none".
    pub same_site: String,

    /// Cookie path.
    pub path: String,

    /// Optional cookie domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "gatehouse_refresh".to_string(),
            secure: true,
            http_only: true,
            same_site: "lax".to_string(),
            path: "/".to_string(),
            domain: None,
        }
    }
}

impl CookieConfig {
    /// Builds a `Set-Cookie` header value for the given token value.
    #[must_use]
    pub fn build_cookie(&self, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path={}",
            self.name, value, max_age_secs, self.path
        );
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        match self.same_site.to_ascii_lowercase().as_str() {
            "strict" => cookie.push_str("; SameSite=Strict"),
            "none" => cookie.push_str("; SameSite=None"),
            _ => cookie.push_str("; SameSite=Lax"),
        }
        cookie
    }

    /// Builds a `Set-Cookie` header value that removes the cookie.
    #[must_use]
    pub fn clear_cookie(&self) -> String {
        self.build_cookie("", 0)
    }
}

/// Configuration for an external identity provider.
///
/// Represents an OAuth2/OIDC-compatible provider used for third-party
/// login. Provider-specific negotiation stays behind the
/// [`IdentityProvider`](crate::oauth::IdentityProvider) trait; this
/// config carries only the generic endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    /// Unique identifier used in login paths (e.g. "google").
    pub id: String,

    /// Human-readable name for display and logs.
    pub name: String,

    /// OAuth client ID registered with the provider.
    pub client_id: String,

    /// OAuth client secret (None for public clients).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Provider authorization endpoint.
    pub authorization_endpoint: String,

    /// Provider token endpoint.
    pub token_endpoint: String,

    /// Provider userinfo endpoint.
    pub userinfo_endpoint: String,

    /// OAuth scopes to request (default: ["openid"]).
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Whether this provider is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string()]
}

fn default_true() -> bool {
    true
}

impl IdentityProviderConfig {
    /// Creates a provider configuration with required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        client_id: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        userinfo_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            client_id: client_id.into(),
            client_secret: None,
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            userinfo_endpoint: userinfo_endpoint.into(),
            scopes: default_scopes(),
            enabled: true,
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<impl Into<String>>) -> Self {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.id.is_empty() || self.client_id.is_empty() {
            return Err(ConfigError::invalid(
                "provider id and client_id must not be empty",
            ));
        }
        for (field, value) in [
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
            ("userinfo_endpoint", &self.userinfo_endpoint),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::invalid(format!(
                    "provider '{}' has an invalid {field}: '{value}'",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Errors produced by configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value failed validation.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of the invalid value.
        message: String,
    },
}

impl ConfigError {
    /// Creates a new `Invalid` error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
