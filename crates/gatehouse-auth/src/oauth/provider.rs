//! External identity providers.
//!
//! Provider-specific negotiation is out of scope for the gate; the only
//! contract that matters here is "exchange an authorization code for a
//! confirmed identity". [`OidcProvider`] implements the generic
//! code → token → userinfo flow against configured endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::AuthResult;
use crate::config::IdentityProviderConfig;
use crate::error::AuthError;
use crate::types::ExternalIdentity;

/// A third-party identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider id as used in login paths.
    fn id(&self) -> &str;

    /// Builds the provider authorization URL for a login attempt.
    ///
    /// # Errors
    /// Returns an error if the configured endpoint is not a valid URL.
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> AuthResult<String>;

    /// Exchanges an authorization code for a confirmed identity.
    ///
    /// # Errors
    /// Returns [`AuthError::OAuthExchange`] when the provider rejects
    /// the code or the responses do not parse.
    async fn exchange_code(&self, code: &str, redirect_uri: &str)
    -> AuthResult<ExternalIdentity>;
}

/// OIDC-style provider speaking the generic authorization-code flow.
pub struct OidcProvider {
    config: IdentityProviderConfig,
    http: reqwest::Client,
}

impl OidcProvider {
    /// Creates a provider from its configuration.
    #[must_use]
    pub fn new(config: IdentityProviderConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn exchange_error(&self, message: impl Into<String>) -> AuthError {
        AuthError::oauth_exchange(&self.config.id, message)
    }
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn authorize_url(&self, state: &str, redirect_uri: &str) -> AuthResult<String> {
        let mut url = url::Url::parse(&self.config.authorization_endpoint)
            .map_err(|e| self.exchange_error(format!("invalid authorization endpoint: {e}")))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> AuthResult<ExternalIdentity> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.exchange_error(format!("token endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(self.exchange_error(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| self.exchange_error(format!("token response did not parse: {e}")))?;

        let response = self
            .http
            .get(&self.config.userinfo_endpoint)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| self.exchange_error(format!("userinfo endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(self.exchange_error(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        let info: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| self.exchange_error(format!("userinfo response did not parse: {e}")))?;

        tracing::debug!(provider = %self.config.id, subject = %info.sub, "identity confirmed");

        Ok(ExternalIdentity {
            subject: info.sub,
            email: info.email,
            display_name: info.name,
        })
    }
}

/// Enabled providers keyed by id.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from configuration, skipping disabled entries.
    #[must_use]
    pub fn from_config(configs: &[IdentityProviderConfig], http: reqwest::Client) -> Self {
        let mut registry = Self::new();
        for config in configs.iter().filter(|c| c.enabled) {
            registry.register(Arc::new(OidcProvider::new(config.clone(), http.clone())));
        }
        registry
    }

    /// Registers a provider, replacing any previous one with the same id.
    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Looks up a provider by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(id).cloned()
    }

    /// Returns the number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_config(base: &str) -> IdentityProviderConfig {
        IdentityProviderConfig::new(
            "test-idp",
            "Test IdP",
            "client-123",
            format!("{base}/authorize"),
            format!("{base}/token"),
            format!("{base}/userinfo"),
        )
        .with_client_secret("secret-456")
    }

    #[test]
    fn test_authorize_url_carries_flow_parameters() {
        let provider = OidcProvider::new(
            provider_config("https://idp.example.com"),
            reqwest::Client::new(),
        );

        let url = provider
            .authorize_url("state-abc", "https://gate.example.com/login/oauth2/code/test-idp")
            .unwrap();

        assert!(url.starts_with("https://idp.example.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=state-abc"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fgate.example.com"));
    }

    #[tokio::test]
    async fn test_exchange_code_yields_identity() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=code-789"))
            .and(body_string_contains("client_secret=secret-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "idp-access-token",
                "token_type": "Bearer",
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "external-user-1",
                "email": "user@example.com",
                "name": "Example User",
            })))
            .mount(&server)
            .await;

        let provider =
            OidcProvider::new(provider_config(&server.uri()), reqwest::Client::new());

        let identity = provider
            .exchange_code("code-789", "https://gate.example.com/cb")
            .await
            .unwrap();

        assert_eq!(identity.subject, "external-user-1");
        assert_eq!(identity.email.as_deref(), Some("user@example.com"));
        assert_eq!(identity.display_name.as_deref(), Some("Example User"));
    }

    #[tokio::test]
    async fn test_exchange_code_rejected_by_provider() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
            })))
            .mount(&server)
            .await;

        let provider =
            OidcProvider::new(provider_config(&server.uri()), reqwest::Client::new());

        let err = provider
            .exchange_code("expired-code", "https://gate.example.com/cb")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthExchange { .. }));
    }

    #[test]
    fn test_registry_skips_disabled_providers() {
        let mut disabled = provider_config("https://idp.example.com");
        disabled.enabled = false;
        let enabled = provider_config("https://other.example.com");

        let registry = ProviderRegistry::from_config(
            &[disabled, enabled.clone()],
            reqwest::Client::new(),
        );

        // Both configs share the id, so the enabled one is the only entry
        assert_eq!(registry.len(), 1);
        assert!(registry.get("test-idp").is_some());
        assert!(registry.get("unknown").is_none());
    }
}
