//! Application state, composed once at startup.
//!
//! There is no ambient registry: every collaborator is constructed here
//! in dependency order (credential store, signer, token service, user
//! directory, provider registry, policy table) and handed to the
//! middleware and handlers by reference.

use std::sync::Arc;

use axum::extract::FromRef;
use gatehouse_auth::http::{LoginState, RefreshState};
use gatehouse_auth::middleware::{AuthState, PolicyState};
use gatehouse_auth::oauth::ProviderRegistry;
use gatehouse_auth::policy::{AccessPolicy, PatternError};
use gatehouse_auth::storage::{InMemoryRefreshTokenStore, UserDirectory};
use gatehouse_auth::token::{JwtSigner, TokenService};
use gatehouse_auth::types::Authority;
use gatehouse_auth::{AuthConfig, StaticUserDirectory};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Authentication middleware state.
    pub auth: AuthState,

    /// Policy middleware state.
    pub policy: PolicyState,

    /// Refresh/logout endpoint state.
    pub refresh: RefreshState,

    /// OAuth2 login endpoint state.
    pub login: LoginState,
}

impl AppState {
    /// Composes the gate from configuration.
    ///
    /// # Errors
    /// Fails when a policy pattern does not compile.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let directory = Arc::new(StaticUserDirectory::default());
        let providers = Arc::new(ProviderRegistry::from_config(
            &cfg.auth.providers,
            reqwest::Client::new(),
        ));
        Ok(Self::from_parts(&cfg.auth, directory, providers)?)
    }

    /// Composes the gate from pre-built collaborators.
    ///
    /// Tests use this to inject stub providers and directories.
    ///
    /// # Errors
    /// Fails when a policy pattern does not compile.
    pub fn from_parts(
        auth_cfg: &AuthConfig,
        directory: Arc<dyn UserDirectory>,
        providers: Arc<ProviderRegistry>,
    ) -> Result<Self, PatternError> {
        // Dependency order: store -> signer -> token service -> states
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let signer = Arc::new(JwtSigner::new(&auth_cfg.secret, &auth_cfg.issuer));
        let token_service = Arc::new(TokenService::new(signer, store, auth_cfg.tokens.clone()));
        let policy = Arc::new(gate_policy()?);

        Ok(Self {
            auth: AuthState::new(token_service.clone()),
            policy: PolicyState::new(policy),
            refresh: RefreshState::new(token_service.clone()),
            login: LoginState {
                providers,
                directory,
                token_service,
                redirect: auth_cfg.redirect.clone(),
                cookie: auth_cfg.cookie.clone(),
                public_url: auth_cfg.issuer.clone(),
            },
        })
    }

    /// The token service shared by every gate component.
    #[must_use]
    pub fn token_service(&self) -> &Arc<TokenService> {
        &self.auth.token_service
    }
}

/// The gate's authorization table.
///
/// First match wins, so the specific admin/host subtrees come before the
/// general API rule they nest under. Paths no rule matches fall back to
/// requiring an authenticated principal.
pub fn gate_policy() -> Result<AccessPolicy, PatternError> {
    AccessPolicy::builder()
        .permit("/")
        .permit("/healthz")
        .permit("/api/v1/auth/refresh")
        .authority("/api/**/admin/**", Authority::Admin)
        .authority("/api/**/host/**", Authority::Host)
        .authority("/api/**", Authority::User)
        .permit("/oauth2/authorization/*")
        .permit("/*/oauth2/code/*")
        .build()
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for PolicyState {
    fn from_ref(state: &AppState) -> Self {
        state.policy.clone()
    }
}

impl FromRef<AppState> for RefreshState {
    fn from_ref(state: &AppState) -> Self {
        state.refresh.clone()
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        state.login.clone()
    }
}
