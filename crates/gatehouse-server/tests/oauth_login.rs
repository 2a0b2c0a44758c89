//! OAuth2 login initiation and completion through the HTTP surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gatehouse_auth::error::AuthError;
use gatehouse_auth::oauth::{
    AUTH_REQUEST_COOKIE, AuthorizationRequest, IdentityProvider, ProviderRegistry,
};
use gatehouse_auth::storage::StaticUserDirectory;
use gatehouse_auth::types::{Authority, ExternalIdentity};
use gatehouse_auth::{AuthResult, TokenPair};
use gatehouse_server::config::AppConfig;
use gatehouse_server::{AppState, build_app};
use tower::ServiceExt;

/// Provider stub: `code=good` confirms an identity, anything else fails.
struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    fn id(&self) -> &str {
        "stub"
    }

    fn authorize_url(&self, state: &str, redirect_uri: &str) -> AuthResult<String> {
        Ok(format!(
            "https://idp.example.com/authorize?state={state}&redirect_uri={redirect_uri}"
        ))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> AuthResult<ExternalIdentity> {
        if code == "good" {
            Ok(ExternalIdentity {
                subject: "external-user-1".to_string(),
                email: Some("user@example.com".to_string()),
                display_name: None,
            })
        } else {
            Err(AuthError::oauth_exchange("stub", "code rejected"))
        }
    }
}

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.secret = "oauth-login-test-secret-012345678".to_string();
    cfg.auth.issuer = "http://gate.test".to_string();
    cfg.auth.redirect.success_uri = "/welcome".to_string();
    cfg.auth.redirect.failure_uri = "/login/error".to_string();
    cfg
}

fn test_app(cfg: &AppConfig) -> (Router, AppState) {
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(StubProvider));

    let directory =
        StaticUserDirectory::default().with_subject("external-user-1", vec![Authority::User]);

    let state = AppState::from_parts(&cfg.auth, Arc::new(directory), Arc::new(providers)).unwrap();
    (build_app(cfg, state.clone()), state)
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn initiation_sets_state_cookie_and_redirects_to_provider() {
    let cfg = test_config();
    let (app, _) = test_app(&cfg);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/oauth2/authorization/stub")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);

    let target = location(&response);
    assert!(target.starts_with("https://idp.example.com/authorize?state="));
    assert!(target.contains("/login/oauth2/code/stub"));

    let cookies = set_cookies(&response);
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with(AUTH_REQUEST_COOKIE) && c.contains("HttpOnly"))
    );
}

#[tokio::test]
async fn initiation_rejects_unknown_providers() {
    let cfg = test_config();
    let (app, _) = test_app(&cfg);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/oauth2/authorization/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn successful_callback_issues_tokens_and_redirects() {
    let cfg = test_config();
    let (app, state) = test_app(&cfg);

    let pending = AuthorizationRequest::new(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/login/oauth2/code/stub?code=good&state={}",
                    pending.state
                ))
                .header(
                    header::COOKIE,
                    format!("{AUTH_REQUEST_COOKIE}={}", pending.encode()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);

    // Redirect carries the access token
    let target = location(&response);
    assert!(target.starts_with("/welcome?token="));
    let access_token = target.split("token=").nth(1).unwrap();
    let principal = state.token_service().verify(access_token).unwrap();
    assert_eq!(principal.user_id, "external-user-1");
    assert!(principal.has_authority(Authority::User));

    // Transient state cleared, refresh cookie set
    let cookies = set_cookies(&response);
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with(&format!("{AUTH_REQUEST_COOKIE}=;")) && c.contains("Max-Age=0"))
    );
    let refresh_cookie = cookies
        .iter()
        .find(|c| c.starts_with("gatehouse_refresh="))
        .expect("refresh cookie set");
    let refresh_token = refresh_cookie
        .split(';')
        .next()
        .unwrap()
        .split('=')
        .nth(1)
        .unwrap();

    // The persisted refresh token is usable for an exchange
    let pair: TokenPair = state
        .token_service()
        .refresh(access_token, refresh_token)
        .await
        .unwrap();
    assert_eq!(
        state.token_service().verify(&pair.access_token).unwrap().user_id,
        "external-user-1"
    );
}

#[tokio::test]
async fn state_mismatch_fails_without_tokens() {
    let cfg = test_config();
    let (app, _) = test_app(&cfg);

    let pending = AuthorizationRequest::new(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/login/oauth2/code/stub?code=good&state=wrong-state")
                .header(
                    header::COOKIE,
                    format!("{AUTH_REQUEST_COOKIE}={}", pending.encode()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login/error?error=invalid_state");

    // Transient state is cleared and no refresh cookie appears
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.contains("Max-Age=0")));
    assert!(!cookies.iter().any(|c| c.starts_with("gatehouse_refresh=")));
}

#[tokio::test]
async fn missing_state_cookie_fails() {
    let cfg = test_config();
    let (app, _) = test_app(&cfg);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login/oauth2/code/stub?code=good&state=anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login/error?error=invalid_state");
}

#[tokio::test]
async fn provider_error_redirects_to_failure_destination() {
    let cfg = test_config();
    let (app, _) = test_app(&cfg);

    let pending = AuthorizationRequest::new(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/login/oauth2/code/stub?error=access_denied&state={}",
                    pending.state
                ))
                .header(
                    header::COOKIE,
                    format!("{AUTH_REQUEST_COOKIE}={}", pending.encode()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login/error?error=access_denied");
}

#[tokio::test]
async fn failed_exchange_redirects_without_tokens() {
    let cfg = test_config();
    let (app, _) = test_app(&cfg);

    let pending = AuthorizationRequest::new(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/login/oauth2/code/stub?code=bad&state={}",
                    pending.state
                ))
                .header(
                    header::COOKIE,
                    format!("{AUTH_REQUEST_COOKIE}={}", pending.encode()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login/error?error=exchange_failed");
    assert!(!set_cookies(&response).iter().any(|c| c.starts_with("gatehouse_refresh=")));
}

#[tokio::test]
async fn allow_listed_redirect_destination_is_honored() {
    let mut cfg = test_config();
    cfg.auth.redirect.authorized_redirects = vec!["/app/home".to_string()];
    let (app, _) = test_app(&cfg);

    let pending = AuthorizationRequest::new(Some("/app/home".to_string()));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/login/oauth2/code/stub?code=good&state={}",
                    pending.state
                ))
                .header(
                    header::COOKIE,
                    format!("{AUTH_REQUEST_COOKIE}={}", pending.encode()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/app/home?token="));
}
