use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{any, delete, get, post},
};
use gatehouse_auth::http::{callback_handler, login_handler, logout_handler, refresh_handler};
use gatehouse_auth::middleware::{authenticate, enforce};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, CorsConfig};
use crate::context::AppState;
use crate::handlers;

pub struct GatehouseServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the router with the explicit middleware list.
///
/// Runtime order: trace -> timeout -> CORS -> authenticate -> policy ->
/// routes. CORS sits outside the gate so preflight probes are answered
/// before authentication; each gate stage can short-circuit with a
/// terminal response.
pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    Router::new()
        // Public surface
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        // Token lifecycle
        .route("/api/v1/auth/refresh", any(refresh_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        // OAuth2 login
        .route("/oauth2/authorization/{provider}", get(login_handler))
        .route("/login/oauth2/code/{provider}", get(callback_handler))
        // Application API
        .route("/api/v1/profile", get(handlers::profile))
        .route("/api/v1/admin/tokens/{user_id}", delete(handlers::revoke_tokens))
        .with_state(state.clone())
        // Middleware: layers added later run earlier on the request path
        .layer(axum::extract::DefaultBodyLimit::max(cfg.server.body_limit_bytes))
        .layer(from_fn_with_state(state.policy.clone(), enforce))
        .layer(from_fn_with_state(state.auth.clone(), authenticate))
        .layer(cors_layer(&cfg.cors))
        .layer(TimeoutLayer::new(Duration::from_millis(
            cfg.server.request_timeout_ms,
        )))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
}

/// Builds the CORS layer from the configured allow-lists.
///
/// Credentials are allowed, so a `"*"` origin mirrors the request origin
/// instead of sending a literal wildcard (which browsers reject in
/// credentialed requests).
fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let methods: Vec<Method> = cfg
        .allowed_methods
        .iter()
        .filter_map(|m| match Method::from_bytes(m.as_bytes()) {
            Ok(method) => Some(method),
            Err(_) => {
                tracing::warn!(method = %m, "ignoring invalid CORS method");
                None
            }
        })
        .collect();

    let headers: Vec<HeaderName> = cfg
        .allowed_headers
        .iter()
        .filter_map(|h| match HeaderName::from_bytes(h.as_bytes()) {
            Ok(header) => Some(header),
            Err(_) => {
                tracing::warn!(header = %h, "ignoring invalid CORS header");
                None
            }
        })
        .collect();

    let mut layer = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers(headers)
        .max_age(Duration::from_secs(cfg.max_age_secs));

    if cfg.allowed_origins.iter().any(|origin| origin == "*") {
        layer = layer.allow_origin(AllowOrigin::mirror_request());
    } else {
        let origins: Vec<HeaderValue> = cfg
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer = layer.allow_origin(origins);
    }

    if cfg.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    layer
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<GatehouseServer> {
        let state = AppState::from_config(&self.config)?;
        let app = build_app(&self.config, state);

        Ok(GatehouseServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GatehouseServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
