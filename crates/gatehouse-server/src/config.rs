//! Server configuration: TOML file plus `GATEHOUSE__*` env overrides.

use gatehouse_auth::config::AuthConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Authentication gate configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be > 0".into());
        }
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(format!("server.host is not an IP address: {}", self.server.host));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.cors.allowed_origins.is_empty() {
            return Err("cors.allowed_origins must not be empty".into());
        }
        self.auth.validate().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Returns the listener address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        let ip = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Per-request deadline in milliseconds. Covers the gate's store
    /// reads and signature checks as well as the handler itself.
    pub request_timeout_ms: u64,

    /// Maximum request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_ms: 30_000,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level (overridden by `RUST_LOG` when set).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Cross-origin policy, applied to all paths.
///
/// The allow-lists are externally supplied; credentials are allowed by
/// default, so a `"*"` origin mirrors the request origin instead of
/// sending a literal wildcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins, or `["*"]` to mirror any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed request headers.
    pub allowed_headers: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Whether to allow credentials.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_headers: vec![
                "content-type".to_string(),
                "authorization".to_string(),
                "accept".to_string(),
                "origin".to_string(),
            ],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "PATCH".to_string(),
                "OPTIONS".to_string(),
            ],
            allow_credentials: true,
            max_age_secs: 3600,
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Loads and validates the configuration.
    ///
    /// Sources, later wins: the TOML file (when it exists), then
    /// environment overrides like `GATEHOUSE__SERVER__PORT=9090`.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("gatehouse.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        builder = builder.add_source(
            Environment::with_prefix("GATEHOUSE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
