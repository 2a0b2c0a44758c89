use std::{env, fs};

use gatehouse_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("gatehouse.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
request_timeout_ms = 1000
body_limit_bytes = 1024

[logging]
level = "debug"

[cors]
allowed_origins = ["https://app.example.com"]
allow_credentials = true

[auth]
issuer = "https://gate.example.com"
secret = "0123456789abcdef0123456789abcdef"

[auth.tokens]
access_token_lifetime = "30m"
refresh_token_lifetime = "14d"
refresh_token_rotation = true
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");
    assert_eq!(cfg.cors.allowed_origins, vec!["https://app.example.com"]);
    assert_eq!(cfg.auth.issuer, "https://gate.example.com");
    assert_eq!(cfg.auth.tokens.access_token_lifetime.as_secs(), 1800);
    assert_eq!(
        cfg.auth.tokens.refresh_token_lifetime.as_secs(),
        14 * 24 * 3600
    );

    // 2) Env override should win over file
    unsafe {
        env::set_var("GATEHOUSE__SERVER__PORT", "9090");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    // cleanup env var
    unsafe {
        env::remove_var("GATEHOUSE__SERVER__PORT");
    }

    // 3) Invalid config (refresh lifetime not exceeding access) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[auth]
issuer = "https://gate.example.com"
secret = "0123456789abcdef0123456789abcdef"

[auth.tokens]
access_token_lifetime = "2h"
refresh_token_lifetime = "1h"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("refresh_token_lifetime"));

    // 4) A missing secret fails validation
    let missing_secret = dir.path().join("missing-secret.toml");
    fs::write(&missing_secret, "[server]\nport = 8082\n").expect("write toml");
    let err = load_config(missing_secret.to_str()).expect_err("expected validation error");
    assert!(err.contains("secret"));
}
