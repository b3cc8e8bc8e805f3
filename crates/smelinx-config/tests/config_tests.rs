// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Smelinx configuration system.

use smelinx_config::diagnostic::ConfigError;
use smelinx_config::{load_and_validate_str, load_config_from_str};

/// A file that sets every section deserializes field by field.
#[test]
fn full_toml_deserializes_into_smelinx_config() {
    let toml = r#"
[service]
name = "smelinx-staging"
log_level = "debug"

[storage]
database_path = "/tmp/smelinx-test.db"
wal_mode = false

[gateway]
host = "0.0.0.0"
port = 9090
tokens = [
    { token = "tok-a", org_id = "org-a" },
    { token = "tok-b", org_id = "org-b" },
]

[dispatch]
enabled = false
poll_interval_secs = 15
batch_limit = 10
max_concurrency = 2
max_attempts = 5
send_timeout_secs = 5
claim_grace_secs = 120
backoff_base_secs = 30
backoff_max_secs = 900

[email]
smtp_host = "smtp.example.com"
smtp_port = 2525
smtp_username = "mailer"
smtp_password = "hunter2"
from_address = "noreply@example.com"
from_name = "Example Lifecycle"
fallback_recipient = "ops@example.com"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.service.name, "smelinx-staging");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/smelinx-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.port, 9090);
    assert_eq!(config.gateway.tokens.len(), 2);
    assert_eq!(config.gateway.tokens[1].org_id, "org-b");
    assert!(!config.dispatch.enabled);
    assert_eq!(config.dispatch.poll_interval_secs, 15);
    assert_eq!(config.dispatch.max_attempts, 5);
    assert_eq!(config.dispatch.backoff_max_secs, 900);
    assert_eq!(config.email.smtp_port, 2525);
    assert_eq!(
        config.email.fallback_recipient.as_deref(),
        Some("ops@example.com")
    );
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    assert_eq!(config.service.name, "smelinx");
    assert_eq!(config.service.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8080);
    assert!(config.gateway.tokens.is_empty());
    assert!(config.dispatch.enabled);
    assert_eq!(config.dispatch.poll_interval_secs, 60);
    assert_eq!(config.dispatch.batch_limit, 50);
    assert_eq!(config.dispatch.max_attempts, 3);
    assert_eq!(config.dispatch.send_timeout_secs, 10);
    assert_eq!(config.dispatch.claim_grace_secs, 300);
    assert!(config.email.smtp_host.is_none());
    assert_eq!(config.email.smtp_port, 587);
    assert_eq!(config.email.from_name, "Smelinx");
}

/// Unknown key in [dispatch] becomes an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_dispatch_key_suggests_correction() {
    let toml = r#"
[dispatch]
max_atempts = 4
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "max_atempts"
                && suggestion.as_deref() == Some("max_attempts")
                && valid_keys.contains("backoff_base_secs")
        })
    });
    assert!(found, "expected UnknownKey for max_atempts, got: {errors:?}");
}

/// Unknown top-level section is rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    let err = load_config_from_str(toml).expect_err("unknown section should fail");
    assert!(format!("{err}").contains("telemetry"));
}

/// Unknown key in a token entry is rejected.
#[test]
fn token_entries_deny_unknown_fields() {
    let toml = r#"
[gateway]
tokens = [{ token = "t", org_id = "o", role = "admin" }]
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Wrong value type yields InvalidType with the dotted key path.
#[test]
fn invalid_type_names_the_key() {
    let toml = r#"
[gateway]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    let found = errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key == "gateway.port"));
    assert!(found, "expected InvalidType for gateway.port, got: {errors:?}");
}

/// Semantic violations surface through load_and_validate_str, all at once.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[dispatch]
max_attempts = 0
backoff_base_secs = 100
backoff_max_secs = 10

[email]
smtp_host = "smtp.example.com"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    let keys: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::Validation { key, .. } => Some(key.as_str()),
            _ => None,
        })
        .collect();
    assert!(keys.contains(&"dispatch.max_attempts"));
    assert!(keys.contains(&"dispatch.backoff_max_secs"));
    assert!(keys.contains(&"email.from_address"));
}

/// Secrets are redacted from Debug output.
#[test]
fn debug_output_redacts_secrets() {
    let toml = r#"
[gateway]
tokens = [{ token = "super-secret-token", org_id = "org-a" }]

[email]
smtp_username = "mailer"
smtp_password = "hunter2"
"#;
    let config = load_config_from_str(toml).expect("should deserialize");
    let debug = format!("{config:?}");
    assert!(!debug.contains("super-secret-token"));
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("org-a"));
}

/// ConfigError renders through miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "smtp_hots".to_string(),
        suggestion: Some("smtp_host".to_string()),
        valid_keys: "smtp_host, smtp_port".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `smtp_host`"));

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("smtp_hots"));
}
