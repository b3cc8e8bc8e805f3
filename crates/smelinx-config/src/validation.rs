// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express. All violations are
//! collected; validation never fails fast.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::SmelinxConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &SmelinxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::invalid(
            "service.log_level",
            format!(
                "`{}` is not one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    validate_gateway(config, &mut errors);
    validate_dispatch(config, &mut errors);
    validate_email(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_gateway(config: &SmelinxConfig, errors: &mut Vec<ConfigError>) {
    let gateway = &config.gateway;
    let host = gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::invalid("gateway.host", "must not be empty"));
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::invalid(
                "gateway.host",
                format!("`{host}` is not a valid IP address or hostname"),
            ));
        }
    }

    if gateway.enabled && gateway.port == 0 {
        errors.push(ConfigError::invalid("gateway.port", "must be non-zero"));
    }

    let mut seen = HashSet::new();
    for (i, entry) in gateway.tokens.iter().enumerate() {
        if entry.token.trim().is_empty() {
            errors.push(ConfigError::invalid(
                format!("gateway.tokens[{i}].token"),
                "must not be empty",
            ));
        } else if !seen.insert(entry.token.as_str()) {
            errors.push(ConfigError::invalid(
                format!("gateway.tokens[{i}].token"),
                "duplicate token",
            ));
        }
        if entry.org_id.trim().is_empty() {
            errors.push(ConfigError::invalid(
                format!("gateway.tokens[{i}].org_id"),
                "must not be empty",
            ));
        }
    }
}

fn validate_dispatch(config: &SmelinxConfig, errors: &mut Vec<ConfigError>) {
    let dispatch = &config.dispatch;
    let at_least_one = [
        ("dispatch.poll_interval_secs", dispatch.poll_interval_secs),
        ("dispatch.batch_limit", dispatch.batch_limit as u64),
        ("dispatch.max_concurrency", dispatch.max_concurrency as u64),
        ("dispatch.max_attempts", u64::from(dispatch.max_attempts)),
        ("dispatch.send_timeout_secs", dispatch.send_timeout_secs),
    ];
    for (key, value) in at_least_one {
        if value < 1 {
            errors.push(ConfigError::invalid(key, "must be at least 1"));
        }
    }

    if dispatch.backoff_max_secs < dispatch.backoff_base_secs {
        errors.push(ConfigError::invalid(
            "dispatch.backoff_max_secs",
            format!(
                "must be >= dispatch.backoff_base_secs ({})",
                dispatch.backoff_base_secs
            ),
        ));
    }

    if dispatch.claim_grace_secs <= dispatch.send_timeout_secs {
        errors.push(ConfigError::invalid(
            "dispatch.claim_grace_secs",
            format!(
                "must exceed dispatch.send_timeout_secs ({}) or in-flight claims are reclaimed",
                dispatch.send_timeout_secs
            ),
        ));
    }
}

fn validate_email(config: &SmelinxConfig, errors: &mut Vec<ConfigError>) {
    let email = &config.email;
    let host_set = email
        .smtp_host
        .as_deref()
        .is_some_and(|h| !h.trim().is_empty());
    let from_set = email
        .from_address
        .as_deref()
        .is_some_and(|a| !a.trim().is_empty());

    if host_set && !from_set {
        errors.push(ConfigError::invalid(
            "email.from_address",
            "required when email.smtp_host is set",
        ));
    }

    if email.smtp_username.is_some() != email.smtp_password.is_some() {
        errors.push(ConfigError::invalid(
            "email.smtp_password",
            "smtp_username and smtp_password must be set together",
        ));
    }

    for (key, value) in [
        ("email.from_address", email.from_address.as_deref()),
        ("email.fallback_recipient", email.fallback_recipient.as_deref()),
    ] {
        if let Some(addr) = value
            && !addr.contains('@')
        {
            errors.push(ConfigError::invalid(
                key,
                format!("`{addr}` is not an email address"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TokenConfig;

    fn has_error(errors: &[ConfigError], key: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { key: k, .. } if k == key))
    }

    #[test]
    fn default_config_validates() {
        let config = SmelinxConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = SmelinxConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "storage.database_path"));
    }

    #[test]
    fn zero_attempts_and_concurrency_are_rejected_together() {
        let mut config = SmelinxConfig::default();
        config.dispatch.max_attempts = 0;
        config.dispatch.max_concurrency = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "dispatch.max_attempts"));
        assert!(has_error(&errors, "dispatch.max_concurrency"));
    }

    #[test]
    fn backoff_bounds_must_be_ordered() {
        let mut config = SmelinxConfig::default();
        config.dispatch.backoff_base_secs = 600;
        config.dispatch.backoff_max_secs = 60;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "dispatch.backoff_max_secs"));
    }

    #[test]
    fn claim_grace_must_outlast_send_timeout() {
        let mut config = SmelinxConfig::default();
        config.dispatch.send_timeout_secs = 30;
        config.dispatch.claim_grace_secs = 30;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "dispatch.claim_grace_secs"));
    }

    #[test]
    fn duplicate_tokens_fail_validation() {
        let mut config = SmelinxConfig::default();
        config.gateway.tokens = vec![
            TokenConfig {
                token: "t-1".into(),
                org_id: "org-a".into(),
            },
            TokenConfig {
                token: "t-1".into(),
                org_id: "org-b".into(),
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "gateway.tokens[1].token"));
    }

    #[test]
    fn smtp_host_requires_sender() {
        let mut config = SmelinxConfig::default();
        config.email.smtp_host = Some("smtp.example.com".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "email.from_address"));

        config.email.from_address = Some("noreply@example.com".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = SmelinxConfig::default();
        config.service.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "service.log_level"));
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut config = SmelinxConfig::default();
        config.gateway.host = "not a host!".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "gateway.host"));
    }
}
