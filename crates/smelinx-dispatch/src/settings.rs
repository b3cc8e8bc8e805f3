// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime settings for the dispatcher, derived from configuration.

use std::time::Duration;

use smelinx_config::model::{DispatchConfig, EmailConfig};

/// Tunables for one [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub poll_interval: Duration,
    pub batch_limit: usize,
    pub max_concurrency: usize,
    pub max_attempts: u32,
    pub send_timeout: Duration,
    pub claim_grace: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Address used when an API has no audience of its own.
    pub fallback_recipient: Option<String>,
}

impl DispatchSettings {
    pub fn from_config(dispatch: &DispatchConfig, email: &EmailConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(dispatch.poll_interval_secs.max(1)),
            batch_limit: dispatch.batch_limit.max(1),
            max_concurrency: dispatch.max_concurrency.max(1),
            max_attempts: dispatch.max_attempts.max(1),
            send_timeout: Duration::from_secs(dispatch.send_timeout_secs),
            claim_grace: Duration::from_secs(dispatch.claim_grace_secs),
            backoff_base: Duration::from_secs(dispatch.backoff_base_secs),
            backoff_max: Duration::from_secs(dispatch.backoff_max_secs),
            fallback_recipient: email
                .fallback_recipient
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Delay before retrying after the `attempt`-th failure:
    /// `backoff_base * 2^(attempt - 1)`, capped at `backoff_max`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default(), &EmailConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config_defaults() {
        let settings = DispatchSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_secs(60));
        assert_eq!(settings.batch_limit, 50);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.send_timeout, Duration::from_secs(10));
        assert!(settings.fallback_recipient.is_none());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let settings = DispatchSettings {
            backoff_base: Duration::from_secs(60),
            backoff_max: Duration::from_secs(300),
            ..DispatchSettings::default()
        };
        assert_eq!(settings.backoff(1), Duration::from_secs(60));
        assert_eq!(settings.backoff(2), Duration::from_secs(120));
        assert_eq!(settings.backoff(3), Duration::from_secs(240));
        assert_eq!(settings.backoff(4), Duration::from_secs(300));
        assert_eq!(settings.backoff(64), Duration::from_secs(300));
    }

    #[test]
    fn blank_fallback_is_ignored() {
        let email = EmailConfig {
            fallback_recipient: Some("  ".into()),
            ..EmailConfig::default()
        };
        let settings = DispatchSettings::from_config(&DispatchConfig::default(), &email);
        assert!(settings.fallback_recipient.is_none());
    }
}
