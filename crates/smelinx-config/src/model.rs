// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Smelinx service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Smelinx configuration.
///
/// All sections are optional and default to values suitable for a local
/// single-node deployment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmelinxConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP listener and bearer tokens.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Notification dispatcher loop.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Outbound email delivery.
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "smelinx".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("smelinx").join("smelinx.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("smelinx.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether `serve` starts the HTTP listener.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer tokens accepted by the gateway, each bound to one organization.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
            tokens: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// A static bearer token and the organization it acts for.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    pub token: String,
    pub org_id: String,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("token", &"[REDACTED]")
            .field("org_id", &self.org_id)
            .finish()
    }
}

/// Dispatcher loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Whether `serve` runs the background dispatcher.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between polling cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum due notifications fetched per cycle.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Maximum delivery attempts in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Delivery attempts before a notification is marked `failed`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt delivery timeout.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Age after which a `sending` claim is considered abandoned.
    #[serde(default = "default_claim_grace_secs")]
    pub claim_grace_secs: u64,

    /// First retry delay; doubles per attempt.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Upper bound on the retry delay.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
            batch_limit: default_batch_limit(),
            max_concurrency: default_max_concurrency(),
            max_attempts: default_max_attempts(),
            send_timeout_secs: default_send_timeout_secs(),
            claim_grace_secs: default_claim_grace_secs(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_batch_limit() -> usize {
    50
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_claim_grace_secs() -> u64 {
    300
}

fn default_backoff_base_secs() -> u64 {
    60
}

fn default_backoff_max_secs() -> u64 {
    3600
}

/// Outbound email configuration.
///
/// Without `smtp_host` the service falls back to a log-only gateway.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Sender address. Required when `smtp_host` is set.
    #[serde(default)]
    pub from_address: Option<String>,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Recipient used when an API has neither a contact email nor
    /// registered consumers.
    #[serde(default)]
    pub fallback_recipient: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: None,
            from_name: default_from_name(),
            fallback_recipient: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Smelinx".to_string()
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field(
                "smtp_password",
                &self.smtp_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("fallback_recipient", &self.fallback_recipient)
            .finish()
    }
}
