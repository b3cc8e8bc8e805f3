// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./smelinx.toml` > `~/.config/smelinx/smelinx.toml` > `/etc/smelinx/smelinx.toml`
//! with environment variable overrides via `SMELINX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SmelinxConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/smelinx/smelinx.toml";
pub(crate) const LOCAL_CONFIG: &str = "smelinx.toml";

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("smelinx/smelinx.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/smelinx/smelinx.toml` (system-wide)
/// 3. `~/.config/smelinx/smelinx.toml` (user XDG config)
/// 4. `./smelinx.toml` (local directory)
/// 5. `SMELINX_*` environment variables
pub fn load_config() -> Result<SmelinxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SmelinxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmelinxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SmelinxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmelinxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SmelinxConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// `Env::split("_")` would turn `SMELINX_DISPATCH_MAX_ATTEMPTS` into
/// `dispatch.max.attempts`; only the first segment names the section.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("SMELINX_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["service", "storage", "gateway", "dispatch", "email"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_first_segment_only() {
        assert_eq!(map_env_key("dispatch_max_attempts"), "dispatch.max_attempts");
        assert_eq!(map_env_key("email_smtp_host"), "email.smtp_host");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[dispatch]
max_attempts = 4
"#,
            )?;
            jail.set_env("SMELINX_DISPATCH_MAX_ATTEMPTS", "7");
            jail.set_env("SMELINX_GATEWAY_PORT", "9999");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.dispatch.max_attempts, 7);
            assert_eq!(config.gateway.port, 9999);
            Ok(())
        });
    }
}
