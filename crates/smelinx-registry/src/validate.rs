// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::LazyLock;

use regex::Regex;
use smelinx_core::SmelinxError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("valid regex"));

/// Loose shape check: something@domain.tld, 6 to 254 characters.
pub fn is_valid_email(raw: &str) -> bool {
    let s = raw.trim();
    (6..=254).contains(&s.len()) && EMAIL_RE.is_match(s)
}

/// Trim and normalize an email, or fail with `error` as the message.
pub fn email(raw: &str, error: &str) -> Result<String, SmelinxError> {
    if is_valid_email(raw) {
        Ok(raw.trim().to_string())
    } else {
        Err(SmelinxError::Validation(error.to_string()))
    }
}

/// Trimmed, non-empty text or a validation error naming `field`.
pub fn required(raw: &str, field: &str) -> Result<String, SmelinxError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SmelinxError::Validation(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed optional text; blank becomes `None`.
pub fn optional(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
