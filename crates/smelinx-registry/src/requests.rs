// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-supplied payloads for registry writes.
//!
//! Status, kind and timestamp fields arrive as strings and are parsed by the
//! registry so that malformed input surfaces as a validation error rather
//! than a deserialization failure.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewApi {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub owner_team: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVersion {
    pub version: String,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sunset_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionStatusChange {
    pub status: String,
    #[serde(default)]
    pub sunset_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNotification {
    pub version_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub scheduled_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationStatusChange {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewConsumer {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}
