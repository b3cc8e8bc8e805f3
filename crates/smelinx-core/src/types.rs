// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities and common types shared across crate boundaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::SmelinxError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Delivery,
    Auth,
}

/// Lifecycle status of an API version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Active,
    Deprecated,
    Sunset,
}

impl VersionStatus {
    /// Statuses other than `active` announce an end of life and need a date.
    pub fn requires_sunset_date(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Parse a caller-supplied status, trimming whitespace and ignoring case.
    pub fn parse(raw: &str) -> Result<Self, SmelinxError> {
        raw.trim().parse().map_err(|_| {
            SmelinxError::Validation(format!(
                "invalid status `{}` (expected active, deprecated or sunset)",
                raw.trim()
            ))
        })
    }
}

/// What a notification announces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Deprecate,
    Sunset,
}

impl NotificationKind {
    pub fn parse(raw: &str) -> Result<Self, SmelinxError> {
        raw.trim().parse().map_err(|_| {
            SmelinxError::Validation("type must be 'deprecate' or 'sunset'".to_string())
        })
    }
}

/// Delivery status of a notification.
///
/// `Sending` is the claimed sub-state held by exactly one dispatcher worker;
/// `Failed` is terminal after the retry budget is exhausted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sending,
    Sent,
    Canceled,
    Failed,
}

impl NotificationStatus {
    /// Parse a status for the manual override path.
    ///
    /// `sending` is owned by the dispatcher claim and is never accepted here.
    pub fn parse_manual(raw: &str) -> Result<Self, SmelinxError> {
        match raw.trim().parse() {
            Ok(Self::Sending) | Err(_) => Err(SmelinxError::Validation(
                "status must be pending|sent|canceled|failed".to_string(),
            )),
            Ok(status) => Ok(status),
        }
    }
}

/// A registered API product, owned by an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Api {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_team: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One version of an API. The label is free text and never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub api_id: String,
    pub version: String,
    pub status: VersionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A scheduled deprecation or sunset announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub api_id: String,
    pub version_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub scheduled_at: DateTime<Utc>,
    pub status: NotificationStatus,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A party to be told about lifecycle changes of an API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: String,
    pub api_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update for an [`Api`]. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub owner_team: Option<String>,
}

/// A pending notification joined with the API and version data needed to
/// render and address it.
#[derive(Debug, Clone, PartialEq)]
pub struct DueNotification {
    pub notification: Notification,
    pub api_name: String,
    pub version_label: String,
    pub sunset_date: Option<NaiveDate>,
    pub base_url: Option<String>,
    pub docs_url: Option<String>,
}

/// Exclusive reservation of a notification by one dispatcher worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub notification_id: String,
    pub token: String,
    /// Delivery attempts recorded before this claim.
    pub attempts: u32,
    pub claimed_at: DateTime<Utc>,
}

/// Everything a delivery gateway needs to send one announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub notification_id: String,
    pub recipients: Vec<String>,
    pub api_name: String,
    pub version_label: String,
    pub kind: NotificationKind,
    pub sunset_date: Option<NaiveDate>,
    pub scheduled_at: DateTime<Utc>,
    pub base_url: Option<String>,
    pub docs_url: Option<String>,
}

/// Row counts removed by a cascading API delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub versions: usize,
    pub notifications: usize,
    pub consumers: usize,
}
