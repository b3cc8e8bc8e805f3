// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification record store and its status protocol.
//!
//! Two families of writes exist. The manual override
//! ([`NotificationStore::set_status`]) is unguarded and used by API callers.
//! The dispatcher entry points are guarded by a [`Claim`]: they only apply
//! while the row is still `sending` under the same claim token, and return
//! [`SmelinxError::Conflict`] otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SmelinxError;
use crate::types::{Claim, DueNotification, Notification, NotificationStatus};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), SmelinxError>;

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, SmelinxError>;

    /// Notifications of one API ordered by `scheduled_at` ascending, then
    /// newest first.
    async fn list_notifications(&self, api_id: &str) -> Result<Vec<Notification>, SmelinxError>;

    /// Pending notifications whose schedule and retry backoff have both
    /// elapsed at `now`, oldest schedule first, at most `limit` rows.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DueNotification>, SmelinxError>;

    /// Manual override. Writing `pending` also resets attempts, backoff and
    /// claim fields.
    async fn set_status(
        &self,
        id: &str,
        status: NotificationStatus,
    ) -> Result<Notification, SmelinxError>;

    async fn delete_notification(&self, id: &str) -> Result<(), SmelinxError>;

    /// Atomically move a notification due at `due_at` from `pending` to
    /// `sending`. The claim is stamped with `claimed_at`, which starts the
    /// stale-claim grace period.
    ///
    /// Returns `None` when another worker won or the row is no longer due.
    async fn claim(
        &self,
        id: &str,
        token: &str,
        due_at: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
    ) -> Result<Option<Claim>, SmelinxError>;

    async fn mark_sent(&self, claim: &Claim, attempts: u32) -> Result<(), SmelinxError>;

    async fn mark_retry(
        &self,
        claim: &Claim,
        attempts: u32,
        retry_after: DateTime<Utc>,
        error: &str,
    ) -> Result<(), SmelinxError>;

    async fn mark_failed(
        &self,
        claim: &Claim,
        attempts: u32,
        error: &str,
    ) -> Result<(), SmelinxError>;

    /// Return a claimed notification to `pending` without touching attempts.
    async fn release_claim(&self, claim: &Claim, reason: &str) -> Result<(), SmelinxError>;

    /// Revert `sending` rows claimed before `cutoff` to `pending`.
    async fn reclaim_stale(&self, cutoff: DateTime<Utc>) -> Result<usize, SmelinxError>;
}
