// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification records and the dispatcher claim protocol.
//!
//! The claim is a conditional `UPDATE ... WHERE status = 'pending'`; its
//! affected-row count decides the winner, so at most one worker (or process
//! sharing the file) holds a notification at a time. Every dispatcher write
//! afterwards is conditioned on `status = 'sending'` and the claim token.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use smelinx_core::time::format_instant;
use smelinx_core::{Claim, SmelinxError};

use crate::database::{Database, map_tr_err};
use crate::models::{
    DueNotification, NOTIFICATION_COLUMNS, Notification, NotificationStatus, due_from_row,
    notification_from_row,
};

fn select_by_id(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Notification>> {
    conn.query_row(
        &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
        params![id],
        notification_from_row,
    )
    .optional()
}

pub async fn insert_notification(
    db: &Database,
    notification: &Notification,
) -> Result<(), SmelinxError> {
    let n = notification.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notifications (id, api_id, version_id, kind, scheduled_at, status,
                                            attempts, retry_after, last_error, claimed_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    n.id,
                    n.api_id,
                    n.version_id,
                    n.kind.to_string(),
                    format_instant(n.scheduled_at),
                    n.status.to_string(),
                    n.attempts,
                    n.retry_after.map(format_instant),
                    n.last_error,
                    n.claimed_at.map(format_instant),
                    format_instant(n.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_notification(
    db: &Database,
    id: &str,
) -> Result<Option<Notification>, SmelinxError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_by_id(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Notifications of an API by schedule, newest record first on ties.
pub async fn list_notifications(
    db: &Database,
    api_id: &str,
) -> Result<Vec<Notification>, SmelinxError> {
    let api_id = api_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE api_id = ?1 ORDER BY scheduled_at ASC, created_at DESC"
            ))?;
            let rows = stmt.query_map(params![api_id], notification_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Pending notifications due at `now`, joined with their API and version.
pub async fn list_due(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<DueNotification>, SmelinxError> {
    let now = format_instant(now);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let columns = NOTIFICATION_COLUMNS
                .split(", ")
                .map(|c| format!("n.{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {columns}, a.name, v.version, v.sunset_date, a.base_url, a.docs_url
                 FROM notifications n
                 JOIN apis a ON a.id = n.api_id
                 JOIN api_versions v ON v.id = n.version_id
                 WHERE n.status = 'pending'
                   AND n.scheduled_at <= ?1
                   AND (n.retry_after IS NULL OR n.retry_after <= ?1)
                 ORDER BY n.scheduled_at ASC, n.id
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![now, limit], due_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Manual status override. Unguarded and idempotent.
///
/// Any held claim is dropped, so a dispatcher still working on the row gets a
/// `Conflict` on its next write. Writing `pending` also resets attempts and
/// backoff so the dispatcher treats the row as fresh.
pub async fn set_status(
    db: &Database,
    id: &str,
    status: NotificationStatus,
) -> Result<Notification, SmelinxError> {
    let id = id.to_string();
    let notification_id = id.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            let changed = if status == NotificationStatus::Pending {
                conn.execute(
                    "UPDATE notifications
                     SET status = 'pending', attempts = 0, retry_after = NULL,
                         last_error = NULL, claim_token = NULL, claimed_at = NULL
                     WHERE id = ?1",
                    params![notification_id],
                )?
            } else {
                conn.execute(
                    "UPDATE notifications
                     SET status = ?2, claim_token = NULL, claimed_at = NULL
                     WHERE id = ?1",
                    params![notification_id, status.to_string()],
                )?
            };
            if changed == 0 {
                return Ok(None);
            }
            select_by_id(conn, &notification_id)
        })
        .await
        .map_err(map_tr_err)?;

    updated.ok_or_else(|| SmelinxError::not_found("notification", id))
}

pub async fn delete_notification(db: &Database, id: &str) -> Result<(), SmelinxError> {
    let id = id.to_string();
    let notification_id = id.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM notifications WHERE id = ?1",
                params![notification_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(SmelinxError::not_found("notification", id));
    }
    Ok(())
}

/// Try to move a notification due at `due_at` from `pending` to `sending`
/// under `token`, stamping the claim with `claimed_at`.
///
/// Returns `None` if the row is gone, no longer pending, or not yet due.
pub async fn claim(
    db: &Database,
    id: &str,
    token: &str,
    due_at: DateTime<Utc>,
    claimed_at: DateTime<Utc>,
) -> Result<Option<Claim>, SmelinxError> {
    let id = id.to_string();
    let token = token.to_string();
    let due = format_instant(due_at);
    let stamp = format_instant(claimed_at);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE notifications
                 SET status = 'sending', claim_token = ?2, claimed_at = ?4
                 WHERE id = ?1
                   AND status = 'pending'
                   AND scheduled_at <= ?3
                   AND (retry_after IS NULL OR retry_after <= ?3)",
                params![id, token, due, stamp],
            )?;
            if changed == 0 {
                tx.commit()?;
                return Ok(None);
            }
            let attempts: u32 = tx.query_row(
                "SELECT attempts FROM notifications WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok(Some(Claim {
                notification_id: id,
                token,
                attempts,
                claimed_at,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Run a claim-guarded update. Zero affected rows means the claim was lost.
async fn guarded_update(
    db: &Database,
    claim: &Claim,
    sql: &'static str,
    attempts: u32,
    retry_after: Option<String>,
    error: Option<String>,
) -> Result<(), SmelinxError> {
    let id = claim.notification_id.clone();
    let token = claim.token.clone();
    let changed = db
        .connection()
        .call(move |conn| conn.execute(sql, params![id, token, attempts, retry_after, error]))
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(SmelinxError::Conflict(format!(
            "claim on notification {} no longer held",
            claim.notification_id
        )));
    }
    Ok(())
}

pub async fn mark_sent(db: &Database, claim: &Claim, attempts: u32) -> Result<(), SmelinxError> {
    guarded_update(
        db,
        claim,
        "UPDATE notifications
         SET status = 'sent', attempts = ?3, retry_after = ?4, last_error = ?5,
             claim_token = NULL, claimed_at = NULL
         WHERE id = ?1 AND status = 'sending' AND claim_token = ?2",
        attempts,
        None,
        None,
    )
    .await
}

pub async fn mark_retry(
    db: &Database,
    claim: &Claim,
    attempts: u32,
    retry_after: DateTime<Utc>,
    error: &str,
) -> Result<(), SmelinxError> {
    guarded_update(
        db,
        claim,
        "UPDATE notifications
         SET status = 'pending', attempts = ?3, retry_after = ?4, last_error = ?5,
             claim_token = NULL, claimed_at = NULL
         WHERE id = ?1 AND status = 'sending' AND claim_token = ?2",
        attempts,
        Some(format_instant(retry_after)),
        Some(error.to_string()),
    )
    .await
}

pub async fn mark_failed(
    db: &Database,
    claim: &Claim,
    attempts: u32,
    error: &str,
) -> Result<(), SmelinxError> {
    guarded_update(
        db,
        claim,
        "UPDATE notifications
         SET status = 'failed', attempts = ?3, retry_after = ?4, last_error = ?5,
             claim_token = NULL, claimed_at = NULL
         WHERE id = ?1 AND status = 'sending' AND claim_token = ?2",
        attempts,
        None,
        Some(error.to_string()),
    )
    .await
}

/// Hand a claimed notification back to `pending` with its attempt count intact.
pub async fn release_claim(db: &Database, claim: &Claim, reason: &str) -> Result<(), SmelinxError> {
    guarded_update(
        db,
        claim,
        "UPDATE notifications
         SET status = 'pending', attempts = ?3, retry_after = ?4, last_error = ?5,
             claim_token = NULL, claimed_at = NULL
         WHERE id = ?1 AND status = 'sending' AND claim_token = ?2",
        claim.attempts,
        None,
        Some(reason.to_string()),
    )
    .await
}

/// Revert claims taken before `cutoff` to `pending`. Returns how many were reverted.
pub async fn reclaim_stale(db: &Database, cutoff: DateTime<Utc>) -> Result<usize, SmelinxError> {
    let cutoff = format_instant(cutoff);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notifications
                 SET status = 'pending', claim_token = NULL, claimed_at = NULL
                 WHERE status = 'sending' AND claimed_at < ?1",
                params![cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}
