// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row decoding for storage entities.
//!
//! The canonical types live in `smelinx-core::types`. Columns are stored as
//! text; these helpers parse them back and surface malformed values as
//! `FromSqlConversionFailure` so they flow through the normal error path.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use smelinx_core::time::{parse_stored_date, parse_stored_instant};

pub use smelinx_core::types::{
    Api, Consumer, DueNotification, Notification, NotificationKind, NotificationStatus, Version,
    VersionStatus,
};

pub(crate) const API_COLUMNS: &str =
    "id, org_id, name, description, base_url, docs_url, contact_email, owner_team, created_at";

pub(crate) const VERSION_COLUMNS: &str = "id, api_id, version, status, sunset_date, created_at";

pub(crate) const NOTIFICATION_COLUMNS: &str = "id, api_id, version_id, kind, scheduled_at, status, \
     attempts, retry_after, last_error, claimed_at, created_at";

pub(crate) const CONSUMER_COLUMNS: &str = "id, api_id, email, name, created_at";

fn parse_text<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn instant(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_text(row, idx, parse_stored_instant)
}

fn opt_instant(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => instant(row, idx).map(Some),
    }
}

fn opt_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => parse_text(row, idx, parse_stored_date).map(Some),
    }
}

pub(crate) fn api_from_row(row: &Row<'_>) -> rusqlite::Result<Api> {
    Ok(Api {
        id: row.get(0)?,
        org_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        base_url: row.get(4)?,
        docs_url: row.get(5)?,
        contact_email: row.get(6)?,
        owner_team: row.get(7)?,
        created_at: instant(row, 8)?,
    })
}

pub(crate) fn version_from_row(row: &Row<'_>) -> rusqlite::Result<Version> {
    Ok(Version {
        id: row.get(0)?,
        api_id: row.get(1)?,
        version: row.get(2)?,
        status: parse_text(row, 3, str::parse::<VersionStatus>)?,
        sunset_date: opt_date(row, 4)?,
        created_at: instant(row, 5)?,
    })
}

pub(crate) fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        api_id: row.get(1)?,
        version_id: row.get(2)?,
        kind: parse_text(row, 3, str::parse::<NotificationKind>)?,
        scheduled_at: instant(row, 4)?,
        status: parse_text(row, 5, str::parse::<NotificationStatus>)?,
        attempts: row.get(6)?,
        retry_after: opt_instant(row, 7)?,
        last_error: row.get(8)?,
        claimed_at: opt_instant(row, 9)?,
        created_at: instant(row, 10)?,
    })
}

pub(crate) fn consumer_from_row(row: &Row<'_>) -> rusqlite::Result<Consumer> {
    Ok(Consumer {
        id: row.get(0)?,
        api_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        created_at: instant(row, 4)?,
    })
}

/// Decode a due notification: [`NOTIFICATION_COLUMNS`] followed by
/// api name, version label, sunset date, base url and docs url.
pub(crate) fn due_from_row(row: &Row<'_>) -> rusqlite::Result<DueNotification> {
    Ok(DueNotification {
        notification: notification_from_row(row)?,
        api_name: row.get(11)?,
        version_label: row.get(12)?,
        sunset_date: opt_date(row, 13)?,
        base_url: row.get(14)?,
        docs_url: row.get(15)?,
    })
}
