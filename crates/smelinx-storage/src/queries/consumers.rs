// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consumer registrations and audience lookup.

use rusqlite::{OptionalExtension, params};
use smelinx_core::SmelinxError;
use smelinx_core::time::format_instant;

use crate::database::{Database, map_tr_err};
use crate::models::{CONSUMER_COLUMNS, Consumer, consumer_from_row};

pub async fn insert_consumer(db: &Database, consumer: &Consumer) -> Result<(), SmelinxError> {
    let consumer = consumer.clone();
    let email = consumer.email.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO consumers (id, api_id, email, name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    consumer.id,
                    consumer.api_id,
                    consumer.email,
                    consumer.name,
                    format_instant(consumer.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| match map_tr_err(e) {
            SmelinxError::Conflict(_) => {
                SmelinxError::Conflict(format!("consumer `{email}` already registered"))
            }
            other => other,
        })
}

pub async fn get_consumer(db: &Database, id: &str) -> Result<Option<Consumer>, SmelinxError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CONSUMER_COLUMNS} FROM consumers WHERE id = ?1"),
                params![id],
                consumer_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Consumers of an API in registration order.
pub async fn list_consumers(db: &Database, api_id: &str) -> Result<Vec<Consumer>, SmelinxError> {
    let api_id = api_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONSUMER_COLUMNS} FROM consumers
                 WHERE api_id = ?1 ORDER BY created_at ASC, id"
            ))?;
            let rows = stmt.query_map(params![api_id], consumer_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_consumer(db: &Database, id: &str) -> Result<(), SmelinxError> {
    let id = id.to_string();
    let consumer_id = id.clone();
    let changed = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM consumers WHERE id = ?1", params![consumer_id]))
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(SmelinxError::not_found("consumer", id));
    }
    Ok(())
}

/// The audience of an API: its contact email followed by registered
/// consumers, deduplicated case-insensitively. Empty when the API is unknown.
pub async fn recipients(db: &Database, api_id: &str) -> Result<Vec<String>, SmelinxError> {
    let api_id = api_id.to_string();
    let candidates = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT contact_email FROM apis WHERE id = ?1 AND contact_email IS NOT NULL
                 UNION ALL
                 SELECT email FROM (
                     SELECT email FROM consumers WHERE api_id = ?1 ORDER BY created_at, id
                 )",
            )?;
            let rows = stmt.query_map(params![api_id], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    let mut seen = std::collections::HashSet::new();
    Ok(candidates
        .into_iter()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty() && seen.insert(email.to_ascii_lowercase()))
        .collect())
}
