// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API CRUD operations and the cascading delete.

use rusqlite::params;
use smelinx_core::time::format_instant;
use smelinx_core::{CascadeSummary, SmelinxError};

use crate::database::{Database, map_tr_err};
use crate::models::{API_COLUMNS, Api, api_from_row};

pub async fn insert_api(db: &Database, api: &Api) -> Result<(), SmelinxError> {
    let api = api.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO apis (id, org_id, name, description, base_url, docs_url,
                                   contact_email, owner_team, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    api.id,
                    api.org_id,
                    api.name,
                    api.description,
                    api.base_url,
                    api.docs_url,
                    api.contact_email,
                    api.owner_team,
                    format_instant(api.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_api(db: &Database, id: &str) -> Result<Option<Api>, SmelinxError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {API_COLUMNS} FROM apis WHERE id = ?1"),
                params![id],
                api_from_row,
            );
            match result {
                Ok(api) => Ok(Some(api)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// APIs owned by `org_id`, newest first.
pub async fn list_apis(db: &Database, org_id: &str) -> Result<Vec<Api>, SmelinxError> {
    let org_id = org_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {API_COLUMNS} FROM apis WHERE org_id = ?1 ORDER BY created_at DESC, id"
            ))?;
            let rows = stmt.query_map(params![org_id], api_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the mutable columns of an API. `org_id` and `created_at` never change.
pub async fn update_api(db: &Database, api: &Api) -> Result<(), SmelinxError> {
    let api = api.clone();
    let id = api.id.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE apis SET name = ?2, description = ?3, base_url = ?4, docs_url = ?5,
                                 contact_email = ?6, owner_team = ?7
                 WHERE id = ?1",
                params![
                    api.id,
                    api.name,
                    api.description,
                    api.base_url,
                    api.docs_url,
                    api.contact_email,
                    api.owner_team,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(SmelinxError::not_found("api", id));
    }
    Ok(())
}

/// Delete an API and everything under it in one transaction.
///
/// Dependents are removed before their parents: notifications, then
/// versions and consumers, then the API row. Nothing is deleted when the API
/// does not exist.
pub async fn delete_api(db: &Database, id: &str) -> Result<CascadeSummary, SmelinxError> {
    let id = id.to_string();
    let api_id = id.clone();
    let summary = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM apis WHERE id = ?1)",
                params![api_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            let notifications = tx.execute(
                "DELETE FROM notifications
                 WHERE api_id = ?1
                    OR version_id IN (SELECT id FROM api_versions WHERE api_id = ?1)",
                params![api_id],
            )?;
            let versions =
                tx.execute("DELETE FROM api_versions WHERE api_id = ?1", params![api_id])?;
            let consumers =
                tx.execute("DELETE FROM consumers WHERE api_id = ?1", params![api_id])?;
            tx.execute("DELETE FROM apis WHERE id = ?1", params![api_id])?;
            tx.commit()?;

            Ok(Some(CascadeSummary {
                versions,
                notifications,
                consumers,
            }))
        })
        .await
        .map_err(map_tr_err)?;

    summary.ok_or_else(|| SmelinxError::not_found("api", id))
}
