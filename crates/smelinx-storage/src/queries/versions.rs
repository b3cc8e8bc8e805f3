// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Version CRUD operations.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, params};
use smelinx_core::SmelinxError;
use smelinx_core::time::{format_date, format_instant};

use crate::database::{Database, map_tr_err};
use crate::models::{VERSION_COLUMNS, Version, VersionStatus, version_from_row};

/// Insert a version. A label already used by the same API is a `Conflict`.
pub async fn insert_version(db: &Database, version: &Version) -> Result<(), SmelinxError> {
    let version = version.clone();
    let label = version.version.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO api_versions (id, api_id, version, status, sunset_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    version.id,
                    version.api_id,
                    version.version,
                    version.status.to_string(),
                    version.sunset_date.map(format_date),
                    format_instant(version.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| match map_tr_err(e) {
            SmelinxError::Conflict(_) => {
                SmelinxError::Conflict(format!("version `{label}` already exists for this api"))
            }
            other => other,
        })
}

pub async fn get_version(db: &Database, id: &str) -> Result<Option<Version>, SmelinxError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM api_versions WHERE id = ?1"),
                params![id],
                version_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Versions of an API, newest first.
pub async fn list_versions(db: &Database, api_id: &str) -> Result<Vec<Version>, SmelinxError> {
    let api_id = api_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {VERSION_COLUMNS} FROM api_versions
                 WHERE api_id = ?1 ORDER BY created_at DESC, id"
            ))?;
            let rows = stmt.query_map(params![api_id], version_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Write a new status and sunset date, returning the updated row.
///
/// The caller has already resolved the date through the lifecycle rules;
/// the schema CHECK is the last line of enforcement.
pub async fn update_version_status(
    db: &Database,
    id: &str,
    status: VersionStatus,
    sunset_date: Option<NaiveDate>,
) -> Result<Version, SmelinxError> {
    let id = id.to_string();
    let version_id = id.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE api_versions SET status = ?2, sunset_date = ?3 WHERE id = ?1",
                params![version_id, status.to_string(), sunset_date.map(format_date)],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM api_versions WHERE id = ?1"),
                params![version_id],
                version_from_row,
            )
            .map(Some)
        })
        .await
        .map_err(map_tr_err)?;

    updated.ok_or_else(|| SmelinxError::not_found("version", id))
}

/// Delete a version and its notifications in one transaction.
///
/// Returns the number of notifications removed.
pub async fn delete_version(db: &Database, id: &str) -> Result<usize, SmelinxError> {
    let id = id.to_string();
    let version_id = id.clone();
    let removed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let notifications = tx.execute(
                "DELETE FROM notifications WHERE version_id = ?1",
                params![version_id],
            )?;
            let versions =
                tx.execute("DELETE FROM api_versions WHERE id = ?1", params![version_id])?;
            if versions == 0 {
                return Ok(None);
            }
            tx.commit()?;
            Ok(Some(notifications))
        })
        .await
        .map_err(map_tr_err)?;

    removed.ok_or_else(|| SmelinxError::not_found("version", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{apis, notifications};
    use crate::test_fixtures::*;

    async fn setup_with_api() -> (Database, tempfile::TempDir) {
        let (db, dir) = setup_db().await;
        apis::insert_api(&db, &sample_api("api-1", "org-a", "Payments"))
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_and_get_version() {
        let (db, _dir) = setup_with_api().await;
        let version = sample_version("v-1", "api-1", "v1");
        insert_version(&db, &version).await.unwrap();

        let fetched = get_version(&db, "v-1").await.unwrap().unwrap();
        assert_eq!(fetched, version);
        assert_eq!(fetched.status, VersionStatus::Active);
        assert!(get_version(&db, "v-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_label_is_conflict() {
        let (db, _dir) = setup_with_api().await;
        insert_version(&db, &sample_version("v-1", "api-1", "v1"))
            .await
            .unwrap();
        let err = insert_version(&db, &sample_version("v-2", "api-1", "v1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SmelinxError::Conflict(m) if m.contains("v1")));
    }

    #[tokio::test]
    async fn status_update_roundtrips_sunset_date() {
        let (db, _dir) = setup_with_api().await;
        insert_version(&db, &sample_version("v-1", "api-1", "v1"))
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 1);

        let updated = update_version_status(&db, "v-1", VersionStatus::Deprecated, date)
            .await
            .unwrap();
        assert_eq!(updated.status, VersionStatus::Deprecated);
        assert_eq!(updated.sunset_date, date);
    }

    #[tokio::test]
    async fn schema_rejects_end_of_life_without_date() {
        let (db, _dir) = setup_with_api().await;
        insert_version(&db, &sample_version("v-1", "api-1", "v1"))
            .await
            .unwrap();
        let err = update_version_status(&db, "v-1", VersionStatus::Sunset, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SmelinxError::Storage { .. }));
    }

    #[tokio::test]
    async fn update_missing_version_is_not_found() {
        let (db, _dir) = setup_with_api().await;
        let err = update_version_status(&db, "ghost", VersionStatus::Active, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SmelinxError::NotFound { entity: "version", .. }));
    }

    #[tokio::test]
    async fn delete_removes_version_notifications_only() {
        let (db, _dir) = setup_with_api().await;
        insert_version(&db, &sample_version("v-1", "api-1", "v1"))
            .await
            .unwrap();
        insert_version(&db, &sample_version("v-2", "api-1", "v2"))
            .await
            .unwrap();
        for (id, version) in [("n-1", "v-1"), ("n-2", "v-1"), ("n-3", "v-2")] {
            notifications::insert_notification(
                &db,
                &sample_notification(id, "api-1", version, "2025-08-17T12:00:00Z"),
            )
            .await
            .unwrap();
        }

        assert_eq!(delete_version(&db, "v-1").await.unwrap(), 2);
        assert!(get_version(&db, "v-1").await.unwrap().is_none());
        let remaining = notifications::list_notifications(&db, "api-1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "n-3");

        let err = delete_version(&db, "v-1").await.unwrap_err();
        assert!(matches!(err, SmelinxError::NotFound { .. }));
    }
}
