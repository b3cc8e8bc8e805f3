// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use smelinx_core::SmelinxError;
use tokio_rusqlite::Connection;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the single SQLite writer connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and apply pending
    /// migrations.
    pub async fn open(path: &str) -> Result<Self, SmelinxError> {
        Self::open_with_options(path, true).await
    }

    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, SmelinxError> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| SmelinxError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path).await.map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;

        let journal_mode = conn
            .call(move |conn| -> Result<String, rusqlite::Error> {
                let mode = if wal_mode { "WAL" } else { "DELETE" };
                let applied: String =
                    conn.pragma_update_and_check(None, "journal_mode", mode, |row| row.get(0))?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                Ok(applied)
            })
            .await
            .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<(), SmelinxError> { crate::migrations::run_migrations(conn) })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => SmelinxError::Storage {
                    source: other.to_string().into(),
                },
            })?;

        debug!(path, journal_mode = %journal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), SmelinxError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

pub(crate) async fn checkpoint(conn: &Connection) -> Result<(), SmelinxError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Map a tokio-rusqlite error to [`SmelinxError`].
///
/// Unique and primary-key violations become `Conflict`; everything else is
/// a `Storage` error.
pub fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> SmelinxError {
    if let tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(failure, message)) = &err
        && matches!(
            failure.extended_code,
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    {
        return SmelinxError::Conflict(
            message
                .clone()
                .unwrap_or_else(|| "duplicate record".to_string()),
        );
    }
    SmelinxError::Storage {
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_dirs_and_enables_wal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/smelinx.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let (mode, fk): (String, i64) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let mode = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let fk = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
                Ok((mode, fk))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(fk, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();

        let tables: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                     AND name IN ('apis', 'api_versions', 'notifications', 'consumers')",
                    [],
                    |r| r.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[tokio::test]
    async fn end_of_life_version_without_date_is_rejected_by_schema() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("check.db").to_str().unwrap())
            .await
            .unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO apis (id, org_id, name, created_at) VALUES ('a', 'o', 'n', 't')",
                    [],
                )?;
                conn.execute(
                    "INSERT INTO api_versions (id, api_id, version, status, created_at)
                     VALUES ('v', 'a', 'v1', 'deprecated', 't')",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err());
    }
}
