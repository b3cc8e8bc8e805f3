// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use smelinx_config::model::StorageConfig;
use smelinx_core::{
    AdapterType, Api, CascadeSummary, Claim, Consumer, ConsumerDirectory, DueNotification,
    HealthStatus, Notification, NotificationStatus, NotificationStore, PluginAdapter,
    RegistryStore, SmelinxError, StorageAdapter, Version, VersionStatus,
};

use crate::database::{Database, checkpoint, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, SmelinxError> {
        self.db.get().ok_or_else(|| SmelinxError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SmelinxError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmelinxError> {
        if let Some(db) = self.db.get() {
            checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), SmelinxError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SmelinxError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), SmelinxError> {
        checkpoint(self.db()?.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl RegistryStore for SqliteStorage {
    async fn insert_api(&self, api: &Api) -> Result<(), SmelinxError> {
        queries::apis::insert_api(self.db()?, api).await
    }

    async fn get_api(&self, id: &str) -> Result<Option<Api>, SmelinxError> {
        queries::apis::get_api(self.db()?, id).await
    }

    async fn list_apis(&self, org_id: &str) -> Result<Vec<Api>, SmelinxError> {
        queries::apis::list_apis(self.db()?, org_id).await
    }

    async fn update_api(&self, api: &Api) -> Result<(), SmelinxError> {
        queries::apis::update_api(self.db()?, api).await
    }

    async fn delete_api(&self, id: &str) -> Result<CascadeSummary, SmelinxError> {
        queries::apis::delete_api(self.db()?, id).await
    }

    async fn insert_version(&self, version: &Version) -> Result<(), SmelinxError> {
        queries::versions::insert_version(self.db()?, version).await
    }

    async fn get_version(&self, id: &str) -> Result<Option<Version>, SmelinxError> {
        queries::versions::get_version(self.db()?, id).await
    }

    async fn list_versions(&self, api_id: &str) -> Result<Vec<Version>, SmelinxError> {
        queries::versions::list_versions(self.db()?, api_id).await
    }

    async fn update_version_status(
        &self,
        id: &str,
        status: VersionStatus,
        sunset_date: Option<NaiveDate>,
    ) -> Result<Version, SmelinxError> {
        queries::versions::update_version_status(self.db()?, id, status, sunset_date).await
    }

    async fn delete_version(&self, id: &str) -> Result<usize, SmelinxError> {
        queries::versions::delete_version(self.db()?, id).await
    }

    async fn insert_consumer(&self, consumer: &Consumer) -> Result<(), SmelinxError> {
        queries::consumers::insert_consumer(self.db()?, consumer).await
    }

    async fn get_consumer(&self, id: &str) -> Result<Option<Consumer>, SmelinxError> {
        queries::consumers::get_consumer(self.db()?, id).await
    }

    async fn list_consumers(&self, api_id: &str) -> Result<Vec<Consumer>, SmelinxError> {
        queries::consumers::list_consumers(self.db()?, api_id).await
    }

    async fn delete_consumer(&self, id: &str) -> Result<(), SmelinxError> {
        queries::consumers::delete_consumer(self.db()?, id).await
    }
}

#[async_trait]
impl NotificationStore for SqliteStorage {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), SmelinxError> {
        queries::notifications::insert_notification(self.db()?, notification).await
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, SmelinxError> {
        queries::notifications::get_notification(self.db()?, id).await
    }

    async fn list_notifications(&self, api_id: &str) -> Result<Vec<Notification>, SmelinxError> {
        queries::notifications::list_notifications(self.db()?, api_id).await
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DueNotification>, SmelinxError> {
        queries::notifications::list_due(self.db()?, now, limit).await
    }

    async fn set_status(
        &self,
        id: &str,
        status: NotificationStatus,
    ) -> Result<Notification, SmelinxError> {
        queries::notifications::set_status(self.db()?, id, status).await
    }

    async fn delete_notification(&self, id: &str) -> Result<(), SmelinxError> {
        queries::notifications::delete_notification(self.db()?, id).await
    }

    async fn claim(
        &self,
        id: &str,
        token: &str,
        due_at: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
    ) -> Result<Option<Claim>, SmelinxError> {
        queries::notifications::claim(self.db()?, id, token, due_at, claimed_at).await
    }

    async fn mark_sent(&self, claim: &Claim, attempts: u32) -> Result<(), SmelinxError> {
        queries::notifications::mark_sent(self.db()?, claim, attempts).await
    }

    async fn mark_retry(
        &self,
        claim: &Claim,
        attempts: u32,
        retry_after: DateTime<Utc>,
        error: &str,
    ) -> Result<(), SmelinxError> {
        queries::notifications::mark_retry(self.db()?, claim, attempts, retry_after, error).await
    }

    async fn mark_failed(
        &self,
        claim: &Claim,
        attempts: u32,
        error: &str,
    ) -> Result<(), SmelinxError> {
        queries::notifications::mark_failed(self.db()?, claim, attempts, error).await
    }

    async fn release_claim(&self, claim: &Claim, reason: &str) -> Result<(), SmelinxError> {
        queries::notifications::release_claim(self.db()?, claim, reason).await
    }

    async fn reclaim_stale(&self, cutoff: DateTime<Utc>) -> Result<usize, SmelinxError> {
        queries::notifications::reclaim_stale(self.db()?, cutoff).await
    }
}

#[async_trait]
impl ConsumerDirectory for SqliteStorage {
    async fn recipients(&self, api_id: &str) -> Result<Vec<String>, SmelinxError> {
        queries::consumers::recipients(self.db()?, api_id).await
    }
}
