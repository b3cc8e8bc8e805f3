// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: backend lifecycle and the registry record store.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SmelinxError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Api, CascadeSummary, Consumer, Version, VersionStatus};

/// Adapter for storage and persistence backends.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), SmelinxError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), SmelinxError>;
}

/// Persistence for APIs, versions and consumers.
///
/// Implementations are not org-aware; scoping is enforced by the registry
/// before any call reaches the store.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn insert_api(&self, api: &Api) -> Result<(), SmelinxError>;

    async fn get_api(&self, id: &str) -> Result<Option<Api>, SmelinxError>;

    /// All APIs of one organization, newest first.
    async fn list_apis(&self, org_id: &str) -> Result<Vec<Api>, SmelinxError>;

    /// Overwrite the mutable columns of an existing API.
    async fn update_api(&self, api: &Api) -> Result<(), SmelinxError>;

    /// Delete an API with every version, notification and consumer under it,
    /// in one transaction.
    async fn delete_api(&self, id: &str) -> Result<CascadeSummary, SmelinxError>;

    /// Insert a version. A duplicate label within the API is a `Conflict`.
    async fn insert_version(&self, version: &Version) -> Result<(), SmelinxError>;

    async fn get_version(&self, id: &str) -> Result<Option<Version>, SmelinxError>;

    /// Versions of one API, newest first.
    async fn list_versions(&self, api_id: &str) -> Result<Vec<Version>, SmelinxError>;

    async fn update_version_status(
        &self,
        id: &str,
        status: VersionStatus,
        sunset_date: Option<NaiveDate>,
    ) -> Result<Version, SmelinxError>;

    /// Delete a version and its notifications in one transaction.
    /// Returns the number of notifications removed.
    async fn delete_version(&self, id: &str) -> Result<usize, SmelinxError>;

    /// Insert a consumer. A duplicate email within the API is a `Conflict`.
    async fn insert_consumer(&self, consumer: &Consumer) -> Result<(), SmelinxError>;

    async fn get_consumer(&self, id: &str) -> Result<Option<Consumer>, SmelinxError>;

    async fn list_consumers(&self, api_id: &str) -> Result<Vec<Consumer>, SmelinxError>;

    async fn delete_consumer(&self, id: &str) -> Result<(), SmelinxError>;
}
