// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles SQLite storage on a temp database, the registry,
//! and a [`ScriptedGateway`], and builds dispatchers wired to all three.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use smelinx_config::model::StorageConfig;
use smelinx_core::{Api, Notification, SmelinxError, StorageAdapter, Version};
use smelinx_dispatch::{DispatchSettings, Dispatcher};
use smelinx_registry::{NewApi, NewNotification, NewVersion, Registry};
use smelinx_storage::SqliteStorage;

use crate::scripted_gateway::{ScriptedGateway, Step};

/// Organization used by [`TestHarness::seed_due`].
pub const TEST_ORG: &str = "org-test";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    steps: Vec<Step>,
    settings: DispatchSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            settings: DispatchSettings::default(),
        }
    }

    /// Script the delivery gateway's first outcomes.
    pub fn with_script(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.settings.max_attempts = max_attempts;
        self
    }

    pub fn with_fallback_recipient(mut self, address: impl Into<String>) -> Self {
        self.settings.fallback_recipient = Some(address.into());
        self
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, SmelinxError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| SmelinxError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let registry = Registry::new(storage.clone(), storage.clone());
        let gateway = Arc::new(ScriptedGateway::with_script(self.steps));

        Ok(TestHarness {
            storage,
            registry,
            gateway,
            settings: self.settings,
            _temp_dir: temp_dir,
        })
    }
}

/// An API, one of its versions, and a notification scheduled against it.
#[derive(Debug, Clone)]
pub struct Seeded {
    pub api: Api,
    pub version: Version,
    pub notification: Notification,
}

/// A complete test environment with a scripted gateway and temp storage.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub registry: Registry,
    pub gateway: Arc<ScriptedGateway>,
    /// Settings handed to every dispatcher built by [`TestHarness::dispatcher`].
    pub settings: DispatchSettings,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A dispatcher over this harness's storage and scripted gateway.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.storage.clone(),
            self.storage.clone(),
            self.gateway.clone(),
            self.settings.clone(),
        )
    }

    /// Seed "Payments" v1 (deprecated, sunset 2025-12-01) with a deprecation
    /// notice scheduled at `scheduled_at`.
    ///
    /// `contact_email` becomes the API's contact, and so its only recipient.
    pub async fn seed_due(
        &self,
        contact_email: Option<&str>,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Seeded, SmelinxError> {
        let api = self
            .registry
            .create_api(
                TEST_ORG,
                NewApi {
                    name: "Payments".into(),
                    description: "Card payments".into(),
                    base_url: Some("https://pay.example.com".into()),
                    docs_url: Some("https://docs.example.com/payments".into()),
                    contact_email: contact_email.map(str::to_string),
                    owner_team: None,
                },
            )
            .await?;
        let version = self
            .registry
            .create_version(
                TEST_ORG,
                &api.id,
                NewVersion {
                    version: "v1".into(),
                    status: Some("deprecated".into()),
                    sunset_date: Some("2025-12-01".into()),
                },
            )
            .await?;
        let notification = self
            .registry
            .create_notification(
                TEST_ORG,
                &api.id,
                NewNotification {
                    version_id: version.id.clone(),
                    kind: "deprecate".into(),
                    scheduled_at: scheduled_at.to_rfc3339(),
                },
            )
            .await?;

        Ok(Seeded {
            api,
            version,
            notification,
        })
    }

    /// Reload a notification by id.
    pub async fn notification(&self, id: &str) -> Result<Notification, SmelinxError> {
        use smelinx_core::NotificationStore;

        self.storage
            .get_notification(id)
            .await?
            .ok_or_else(|| SmelinxError::not_found("notification", id))
    }
}
