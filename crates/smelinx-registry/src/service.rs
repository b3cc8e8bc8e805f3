// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The registry service: org-scoped CRUD over APIs and everything under them.
//!
//! Every operation takes the caller's organization. A record belonging to
//! another organization is reported as `NotFound`, never as forbidden, so
//! callers cannot probe for foreign ids.

use std::sync::Arc;

use chrono::Utc;
use smelinx_core::lifecycle::resolve_sunset_date;
use smelinx_core::time::{parse_date, parse_instant};
use smelinx_core::{
    Api, ApiPatch, CascadeSummary, Consumer, Notification, NotificationKind, NotificationStatus,
    NotificationStore, RegistryStore, SmelinxError, Version, VersionStatus,
};
use tracing::info;
use uuid::Uuid;

use crate::requests::{
    NewApi, NewConsumer, NewNotification, NewVersion, NotificationStatusChange,
    VersionStatusChange,
};
use crate::validate;

#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn RegistryStore>,
    notifications: Arc<dyn NotificationStore>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Registry {
    pub fn new(store: Arc<dyn RegistryStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Load an API and check it belongs to `org_id`.
    async fn owned_api(&self, org_id: &str, api_id: &str) -> Result<Api, SmelinxError> {
        match self.store.get_api(api_id).await? {
            Some(api) if api.org_id == org_id => Ok(api),
            _ => Err(SmelinxError::not_found("api", api_id)),
        }
    }

    async fn owned_version(
        &self,
        org_id: &str,
        version_id: &str,
    ) -> Result<Version, SmelinxError> {
        let version = self
            .store
            .get_version(version_id)
            .await?
            .ok_or_else(|| SmelinxError::not_found("version", version_id))?;
        self.owned_api(org_id, &version.api_id)
            .await
            .map_err(|_| SmelinxError::not_found("version", version_id))?;
        Ok(version)
    }

    async fn owned_notification(
        &self,
        org_id: &str,
        id: &str,
    ) -> Result<Notification, SmelinxError> {
        let notification = self
            .notifications
            .get_notification(id)
            .await?
            .ok_or_else(|| SmelinxError::not_found("notification", id))?;
        self.owned_api(org_id, &notification.api_id)
            .await
            .map_err(|_| SmelinxError::not_found("notification", id))?;
        Ok(notification)
    }

    // --- APIs ---

    pub async fn create_api(&self, org_id: &str, req: NewApi) -> Result<Api, SmelinxError> {
        let name = validate::required(&req.name, "name")?;
        let contact_email = match validate::optional(req.contact_email) {
            Some(raw) => Some(validate::email(&raw, "invalid contact_email")?),
            None => None,
        };
        let api = Api {
            id: new_id(),
            org_id: org_id.to_string(),
            name,
            description: req.description.trim().to_string(),
            base_url: validate::optional(req.base_url),
            docs_url: validate::optional(req.docs_url),
            contact_email,
            owner_team: validate::optional(req.owner_team),
            created_at: Utc::now(),
        };
        self.store.insert_api(&api).await?;
        info!(api_id = %api.id, org_id, "api created");
        Ok(api)
    }

    pub async fn list_apis(&self, org_id: &str) -> Result<Vec<Api>, SmelinxError> {
        self.store.list_apis(org_id).await
    }

    pub async fn get_api(&self, org_id: &str, api_id: &str) -> Result<Api, SmelinxError> {
        self.owned_api(org_id, api_id).await
    }

    /// Partial update: absent fields keep their current value, and a blank
    /// name is ignored.
    pub async fn update_api(
        &self,
        org_id: &str,
        api_id: &str,
        patch: ApiPatch,
    ) -> Result<Api, SmelinxError> {
        let mut api = self.owned_api(org_id, api_id).await?;

        if let Some(raw) = patch.contact_email {
            api.contact_email = match validate::optional(Some(raw)) {
                Some(email) => Some(validate::email(&email, "invalid contact_email")?),
                None => None,
            };
        }
        if let Some(name) = patch.name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            api.name = name.to_string();
        }
        if let Some(description) = patch.description {
            api.description = description.trim().to_string();
        }
        if let Some(base_url) = patch.base_url {
            api.base_url = validate::optional(Some(base_url));
        }
        if let Some(docs_url) = patch.docs_url {
            api.docs_url = validate::optional(Some(docs_url));
        }
        if let Some(owner_team) = patch.owner_team {
            api.owner_team = validate::optional(Some(owner_team));
        }

        self.store.update_api(&api).await?;
        Ok(api)
    }

    pub async fn delete_api(
        &self,
        org_id: &str,
        api_id: &str,
    ) -> Result<CascadeSummary, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        let summary = self.store.delete_api(api_id).await?;
        info!(
            api_id,
            versions = summary.versions,
            notifications = summary.notifications,
            consumers = summary.consumers,
            "api deleted"
        );
        Ok(summary)
    }

    // --- Versions ---

    pub async fn create_version(
        &self,
        org_id: &str,
        api_id: &str,
        req: NewVersion,
    ) -> Result<Version, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        let label = validate::required(&req.version, "version")?;
        let status = match req.status.as_deref().map(str::trim) {
            None | Some("") => VersionStatus::Active,
            Some(raw) => VersionStatus::parse(raw)?,
        };
        let requested = parse_date(req.sunset_date.as_deref())?;
        let sunset_date = resolve_sunset_date(status, requested, None)?;

        let version = Version {
            id: new_id(),
            api_id: api_id.to_string(),
            version: label,
            status,
            sunset_date,
            created_at: Utc::now(),
        };
        self.store.insert_version(&version).await?;
        info!(version_id = %version.id, api_id, status = %status, "version created");
        Ok(version)
    }

    pub async fn list_versions(
        &self,
        org_id: &str,
        api_id: &str,
    ) -> Result<Vec<Version>, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        self.store.list_versions(api_id).await
    }

    /// Move a version to a new lifecycle status.
    pub async fn update_version_status(
        &self,
        org_id: &str,
        version_id: &str,
        req: VersionStatusChange,
    ) -> Result<Version, SmelinxError> {
        let current = self.owned_version(org_id, version_id).await?;
        let status = VersionStatus::parse(&req.status)?;
        let requested = parse_date(req.sunset_date.as_deref())?;
        let sunset_date = resolve_sunset_date(status, requested, current.sunset_date)?;

        let updated = self
            .store
            .update_version_status(version_id, status, sunset_date)
            .await?;
        info!(
            version_id,
            from = %current.status,
            to = %updated.status,
            "version status changed"
        );
        Ok(updated)
    }

    pub async fn delete_version(&self, org_id: &str, version_id: &str) -> Result<(), SmelinxError> {
        self.owned_version(org_id, version_id).await?;
        let removed = self.store.delete_version(version_id).await?;
        info!(version_id, notifications = removed, "version deleted");
        Ok(())
    }

    // --- Notifications ---

    pub async fn create_notification(
        &self,
        org_id: &str,
        api_id: &str,
        req: NewNotification,
    ) -> Result<Notification, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        let version_id = validate::required(&req.version_id, "version_id")?;
        let kind = NotificationKind::parse(&req.kind)?;
        let scheduled_at = parse_instant(&req.scheduled_at)?;

        match self.store.get_version(&version_id).await? {
            Some(version) if version.api_id == api_id => {}
            _ => {
                return Err(SmelinxError::Validation(
                    "version does not belong to api".to_string(),
                ));
            }
        }

        let notification = Notification {
            id: new_id(),
            api_id: api_id.to_string(),
            version_id,
            kind,
            scheduled_at,
            status: NotificationStatus::Pending,
            attempts: 0,
            retry_after: None,
            last_error: None,
            claimed_at: None,
            created_at: Utc::now(),
        };
        self.notifications.insert_notification(&notification).await?;
        info!(
            notification_id = %notification.id,
            api_id,
            kind = %kind,
            scheduled_at = %notification.scheduled_at,
            "notification scheduled"
        );
        Ok(notification)
    }

    pub async fn list_notifications(
        &self,
        org_id: &str,
        api_id: &str,
    ) -> Result<Vec<Notification>, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        self.notifications.list_notifications(api_id).await
    }

    /// Manual status override. Accepts pending, sent, canceled or failed.
    pub async fn update_notification_status(
        &self,
        org_id: &str,
        id: &str,
        req: NotificationStatusChange,
    ) -> Result<Notification, SmelinxError> {
        let status = NotificationStatus::parse_manual(&req.status)?;
        self.owned_notification(org_id, id).await?;
        let updated = self.notifications.set_status(id, status).await?;
        info!(notification_id = id, status = %status, "notification status overridden");
        Ok(updated)
    }

    pub async fn delete_notification(&self, org_id: &str, id: &str) -> Result<(), SmelinxError> {
        self.owned_notification(org_id, id).await?;
        self.notifications.delete_notification(id).await
    }

    // --- Consumers ---

    pub async fn create_consumer(
        &self,
        org_id: &str,
        api_id: &str,
        req: NewConsumer,
    ) -> Result<Consumer, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        let email = validate::email(&req.email, "invalid email")?.to_ascii_lowercase();
        let consumer = Consumer {
            id: new_id(),
            api_id: api_id.to_string(),
            email,
            name: validate::optional(req.name),
            created_at: Utc::now(),
        };
        self.store.insert_consumer(&consumer).await?;
        Ok(consumer)
    }

    pub async fn list_consumers(
        &self,
        org_id: &str,
        api_id: &str,
    ) -> Result<Vec<Consumer>, SmelinxError> {
        self.owned_api(org_id, api_id).await?;
        self.store.list_consumers(api_id).await
    }

    pub async fn delete_consumer(&self, org_id: &str, id: &str) -> Result<(), SmelinxError> {
        let consumer = self
            .store
            .get_consumer(id)
            .await?
            .ok_or_else(|| SmelinxError::not_found("consumer", id))?;
        self.owned_api(org_id, &consumer.api_id)
            .await
            .map_err(|_| SmelinxError::not_found("consumer", id))?;
        self.store.delete_consumer(id).await
    }
}
