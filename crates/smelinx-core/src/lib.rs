// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Smelinx API lifecycle service.
//!
//! This crate provides the domain types, error taxonomy, lifecycle rules and
//! collaborator traits used throughout the Smelinx workspace. Storage,
//! delivery and session adapters implement traits defined here.

pub mod error;
pub mod lifecycle;
pub mod time;
pub mod traits;
pub mod types;

pub use error::SmelinxError;
pub use types::{
    AdapterType, Api, ApiPatch, CascadeSummary, Claim, Consumer, Delivery, DueNotification,
    HealthStatus, Notification, NotificationKind, NotificationStatus, Version, VersionStatus,
};

pub use traits::{
    ConsumerDirectory, DeliveryGateway, NotificationStore, PluginAdapter, RegistryStore,
    SessionValidator, StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _validation = SmelinxError::Validation("test".into());
        let _not_found = SmelinxError::not_found("api", "a1");
        let _conflict = SmelinxError::Conflict("dup".into());
        let _unauthorized = SmelinxError::Unauthorized;
        let _delivery = SmelinxError::delivery("smtp down");
        let _storage = SmelinxError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _config = SmelinxError::Config("test".into());
        let _timeout = SmelinxError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _internal = SmelinxError::Internal("test".into());
    }

    #[test]
    fn only_delivery_and_timeout_are_retryable() {
        assert!(SmelinxError::delivery("x").is_retryable());
        assert!(
            SmelinxError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(!SmelinxError::Validation("x".into()).is_retryable());
        assert!(!SmelinxError::Conflict("x".into()).is_retryable());
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = SmelinxError::not_found("version", "v-42");
        assert_eq!(err.to_string(), "version not found: v-42");
    }

    #[test]
    fn status_parsing_is_trimmed_and_case_insensitive() {
        assert_eq!(
            VersionStatus::parse("  Deprecated ").unwrap(),
            VersionStatus::Deprecated
        );
        assert!(VersionStatus::parse("retired").is_err());
        assert_eq!(NotificationKind::parse("SUNSET").unwrap(), NotificationKind::Sunset);
        assert!(NotificationKind::parse("reminder").is_err());
    }

    #[test]
    fn manual_status_rejects_sending() {
        assert_eq!(
            NotificationStatus::parse_manual("canceled").unwrap(),
            NotificationStatus::Canceled
        );
        assert!(NotificationStatus::parse_manual("sending").is_err());
        assert!(NotificationStatus::parse_manual("bogus").is_err());
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&NotificationStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(VersionStatus::Sunset.to_string(), "sunset");
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let n = Notification {
            id: "n1".into(),
            api_id: "a1".into(),
            version_id: "v1".into(),
            kind: NotificationKind::Deprecate,
            scheduled_at: chrono::Utc::now(),
            status: NotificationStatus::Pending,
            attempts: 0,
            retry_after: None,
            last_error: None,
            claimed_at: None,
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "deprecate");
        assert!(json.get("retry_after").is_none());
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_registry_store<T: RegistryStore>() {}
        fn _assert_notification_store<T: NotificationStore>() {}
        fn _assert_consumer_directory<T: ConsumerDirectory>() {}
        fn _assert_delivery_gateway<T: DeliveryGateway>() {}
        fn _assert_session_validator<T: SessionValidator>() {}
    }
}
