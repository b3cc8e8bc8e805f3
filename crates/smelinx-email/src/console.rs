// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log-only delivery gateway, used when no SMTP relay is configured.

use async_trait::async_trait;
use tracing::info;

use smelinx_core::{AdapterType, Delivery, DeliveryGateway, HealthStatus, PluginAdapter, SmelinxError};

use crate::render;

/// Writes each notice to the log instead of sending it. Never fails.
#[derive(Debug, Default)]
pub struct ConsoleGateway;

impl ConsoleGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for ConsoleGateway {
    fn name(&self) -> &str {
        "console"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Delivery
    }

    async fn health_check(&self) -> Result<HealthStatus, SmelinxError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmelinxError> {
        Ok(())
    }
}

#[async_trait]
impl DeliveryGateway for ConsoleGateway {
    async fn send(&self, delivery: &Delivery) -> Result<(), SmelinxError> {
        let notice = render::render(delivery);
        info!(
            notification_id = %delivery.notification_id,
            to = %delivery.recipients.join(", "),
            subject = %notice.subject,
            "notice (console delivery)\n{}",
            notice.text
        );
        Ok(())
    }
}
