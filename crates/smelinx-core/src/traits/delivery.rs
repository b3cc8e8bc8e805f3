// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery gateway trait for outbound announcements.

use async_trait::async_trait;

use crate::error::SmelinxError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Delivery;

/// Adapter that hands a rendered announcement to an outbound provider.
///
/// Transient failures are reported as [`SmelinxError::Delivery`] or
/// [`SmelinxError::Timeout`]; the dispatcher retries those.
#[async_trait]
pub trait DeliveryGateway: PluginAdapter {
    async fn send(&self, delivery: &Delivery) -> Result<(), SmelinxError>;
}
