// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::SmelinxError;

/// Read-only lookup of who should hear about an API's lifecycle changes.
#[async_trait]
pub trait ConsumerDirectory: Send + Sync {
    /// Deduplicated recipient addresses for `api_id`. May be empty.
    async fn recipients(&self, api_id: &str) -> Result<Vec<String>, SmelinxError>;
}
