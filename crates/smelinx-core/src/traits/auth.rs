// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session validation for inbound API calls.

use async_trait::async_trait;

use crate::error::SmelinxError;
use crate::traits::adapter::PluginAdapter;

/// Resolves a bearer token to the organization it acts for.
#[async_trait]
pub trait SessionValidator: PluginAdapter {
    /// Returns the organization id, or [`SmelinxError::Unauthorized`].
    async fn validate(&self, token: &str) -> Result<String, SmelinxError>;
}
