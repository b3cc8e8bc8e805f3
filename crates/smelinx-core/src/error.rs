// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Smelinx lifecycle service.

use thiserror::Error;

/// The primary error type used across all Smelinx traits and core operations.
#[derive(Debug, Error)]
pub enum SmelinxError {
    /// Malformed or policy-violating input (missing sunset date, mismatched
    /// version/API, unparseable timestamp).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist (or is not visible to the caller).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conflicting write: duplicate key or a lost dispatcher claim.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller presented no valid session.
    #[error("unauthorized")]
    Unauthorized,

    /// Transient delivery failure (provider or network). Retried by the dispatcher.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SmelinxError {
    /// Shorthand for a [`SmelinxError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a [`SmelinxError::Delivery`] without an underlying source.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the dispatcher should treat this error as a retryable delivery failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Delivery { .. } | Self::Timeout { .. })
    }
}
