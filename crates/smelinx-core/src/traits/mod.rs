// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod auth;
pub mod delivery;
pub mod directory;
pub mod notification;
pub mod storage;

pub use adapter::PluginAdapter;
pub use auth::SessionValidator;
pub use delivery::DeliveryGateway;
pub use directory::ConsumerDirectory;
pub use notification::NotificationStore;
pub use storage::{RegistryStore, StorageAdapter};
