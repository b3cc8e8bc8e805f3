// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Org-scoped registry for APIs, versions, notifications and consumers.
//!
//! The [`Registry`] validates caller input, enforces the version lifecycle
//! rules and organization scoping, then delegates persistence to the
//! [`RegistryStore`](smelinx_core::RegistryStore) and
//! [`NotificationStore`](smelinx_core::NotificationStore) traits.

pub mod requests;
pub mod service;
mod validate;

pub use requests::{
    NewApi, NewConsumer, NewNotification, NewVersion, NotificationStatusChange,
    VersionStatusChange,
};
pub use service::Registry;
pub use validate::is_valid_email;
