// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Smelinx registry.
//!
//! Exposes org-scoped CRUD for APIs, versions, notifications and consumers
//! as JSON over axum, authenticated by bearer tokens that each resolve to an
//! organization.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{OrgContext, StaticTokenValidator};
pub use error::{ApiError, ErrorResponse};
pub use server::{AppState, ServerConfig, router, start_server};
