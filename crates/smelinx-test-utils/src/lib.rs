// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Smelinx integration tests.
//!
//! Provides a scripted delivery gateway and a harness over a temp SQLite
//! database for fast, deterministic tests without an SMTP server.
//!
//! # Components
//!
//! - [`ScriptedGateway`] - Delivery gateway replaying scripted outcomes
//! - [`TestHarness`] - Storage, registry and dispatcher on a temp database

pub mod harness;
pub mod scripted_gateway;

pub use harness::{Seeded, TEST_ORG, TestHarness};
pub use scripted_gateway::{ScriptedGateway, Step};
