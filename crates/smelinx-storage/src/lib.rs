// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Smelinx API lifecycle service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed CRUD for APIs, versions,
//! notifications and consumers, and the claim-guarded dispatcher protocol.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
