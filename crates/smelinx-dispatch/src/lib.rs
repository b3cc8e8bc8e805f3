// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler and dispatcher loop for lifecycle notifications.
//!
//! The [`Dispatcher`] polls the notification store on a fixed interval,
//! claims due notifications, delivers them through a
//! [`DeliveryGateway`](smelinx_core::DeliveryGateway) under a per-attempt
//! timeout, and records sent, retry or failed outcomes with exponential
//! backoff between attempts.

pub mod dispatcher;
pub mod settings;

pub use dispatcher::{CycleReport, Dispatcher};
pub use settings::DispatchSettings;
