// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery gateway that replays scripted outcomes.
//!
//! `ScriptedGateway` implements `DeliveryGateway` without any network I/O.
//! Each `send` pops the next [`Step`] from a FIFO script; once the script is
//! exhausted every call succeeds. Calls and deliveries are recorded for
//! assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use smelinx_core::traits::adapter::PluginAdapter;
use smelinx_core::traits::delivery::DeliveryGateway;
use smelinx_core::types::{AdapterType, Delivery, HealthStatus};
use smelinx_core::SmelinxError;

/// One scripted reaction to a `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Succeed,
    /// Fail with a retryable delivery error carrying this message.
    Fail(String),
    /// Sleep for the given duration, then succeed. Used to exercise timeouts.
    Stall(Duration),
}

impl Step {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<Step>>>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    /// A gateway whose every call succeeds.
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(steps: Vec<Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            deliveries: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// A gateway that fails the next `n` calls.
    pub fn failing(n: usize) -> Self {
        Self::with_script((0..n).map(|i| Step::fail(format!("scripted failure {}", i + 1))).collect())
    }

    /// Append a step to the end of the script.
    pub async fn push(&self, step: Step) {
        self.script.lock().await.push_back(step);
    }

    /// Number of `send` calls made so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every delivery passed to `send`, in call order.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Delivery
    }

    async fn health_check(&self) -> Result<HealthStatus, SmelinxError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmelinxError> {
        Ok(())
    }
}

#[async_trait]
impl DeliveryGateway for ScriptedGateway {
    async fn send(&self, delivery: &Delivery) -> Result<(), SmelinxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.deliveries.lock().await.push(delivery.clone());

        let step = self.script.lock().await.pop_front().unwrap_or(Step::Succeed);
        match step {
            Step::Succeed => Ok(()),
            Step::Fail(message) => Err(SmelinxError::delivery(message)),
            Step::Stall(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }
}
