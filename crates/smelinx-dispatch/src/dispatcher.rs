// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The polling dispatcher.
//!
//! Each cycle reverts abandoned claims, fetches due notifications and runs
//! one delivery attempt per notification on a bounded worker pool. A worker
//! only touches a notification after winning its claim, so several
//! dispatchers may share one database.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use smelinx_core::{
    Claim, ConsumerDirectory, Delivery, DeliveryGateway, DueNotification, NotificationStore,
    SmelinxError,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::settings::DispatchSettings;

/// Counters for one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Notifications returned by the due query.
    pub due: usize,
    /// Notifications this dispatcher claimed.
    pub claimed: usize,
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
    /// Claimed but released because nobody was addressed.
    pub skipped: usize,
    /// Claims lost to another worker, before or after delivery.
    pub conflicts: usize,
    pub errors: usize,
    /// Stale `sending` claims reverted to `pending` at cycle start.
    pub reclaimed: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: Outcome) {
        if outcome.was_claimed() {
            self.claimed += 1;
        }
        match outcome {
            Outcome::Sent => self.sent += 1,
            Outcome::Retried => self.retried += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Lost | Outcome::LostAfterDelivery => self.conflicts += 1,
            Outcome::ClaimError | Outcome::Errored => self.errors += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent,
    Retried,
    Failed,
    Skipped,
    /// Another worker holds the notification.
    Lost,
    /// Delivery ran but the claim expired before the result was written.
    LostAfterDelivery,
    ClaimError,
    Errored,
}

impl Outcome {
    fn was_claimed(self) -> bool {
        !matches!(self, Outcome::Lost | Outcome::ClaimError)
    }
}

/// Longest `last_error` kept on a notification, in characters.
const MAX_ERROR_CHARS: usize = 500;

fn truncate_error(message: String) -> String {
    match message.char_indices().nth(MAX_ERROR_CHARS) {
        Some((cut, _)) => message[..cut].to_string(),
        None => message,
    }
}

fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Polls the notification store and delivers due notifications.
///
/// Cheap to clone; clones share the worker pool.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn ConsumerDirectory>,
    gateway: Arc<dyn DeliveryGateway>,
    settings: Arc<DispatchSettings>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        directory: Arc<dyn ConsumerDirectory>,
        gateway: Arc<dyn DeliveryGateway>,
        settings: DispatchSettings,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrency.max(1)));
        Self {
            store,
            directory,
            gateway,
            settings: Arc::new(settings),
            permits,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Run cycles every `poll_interval` until `cancel` fires.
    ///
    /// A cycle already in progress when cancellation arrives runs to
    /// completion; each of its attempts is bounded by the send timeout.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            max_concurrency = self.settings.max_concurrency,
            gateway = self.gateway.name(),
            "dispatcher started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.run_cycle(Utc::now()).await;
                    if report.due > 0 || report.reclaimed > 0 || report.errors > 0 {
                        info!(
                            due = report.due,
                            sent = report.sent,
                            retried = report.retried,
                            failed = report.failed,
                            skipped = report.skipped,
                            conflicts = report.conflicts,
                            errors = report.errors,
                            reclaimed = report.reclaimed,
                            "dispatch cycle complete"
                        );
                    } else {
                        debug!("dispatch cycle found nothing due");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// One poll: reclaim, fetch due notifications, attempt each, and wait
    /// for every attempt to finish.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        let cutoff = now
            .checked_sub_signed(delta(self.settings.claim_grace))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        match self.store.reclaim_stale(cutoff).await {
            Ok(0) => {}
            Ok(n) => {
                warn!(count = n, cutoff = %cutoff, "reverted stale claims to pending");
                report.reclaimed = n;
            }
            Err(e) => {
                error!(error = %e, "failed to reclaim stale claims");
                report.errors += 1;
            }
        }

        let due = match self.store.list_due(now, self.settings.batch_limit).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "failed to list due notifications");
                report.errors += 1;
                return report;
            }
        };
        report.due = due.len();

        let mut tasks = JoinSet::new();
        for item in due {
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                report.errors += 1;
                continue;
            };
            let worker = self.clone();
            tasks.spawn(async move {
                let outcome = worker.attempt(item, now).await;
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(error = %e, "delivery task aborted");
                    report.errors += 1;
                }
            }
        }

        report
    }

    async fn attempt(&self, due: DueNotification, now: DateTime<Utc>) -> Outcome {
        let id = due.notification.id.clone();
        let token = Uuid::new_v4().to_string();

        // Workers queued behind the pool claim later than the cycle start.
        let claimed_at = Utc::now().max(now);
        let claim = match self.store.claim(&id, &token, now, claimed_at).await {
            Ok(Some(claim)) => claim,
            Ok(None) => {
                debug!(notification_id = %id, "claim lost to another worker");
                return Outcome::Lost;
            }
            Err(e) => {
                warn!(notification_id = %id, error = %e, "claim failed; retrying next cycle");
                return Outcome::ClaimError;
            }
        };

        let recipients = match self.audience(&due.notification.api_id).await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(notification_id = %id, error = %e, "recipient lookup failed");
                self.release(&claim, "recipient lookup failed").await;
                return Outcome::Errored;
            }
        };
        if recipients.is_empty() {
            warn!(
                notification_id = %id,
                api_id = %due.notification.api_id,
                "no recipients; notification left pending"
            );
            self.release(&claim, "no recipients").await;
            return Outcome::Skipped;
        }

        let attempt = claim.attempts + 1;
        let delivery = Delivery {
            notification_id: id.clone(),
            recipients,
            api_name: due.api_name,
            version_label: due.version_label,
            kind: due.notification.kind,
            sunset_date: due.sunset_date,
            scheduled_at: due.notification.scheduled_at,
            base_url: due.base_url,
            docs_url: due.docs_url,
        };

        let timeout = self.settings.send_timeout;
        let result = match tokio::time::timeout(timeout, self.gateway.send(&delivery)).await {
            Ok(result) => result,
            Err(_) => Err(SmelinxError::Timeout { duration: timeout }),
        };

        match result {
            Ok(()) => {
                let written = self.store.mark_sent(&claim, attempt).await;
                self.settle(&claim, written, Outcome::Sent, || {
                    info!(
                        notification_id = %id,
                        attempt,
                        recipients = delivery.recipients.len(),
                        at = %now,
                        "notification sent"
                    );
                })
            }
            Err(e) => {
                let message = truncate_error(e.to_string());
                if attempt >= self.settings.max_attempts || !e.is_retryable() {
                    let written = self.store.mark_failed(&claim, attempt, &message).await;
                    self.settle(&claim, written, Outcome::Failed, || {
                        warn!(
                            notification_id = %id,
                            attempt,
                            error = %message,
                            at = %now,
                            "notification failed permanently"
                        );
                    })
                } else {
                    let backoff = self.settings.backoff(attempt);
                    let retry_after = now
                        .checked_add_signed(delta(backoff))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC);
                    let written = self
                        .store
                        .mark_retry(&claim, attempt, retry_after, &message)
                        .await;
                    self.settle(&claim, written, Outcome::Retried, || {
                        warn!(
                            notification_id = %id,
                            attempt,
                            error = %message,
                            retry_after = %retry_after,
                            at = %now,
                            "delivery failed; retry scheduled"
                        );
                    })
                }
            }
        }
    }

    /// Map a write-back result to the final outcome, logging on success.
    fn settle(
        &self,
        claim: &Claim,
        written: Result<(), SmelinxError>,
        outcome: Outcome,
        log: impl FnOnce(),
    ) -> Outcome {
        match written {
            Ok(()) => {
                log();
                outcome
            }
            Err(SmelinxError::Conflict(_)) => {
                warn!(
                    notification_id = %claim.notification_id,
                    "claim expired before the delivery result was recorded"
                );
                Outcome::LostAfterDelivery
            }
            Err(e) => {
                error!(
                    notification_id = %claim.notification_id,
                    error = %e,
                    "failed to record delivery result"
                );
                Outcome::Errored
            }
        }
    }

    async fn release(&self, claim: &Claim, reason: &str) {
        if let Err(e) = self.store.release_claim(claim, reason).await {
            warn!(
                notification_id = %claim.notification_id,
                error = %e,
                "failed to release claim; it will be reclaimed after the grace period"
            );
        }
    }

    async fn audience(&self, api_id: &str) -> Result<Vec<String>, SmelinxError> {
        let recipients = self.directory.recipients(api_id).await?;
        if !recipients.is_empty() {
            return Ok(recipients);
        }
        Ok(self.settings.fallback_recipient.iter().cloned().collect())
    }
}
