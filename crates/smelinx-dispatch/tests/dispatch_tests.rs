// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the dispatcher against real SQLite storage.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use smelinx_core::{
    Claim, DueNotification, Notification, NotificationStatus, NotificationStore, SmelinxError,
};
use smelinx_dispatch::{DispatchSettings, Dispatcher};
use smelinx_test_utils::{Step, TestHarness};
use tokio_util::sync::CancellationToken;

const CONTACT: &str = "owners@example.com";

/// Storage whose first claim of one notification fails with a storage error.
struct FlakyClaimStore {
    inner: Arc<dyn NotificationStore>,
    failing_id: String,
    tripped: AtomicBool,
}

#[async_trait]
impl NotificationStore for FlakyClaimStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), SmelinxError> {
        self.inner.insert_notification(notification).await
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, SmelinxError> {
        self.inner.get_notification(id).await
    }

    async fn list_notifications(&self, api_id: &str) -> Result<Vec<Notification>, SmelinxError> {
        self.inner.list_notifications(api_id).await
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DueNotification>, SmelinxError> {
        self.inner.list_due(now, limit).await
    }

    async fn set_status(
        &self,
        id: &str,
        status: NotificationStatus,
    ) -> Result<Notification, SmelinxError> {
        self.inner.set_status(id, status).await
    }

    async fn delete_notification(&self, id: &str) -> Result<(), SmelinxError> {
        self.inner.delete_notification(id).await
    }

    async fn claim(
        &self,
        id: &str,
        token: &str,
        due_at: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
    ) -> Result<Option<Claim>, SmelinxError> {
        if id == self.failing_id && !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(SmelinxError::Storage {
                source: "database is locked".into(),
            });
        }
        self.inner.claim(id, token, due_at, claimed_at).await
    }

    async fn mark_sent(&self, claim: &Claim, attempts: u32) -> Result<(), SmelinxError> {
        self.inner.mark_sent(claim, attempts).await
    }

    async fn mark_retry(
        &self,
        claim: &Claim,
        attempts: u32,
        retry_after: DateTime<Utc>,
        error: &str,
    ) -> Result<(), SmelinxError> {
        self.inner.mark_retry(claim, attempts, retry_after, error).await
    }

    async fn mark_failed(
        &self,
        claim: &Claim,
        attempts: u32,
        error: &str,
    ) -> Result<(), SmelinxError> {
        self.inner.mark_failed(claim, attempts, error).await
    }

    async fn release_claim(&self, claim: &Claim, reason: &str) -> Result<(), SmelinxError> {
        self.inner.release_claim(claim, reason).await
    }

    async fn reclaim_stale(&self, cutoff: DateTime<Utc>) -> Result<usize, SmelinxError> {
        self.inner.reclaim_stale(cutoff).await
    }
}

#[tokio::test]
async fn due_notification_is_sent_once() {
    let harness = TestHarness::builder().build().await.unwrap();
    let now = Utc::now();
    let seeded = harness
        .seed_due(Some(CONTACT), now - TimeDelta::minutes(3))
        .await
        .unwrap();
    let dispatcher = harness.dispatcher();

    let first = dispatcher.run_cycle(now).await;
    assert_eq!(first.due, 1);
    assert_eq!(first.claimed, 1);
    assert_eq!(first.sent, 1);

    let stored = harness.notification(&seeded.notification.id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Sent);
    assert_eq!(stored.attempts, 1);
    assert!(stored.claimed_at.is_none());

    let second = dispatcher.run_cycle(now + TimeDelta::seconds(5)).await;
    assert_eq!(second.due, 0);
    assert_eq!(harness.gateway.calls(), 1);

    let deliveries = harness.gateway.deliveries().await;
    assert_eq!(deliveries[0].recipients, vec![CONTACT.to_string()]);
    assert_eq!(deliveries[0].api_name, "Payments");
    assert_eq!(deliveries[0].version_label, "v1");
    assert_eq!(
        deliveries[0].sunset_date.map(|d| d.to_string()).as_deref(),
        Some("2025-12-01")
    );
}

#[tokio::test]
async fn retries_until_success_within_limit() {
    let harness = TestHarness::builder()
        .with_script(vec![Step::fail("smtp 451"), Step::fail("smtp 451")])
        .with_max_attempts(3)
        .build()
        .await
        .unwrap();
    let t0 = Utc::now();
    let seeded = harness
        .seed_due(Some(CONTACT), t0 - TimeDelta::minutes(3))
        .await
        .unwrap();
    let id = seeded.notification.id.clone();
    let dispatcher = harness.dispatcher();

    let report = dispatcher.run_cycle(t0).await;
    assert_eq!(report.retried, 1);
    let after_first = harness.notification(&id).await.unwrap();
    assert_eq!(after_first.status, NotificationStatus::Pending);
    assert_eq!(after_first.attempts, 1);
    assert_eq!(after_first.retry_after, Some(t0 + TimeDelta::seconds(60)));
    assert!(after_first.last_error.as_deref().unwrap().contains("smtp 451"));

    // Still backing off.
    let waiting = dispatcher.run_cycle(t0 + TimeDelta::seconds(30)).await;
    assert_eq!(waiting.due, 0);

    let t1 = t0 + TimeDelta::seconds(61);
    assert_eq!(dispatcher.run_cycle(t1).await.retried, 1);
    let after_second = harness.notification(&id).await.unwrap();
    assert_eq!(after_second.attempts, 2);
    assert_eq!(after_second.retry_after, Some(t1 + TimeDelta::seconds(120)));

    let t2 = t1 + TimeDelta::seconds(121);
    assert_eq!(dispatcher.run_cycle(t2).await.sent, 1);
    let done = harness.notification(&id).await.unwrap();
    assert_eq!(done.status, NotificationStatus::Sent);
    assert_eq!(done.attempts, 3);
    assert_eq!(harness.gateway.calls(), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let harness = TestHarness::builder()
        .with_script(vec![
            Step::fail("smtp 451"),
            Step::fail("smtp 554"),
            Step::Succeed,
        ])
        .with_max_attempts(2)
        .build()
        .await
        .unwrap();
    let t0 = Utc::now();
    let seeded = harness
        .seed_due(Some(CONTACT), t0 - TimeDelta::minutes(3))
        .await
        .unwrap();
    let id = seeded.notification.id.clone();
    let dispatcher = harness.dispatcher();

    assert_eq!(dispatcher.run_cycle(t0).await.retried, 1);
    let report = dispatcher.run_cycle(t0 + TimeDelta::seconds(61)).await;
    assert_eq!(report.failed, 1);

    let failed = harness.notification(&id).await.unwrap();
    assert_eq!(failed.status, NotificationStatus::Failed);
    assert_eq!(failed.attempts, 2);
    assert!(failed.last_error.as_deref().unwrap().contains("smtp 554"));

    let later = dispatcher.run_cycle(t0 + TimeDelta::hours(2)).await;
    assert_eq!(later.due, 0);
    assert_eq!(harness.gateway.calls(), 2);
}

#[tokio::test]
async fn no_recipients_leaves_notification_pending_without_attempt() {
    let harness = TestHarness::builder().build().await.unwrap();
    let now = Utc::now();
    let seeded = harness
        .seed_due(None, now - TimeDelta::minutes(1))
        .await
        .unwrap();

    let report = harness.dispatcher().run_cycle(now).await;
    assert_eq!(report.claimed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(harness.gateway.calls(), 0);

    let stored = harness.notification(&seeded.notification.id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Pending);
    assert_eq!(stored.attempts, 0);
    assert_eq!(stored.last_error.as_deref(), Some("no recipients"));
}

#[tokio::test]
async fn fallback_recipient_used_when_audience_empty() {
    let harness = TestHarness::builder()
        .with_fallback_recipient("lifecycle@example.com")
        .build()
        .await
        .unwrap();
    let now = Utc::now();
    harness
        .seed_due(None, now - TimeDelta::minutes(1))
        .await
        .unwrap();

    assert_eq!(harness.dispatcher().run_cycle(now).await.sent, 1);
    let deliveries = harness.gateway.deliveries().await;
    assert_eq!(deliveries[0].recipients, vec!["lifecycle@example.com".to_string()]);
}

#[tokio::test]
async fn future_notifications_are_not_dispatched() {
    let harness = TestHarness::builder().build().await.unwrap();
    let now = Utc::now();
    let seeded = harness
        .seed_due(Some(CONTACT), now + TimeDelta::hours(1))
        .await
        .unwrap();

    let report = harness.dispatcher().run_cycle(now).await;
    assert_eq!(report.due, 0);
    assert_eq!(harness.gateway.calls(), 0);
    let stored = harness.notification(&seeded.notification.id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Pending);
}

#[tokio::test]
async fn slow_gateway_times_out_and_is_retried() {
    let settings = DispatchSettings {
        send_timeout: Duration::from_millis(50),
        ..DispatchSettings::default()
    };
    let harness = TestHarness::builder()
        .with_settings(settings)
        .with_script(vec![Step::Stall(Duration::from_secs(5))])
        .build()
        .await
        .unwrap();
    let now = Utc::now();
    let seeded = harness
        .seed_due(Some(CONTACT), now - TimeDelta::minutes(1))
        .await
        .unwrap();

    let report = harness.dispatcher().run_cycle(now).await;
    assert_eq!(report.retried, 1);
    let stored = harness.notification(&seeded.notification.id).await.unwrap();
    assert_eq!(stored.attempts, 1);
    assert!(stored.last_error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn stale_claim_is_reclaimed_and_delivered() {
    let harness = TestHarness::builder().build().await.unwrap();
    let t0 = Utc::now();
    let seeded = harness
        .seed_due(Some(CONTACT), t0 - TimeDelta::minutes(10))
        .await
        .unwrap();
    let id = seeded.notification.id.clone();

    // A worker that claimed and then died.
    let abandoned = harness.storage.claim(&id, "crashed-worker", t0, t0).await.unwrap();
    assert!(abandoned.is_some());

    let dispatcher = harness.dispatcher();
    let within_grace = dispatcher.run_cycle(t0 + TimeDelta::seconds(60)).await;
    assert_eq!(within_grace.reclaimed, 0);
    assert_eq!(within_grace.due, 0);

    let after_grace = dispatcher.run_cycle(t0 + TimeDelta::seconds(301)).await;
    assert_eq!(after_grace.reclaimed, 1);
    assert_eq!(after_grace.sent, 1);
    assert_eq!(
        harness.notification(&id).await.unwrap().status,
        NotificationStatus::Sent
    );
}

#[tokio::test]
async fn concurrent_dispatchers_deliver_each_notification_once() {
    let harness = TestHarness::builder().build().await.unwrap();
    let now = Utc::now();
    for _ in 0..8 {
        harness
            .seed_due(Some(CONTACT), now - TimeDelta::minutes(1))
            .await
            .unwrap();
    }

    let a = harness.dispatcher();
    let b = harness.dispatcher();
    let (ra, rb) = tokio::join!(a.run_cycle(now), b.run_cycle(now));

    assert_eq!(ra.sent + rb.sent, 8);
    assert_eq!(harness.gateway.calls(), 8);
    assert_eq!(ra.claimed + rb.claimed, 8);
}

#[tokio::test]
async fn run_loop_stops_on_cancel() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .seed_due(Some(CONTACT), Utc::now() - TimeDelta::minutes(1))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let dispatcher = harness.dispatcher();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run(cancel).await }
    });

    // The first tick fires immediately.
    for _ in 0..100 {
        if harness.gateway.calls() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(harness.gateway.calls(), 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("dispatcher should stop")
        .unwrap();
}

#[tokio::test]
async fn late_claims_in_a_cycle_are_not_reclaimed_by_a_peer() {
    let settings = DispatchSettings {
        max_concurrency: 1,
        send_timeout: Duration::from_millis(400),
        claim_grace: Duration::from_millis(500),
        ..DispatchSettings::default()
    };
    let stall = Step::Stall(Duration::from_millis(350));
    let harness = TestHarness::builder()
        .with_settings(settings)
        .with_script(vec![stall.clone(), stall.clone(), stall])
        .build()
        .await
        .unwrap();
    let now = Utc::now();
    for _ in 0..3 {
        harness
            .seed_due(Some(CONTACT), now - TimeDelta::minutes(1))
            .await
            .unwrap();
    }

    // A works through the batch one notification at a time. Its last claim
    // is taken about 700ms after the cycle started.
    let a = harness.dispatcher();
    let first = tokio::spawn(async move { a.run_cycle(now).await });
    tokio::time::sleep(Duration::from_millis(850)).await;

    let peer = harness.dispatcher().run_cycle(Utc::now()).await;
    let report = first.await.unwrap();

    assert_eq!(peer.reclaimed, 0);
    assert_eq!(peer.sent, 0);
    assert_eq!(report.sent, 3);
    assert_eq!(harness.gateway.calls(), 3);

    let mut per_notification: HashMap<String, usize> = HashMap::new();
    for delivery in harness.gateway.deliveries().await {
        *per_notification.entry(delivery.notification_id).or_default() += 1;
    }
    assert_eq!(per_notification.len(), 3);
    assert!(per_notification.values().all(|&n| n == 1));
}

#[tokio::test]
async fn claim_error_skips_one_notification_until_next_cycle() {
    let harness = TestHarness::builder().build().await.unwrap();
    let now = Utc::now();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let seeded = harness
            .seed_due(Some(CONTACT), now - TimeDelta::minutes(1))
            .await
            .unwrap();
        ids.push(seeded.notification.id);
    }
    let store = Arc::new(FlakyClaimStore {
        inner: harness.storage.clone(),
        failing_id: ids[1].clone(),
        tripped: AtomicBool::new(false),
    });
    let dispatcher = Dispatcher::new(
        store,
        harness.storage.clone(),
        harness.gateway.clone(),
        harness.settings.clone(),
    );

    let first = dispatcher.run_cycle(now).await;
    assert_eq!(first.due, 3);
    assert_eq!(first.errors, 1);
    assert_eq!(first.sent, 2);
    assert_eq!(first.claimed, 2);

    let skipped = harness.notification(&ids[1]).await.unwrap();
    assert_eq!(skipped.status, NotificationStatus::Pending);
    assert_eq!(skipped.attempts, 0);

    let second = dispatcher.run_cycle(now + TimeDelta::seconds(5)).await;
    assert_eq!(second.due, 1);
    assert_eq!(second.sent, 1);
    for id in &ids {
        let stored = harness.notification(id).await.unwrap();
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert_eq!(stored.attempts, 1);
    }
    assert_eq!(harness.gateway.calls(), 3);
}
