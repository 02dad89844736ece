//! services/api/src/web/expiry_task.rs
//!
//! The background task that drives the expiry reconciler on a fixed period
//! until the server shuts down.

use chrono::Utc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tutor_board_core::ExpiryReconciler;

/// Runs `reconciler` every `period` until `shutdown` is cancelled.
///
/// The first sweep happens one full period after start, so tutors restored as
/// available from the store get one period to send a heartbeat.
pub async fn expiry_process(
    reconciler: ExpiryReconciler,
    period: Duration,
    shutdown: CancellationToken,
) {
    info!(
        period_secs = period.as_secs(),
        timeout_secs = reconciler.policy().timeout.as_secs(),
        "Presence expiry task started"
    );

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let report = reconciler.tick(Utc::now()).await;
                if !report.expired.is_empty() {
                    info!(expired = ?report.expired, persisted = report.persisted, "Auto-logged out tutors");
                }
            }
        }
    }

    info!("Presence expiry task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tutor_board_core::{
        ExpiryPolicy, MemoryStore, PresenceTracker, TutorRecord, TutorRoster,
    };

    fn available_tutor() -> TutorRecord {
        TutorRecord {
            id: "1001".into(),
            name: "Jane Doe".into(),
            grade: "11".into(),
            subjects: vec![],
            photo: "Jane Doe.jpeg".into(),
            available: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_after_one_period_and_stops_on_cancel() {
        let store = Arc::new(MemoryStore::with_records(vec![available_tutor()]));
        let roster = Arc::new(TutorRoster::new(store.clone(), Arc::new(PresenceTracker::new())));
        let period = Duration::from_secs(30);
        let reconciler = ExpiryReconciler::new(roster, ExpiryPolicy::new(period));
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(expiry_process(reconciler, period, shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(store.records().await[0].available);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(!store.records().await[0].available);

        shutdown.cancel();
        task.await.unwrap();
    }
}
