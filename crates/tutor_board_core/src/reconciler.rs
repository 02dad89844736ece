//! crates/tutor_board_core/src/reconciler.rs
//!
//! The periodic sweep that turns stale presence into `available = false` in the
//! record store. Each tick reloads the record set, so admin edits and deletions
//! made between ticks are picked up without any invalidation.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::TutorRecord;
use crate::ports::Loaded;
use crate::presence::ExpiryPolicy;
use crate::roster::TutorRoster;

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Ids flipped to unavailable this tick.
    pub expired: Vec<String>,
    /// Whether the record set was written back successfully.
    pub persisted: bool,
    /// Presence entries dropped as stale or orphaned.
    pub pruned: usize,
}

pub struct ExpiryReconciler {
    roster: Arc<TutorRoster>,
    policy: ExpiryPolicy,
}

impl ExpiryReconciler {
    pub fn new(roster: Arc<TutorRoster>, policy: ExpiryPolicy) -> Self {
        Self { roster, policy }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    /// Runs one sweep at `now`. Save failures are logged, never returned: no
    /// caller is waiting on the sweep.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let _guard = self.roster.lock_writes().await;
        let store = self.roster.store();
        let presence = self.roster.presence();

        let mut tutors = match store.load().await {
            Loaded::Records(records) => records,
            Loaded::Missing => Vec::new(),
            Loaded::Unreadable { reason } => {
                warn!(%reason, "Skipping expiry sweep, record store is unreadable");
                return TickReport::default();
            }
        };

        let last_seen = presence.snapshot().await;
        let expired = expire_stale(&mut tutors, &last_seen, now, &self.policy);

        let mut persisted = false;
        if !expired.is_empty() {
            match store.save(&tutors).await {
                Ok(()) => persisted = true,
                Err(e) => error!("Failed to save tutors after expiry sweep: {}", e),
            }
        }

        // An expiry that was not written must be retried next tick, so its
        // stale entry stays.
        let known_ids: HashSet<&str> = tutors.iter().map(|t| t.id.as_str()).collect();
        let unsaved: HashSet<&str> = if persisted {
            HashSet::new()
        } else {
            expired.iter().map(String::as_str).collect()
        };
        let pruned = presence
            .sweep(now, &self.policy, &known_ids, &unsaved)
            .await;

        debug!(
            expired = expired.len(),
            pruned,
            persisted,
            "Expiry sweep complete"
        );
        TickReport {
            expired,
            persisted,
            pruned,
        }
    }
}

/// Marks every available tutor whose presence has lapsed as unavailable and
/// returns their ids. Ids in `last_seen` with no matching record are ignored.
pub fn expire_stale(
    tutors: &mut [TutorRecord],
    last_seen: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &ExpiryPolicy,
) -> Vec<String> {
    let mut expired = Vec::new();
    for tutor in tutors.iter_mut().filter(|t| t.available) {
        if policy.is_expired(last_seen.get(&tutor.id).copied(), now) {
            info!(tutor_id = %tutor.id, "Tutor timed out, marking unavailable");
            tutor.available = false;
            expired.push(tutor.id.clone());
        }
    }
    expired
}
