//! crates/tutor_board_core/src/presence.rs
//!
//! Ephemeral last-seen bookkeeping for tutors. Nothing here is persisted; the
//! tracker starts empty on every process start.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

/// How long a tutor may go without a heartbeat before being marked unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub timeout: Duration,
    /// Whether an available tutor with no presence entry at all counts as expired.
    pub expire_unseen: bool,
}

impl ExpiryPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            expire_unseen: true,
        }
    }

    pub fn with_expire_unseen(mut self, expire_unseen: bool) -> Self {
        self.expire_unseen = expire_unseen;
        self
    }

    /// Decides expiry for one tutor given its last-seen time, if any.
    pub fn is_expired(&self, last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_seen {
            // A clock that went backwards yields a negative span, which is never stale.
            Some(seen) => now
                .signed_duration_since(seen)
                .to_std()
                .map(|elapsed| elapsed > self.timeout)
                .unwrap_or(false),
            None => self.expire_unseen,
        }
    }
}

/// In-memory map from tutor id to the time of its latest login or heartbeat.
///
/// Shared by handle between the request handlers and the expiry reconciler.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    last_seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records activity for `id`. Returns `false` (and records nothing) for an empty id.
    pub async fn touch(&self, id: &str, now: DateTime<Utc>) -> bool {
        if id.is_empty() {
            return false;
        }
        self.last_seen.lock().await.insert(id.to_string(), now);
        true
    }

    /// Forgets `id`. Returns whether an entry existed.
    pub async fn clear(&self, id: &str) -> bool {
        self.last_seen.lock().await.remove(id).is_some()
    }

    pub async fn last_seen(&self, id: &str) -> Option<DateTime<Utc>> {
        self.last_seen.lock().await.get(id).copied()
    }

    /// Whether `id` should be considered gone at `now`.
    pub async fn expired(&self, id: &str, now: DateTime<Utc>, policy: &ExpiryPolicy) -> bool {
        policy.is_expired(self.last_seen(id).await, now)
    }

    /// A copy of every entry, taken under a single lock.
    pub async fn snapshot(&self) -> HashMap<String, DateTime<Utc>> {
        self.last_seen.lock().await.clone()
    }

    /// Moves the entry for `from` to `to`, keeping its timestamp.
    pub async fn rename(&self, from: &str, to: &str) -> bool {
        let mut last_seen = self.last_seen.lock().await;
        match last_seen.remove(from) {
            Some(seen) if !to.is_empty() => {
                last_seen.insert(to.to_string(), seen);
                true
            }
            _ => false,
        }
    }

    /// Drops entries whose id is not in `known_ids`, and entries past the timeout
    /// unless their id is in `keep_stale`. Returns how many entries were removed.
    pub async fn sweep(
        &self,
        now: DateTime<Utc>,
        policy: &ExpiryPolicy,
        known_ids: &HashSet<&str>,
        keep_stale: &HashSet<&str>,
    ) -> usize {
        let mut last_seen = self.last_seen.lock().await;
        let before = last_seen.len();
        last_seen.retain(|id, seen| {
            known_ids.contains(id.as_str())
                && (keep_stale.contains(id.as_str()) || !policy.is_expired(Some(*seen), now))
        });
        before - last_seen.len()
    }

    pub async fn len(&self) -> usize {
        self.last_seen.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.last_seen.lock().await.is_empty()
    }
}
