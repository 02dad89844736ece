//! crates/tutor_board_core/src/memory.rs
//!
//! An in-memory `RecordStore`, used by tests and for running without a spreadsheet.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::TutorRecord;
use crate::ports::{Loaded, PortError, PortResult, RecordStore};

#[derive(Debug, Default)]
struct MemoryState {
    records: Option<Vec<TutorRecord>>,
    unreadable: Option<String>,
    fail_saves: bool,
}

/// Keeps the record set in memory. Starts out `Missing` until the first save.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TutorRecord>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                records: Some(records),
                ..Default::default()
            }),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes every later load report the store as unreadable.
    pub async fn break_with(&self, reason: &str) {
        self.state.write().await.unreadable = Some(reason.to_string());
    }

    /// Makes every later save fail (or succeed again).
    pub async fn fail_saves(&self, fail: bool) {
        self.state.write().await.fail_saves = fail;
    }

    /// The current records, bypassing the load contract.
    pub async fn records(&self) -> Vec<TutorRecord> {
        self.state.read().await.records.clone().unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> Loaded {
        let state = self.state.read().await;
        if let Some(reason) = &state.unreadable {
            return Loaded::Unreadable {
                reason: reason.clone(),
            };
        }
        match &state.records {
            Some(records) => Loaded::Records(records.clone()),
            None => Loaded::Missing,
        }
    }

    async fn save(&self, records: &[TutorRecord]) -> PortResult<()> {
        let mut state = self.state.write().await;
        if state.fail_saves {
            return Err(PortError::StoreUnavailable("save rejected".to_string()));
        }
        state.records = Some(records.to_vec());
        state.unreadable = None;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
