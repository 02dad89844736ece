//! crates/tutor_board_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the spreadsheet file and the photo directory on disk.

use async_trait::async_trait;
use std::collections::HashSet;
use crate::domain::TutorRecord;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and roster operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Record Store Load Outcome
//=========================================================================================

/// The result of reading the durable record file.
///
/// Reading never fails outright: a missing or broken file degrades to an empty
/// set for readers. The variants keep the cases apart for callers that care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    Records(Vec<TutorRecord>),
    /// No durable file exists yet.
    Missing,
    /// The file exists but could not be parsed.
    Unreadable { reason: String },
}

impl Loaded {
    /// The loaded records, or an empty set when the store had nothing readable.
    pub fn into_records(self) -> Vec<TutorRecord> {
        match self {
            Loaded::Records(records) => records,
            Loaded::Missing | Loaded::Unreadable { .. } => Vec::new(),
        }
    }

    /// Records to mutate. A broken store refuses writes so it is not overwritten
    /// with a near-empty set; a missing store starts empty.
    pub fn for_update(self) -> PortResult<Vec<TutorRecord>> {
        match self {
            Loaded::Records(records) => Ok(records),
            Loaded::Missing => Ok(Vec::new()),
            Loaded::Unreadable { reason } => Err(PortError::StoreUnavailable(reason)),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the full record set fresh from durable storage. No caching across calls.
    async fn load(&self) -> Loaded;

    /// Replaces the durable record set with `records`.
    async fn save(&self, records: &[TutorRecord]) -> PortResult<()>;
}

#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    /// Names of the files currently present in the photo directory.
    async fn file_names(&self) -> PortResult<HashSet<String>>;

    /// Reads the raw bytes of one file from the photo directory.
    async fn read(&self, file_name: &str) -> PortResult<Vec<u8>>;
}
