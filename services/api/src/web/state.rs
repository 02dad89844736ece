//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::web::admin::AdminGate;
use std::sync::Arc;
use tutor_board_core::ports::PhotoLibrary;
use tutor_board_core::{PhotoResolver, TutorRoster};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The roster holds the record store and the presence tracker; the expiry task
/// holds a handle to the same roster.
#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<TutorRoster>,
    pub photos: Arc<dyn PhotoLibrary>,
    pub photo_resolver: PhotoResolver,
    pub admin: AdminGate,
}

impl AppState {
    pub fn new(roster: Arc<TutorRoster>, photos: Arc<dyn PhotoLibrary>, admin: AdminGate) -> Self {
        Self {
            roster,
            photos,
            photo_resolver: PhotoResolver::new(),
            admin,
        }
    }
}
