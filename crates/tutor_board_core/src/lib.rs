pub mod domain;
pub mod memory;
pub mod photo;
pub mod ports;
pub mod presence;
pub mod reconciler;
pub mod roster;

pub use domain::{split_subjects, NewTutor, TutorEdit, TutorRecord};
pub use memory::MemoryStore;
pub use photo::{Photo, PhotoResolver};
pub use ports::{Loaded, PhotoLibrary, PortError, PortResult, RecordStore};
pub use presence::{ExpiryPolicy, PresenceTracker};
pub use reconciler::{ExpiryReconciler, TickReport};
pub use roster::TutorRoster;
