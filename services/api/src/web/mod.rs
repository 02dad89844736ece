pub mod admin;
pub mod app;
pub mod expiry_task;
pub mod photos;
pub mod protocol;
pub mod rest;
pub mod state;

// Re-export the router builder and background task so the binary can wire
// them up in one place.
pub use app::build_router;
pub use expiry_task::expiry_process;
