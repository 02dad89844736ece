//! crates/tutor_board_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or serialization format.

/// A registered tutor as persisted in the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorRecord {
    /// Stable key, unique across the whole record set.
    pub id: String,
    pub name: String,
    pub grade: String,
    /// Display order only.
    pub subjects: Vec<String>,
    /// Filename hint for the photo route.
    pub photo: String,
    pub available: bool,
}

impl TutorRecord {
    /// The photo filename a tutor gets when none was given explicitly.
    pub fn default_photo(name: &str) -> String {
        if name.is_empty() {
            String::new()
        } else {
            format!("{}.jpeg", name)
        }
    }

    /// Subjects as the single delimited cell written to the flat store layout.
    pub fn subjects_joined(&self) -> String {
        self.subjects.join(", ")
    }
}

/// Splits a comma-delimited subject cell back into its entries.
pub fn split_subjects(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Input for creating a tutor from the admin interface.
#[derive(Debug, Clone, Default)]
pub struct NewTutor {
    pub name: Option<String>,
    pub id: Option<String>,
    pub photo: Option<String>,
    pub grade: Option<String>,
    pub subjects: Option<Vec<String>>,
}

/// A partial update. `original_id` locates the record; `name` doubles as the
/// fallback lookup key when `original_id` does not match anything.
#[derive(Debug, Clone, Default)]
pub struct TutorEdit {
    pub original_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub grade: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub photo: Option<String>,
}
