//! crates/tutor_board_core/src/photo.rs
//!
//! Resolves a tutor's display name to a photo file using a fixed fallback order.
//! Photo files are named loosely (first name only, lowercase, varying extension),
//! so the resolver tries progressively looser candidates against a directory
//! listing and returns the first one that exists.

use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

use crate::ports::{PhotoLibrary, PortError, PortResult};

/// Extensions in preference order.
pub const PHOTO_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// A resolved photo ready to be served.
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn content_type(&self) -> &'static str {
        let lower = self.file_name.to_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoResolver;

impl PhotoResolver {
    pub fn new() -> Self {
        Self
    }

    /// Strips the directory and extension from a requested filename,
    /// e.g. `"Jane Doe.jpeg"` becomes `"Jane Doe"`.
    pub fn base_name(requested: &str) -> String {
        Path::new(requested)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Every candidate filename for `base_name`, in the order they are tried.
    pub fn candidates(&self, base_name: &str) -> Vec<String> {
        let mut candidates: Vec<String> = PHOTO_EXTENSIONS
            .iter()
            .map(|ext| format!("{}{}", base_name, ext))
            .collect();

        for word in base_name.split_whitespace() {
            for ext in PHOTO_EXTENSIONS {
                candidates.push(format!("{}{}", word, ext));
            }
            let lower = word.to_lowercase();
            for ext in PHOTO_EXTENSIONS {
                candidates.push(format!("{}{}", lower, ext));
            }
        }
        candidates
    }

    /// The first candidate present in `listing`, if any.
    pub fn resolve(&self, base_name: &str, listing: &HashSet<String>) -> Option<String> {
        self.candidates(base_name)
            .into_iter()
            .find(|candidate| listing.contains(candidate))
    }

    /// Resolves `requested` against `library` and reads the winning file.
    pub async fn fetch(&self, library: &dyn PhotoLibrary, requested: &str) -> PortResult<Photo> {
        let base_name = Self::base_name(requested);
        let listing = library.file_names().await?;

        match self.resolve(&base_name, &listing) {
            Some(file_name) => {
                let bytes = library.read(&file_name).await?;
                Ok(Photo { file_name, bytes })
            }
            None => {
                warn!(base_name = %base_name, "No photo found");
                Err(PortError::NotFound(format!("Photo for {}", base_name)))
            }
        }
    }
}
