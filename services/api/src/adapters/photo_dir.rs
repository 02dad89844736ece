//! services/api/src/adapters/photo_dir.rs
//!
//! The `PhotoLibrary` adapter over a plain directory of image files.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use tutor_board_core::ports::{PhotoLibrary, PortError, PortResult};

#[derive(Clone, Debug)]
pub struct PhotoDirectory {
    root: PathBuf,
}

impl PhotoDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PhotoLibrary for PhotoDirectory {
    /// Regular files directly inside the directory. A missing directory lists as empty.
    async fn file_names(&self) -> PortResult<HashSet<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(dir = %self.root.display(), "Photo directory does not exist");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };

        let mut names = HashSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if is_file {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    async fn read(&self, file_name: &str) -> PortResult<Vec<u8>> {
        // Only bare names coming out of `file_names` are valid here.
        let bare = Path::new(file_name).file_name().and_then(|n| n.to_str()) == Some(file_name);
        if !bare {
            return Err(PortError::NotFound(file_name.to_string()));
        }
        tokio::fs::read(self.root.join(file_name))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PortError::NotFound(file_name.to_string()),
                _ => PortError::Unexpected(e.to_string()),
            })
    }
}
