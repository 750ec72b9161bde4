//! Staged writes with publish-on-success
//!
//! A fetch must never leave a destination half-populated in a way that is
//! indistinguishable from success. All content is written into a staging
//! directory created next to the destination (same filesystem, so the
//! final moves are renames) and published only once the whole fetch has
//! succeeded. Dropping an unpublished staging directory discards it.

use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;

use crate::error::{FetchError, Result};

/// A staging directory for one fetch
pub(crate) struct Staging {
    dir: TempDir,
}

impl Staging {
    /// Create a staging directory as a sibling of `dest_dir`
    pub(crate) fn for_dest(dest_dir: &Path) -> Result<Self> {
        let parent = dest_dir.parent().unwrap_or(Path::new("."));
        let dir = TempDir::with_prefix_in(".stagehand-", parent)?;
        Ok(Self { dir })
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write one file under the staging root, creating parent directories
    pub(crate) fn write_file(&self, rel_path: &str, data: &[u8]) -> Result<()> {
        let full = self.path().join(safe_relative(rel_path)?);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, data)?;
        Ok(())
    }

    /// Move the staged content into the destination
    ///
    /// The destination must already exist. Each top-level staged entry is
    /// renamed into place; entries are on the same filesystem as the
    /// destination by construction.
    pub(crate) fn publish(self, dest_dir: &Path) -> Result<()> {
        if !dest_dir.is_dir() {
            return Err(FetchError::InvalidDestination {
                path: dest_dir.display().to_string(),
            });
        }
        for entry in std::fs::read_dir(self.path())? {
            let entry = entry?;
            std::fs::rename(entry.path(), dest_dir.join(entry.file_name()))?;
        }
        Ok(())
    }
}

/// Reject absolute paths and any `..` component
fn safe_relative(rel_path: &str) -> Result<PathBuf> {
    let path = Path::new(rel_path);
    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe || rel_path.is_empty() {
        return Err(FetchError::UnsafeEntryPath {
            path: rel_path.to_string(),
        });
    }
    Ok(path.to_path_buf())
}
