//! Working-set seam — the records and accessor trait through which the
//! engine consumes externally-owned discovery and selection state.
//!
//! The walker that produces file lists and the UI that owns the selection
//! map live outside this crate; the engine only reads them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One discovered file, as reported by the external bundle scanner.
/// `is_log_file` is the content-based classification flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub is_log_file: bool,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, is_log_file: bool) -> Self {
        Self {
            path: path.into(),
            is_log_file,
        }
    }
}

/// Read-only view of the externally-owned selection state.
pub trait Selection {
    fn is_selected(&self, path: &Path) -> bool;
}

impl Selection for HashSet<PathBuf> {
    fn is_selected(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

/// Selection that includes every file. Convenient for callers without a
/// working set and for tests.
pub struct SelectAll;

impl Selection for SelectAll {
    fn is_selected(&self, _path: &Path) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashset_selection_matches_members_only() {
        let mut selected = HashSet::new();
        selected.insert(PathBuf::from("/logs/a.log"));

        assert!(selected.is_selected(Path::new("/logs/a.log")));
        assert!(!selected.is_selected(Path::new("/logs/b.log")));
    }

    #[test]
    fn select_all_matches_everything() {
        assert!(SelectAll.is_selected(Path::new("/anything/at/all")));
    }
}
