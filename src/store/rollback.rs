use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Removes registered paths when dropped, unless the operation commits.
///
/// Paths are removed in reverse registration order, so nested paths
/// registered after their parent go first.
pub struct Rollback<'a, R: Runtime> {
    runtime: &'a R,
    paths: Vec<PathBuf>,
}

impl<'a, R: Runtime> Rollback<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            paths: Vec::new(),
        }
    }

    /// Register a path to delete if the operation does not commit.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Stop tracking `path`, e.g. once it is known to be the user's own data.
    pub fn forget(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    /// Mark the operation as successful; nothing is removed.
    pub fn commit(mut self) {
        self.paths.clear();
    }
}

impl<R: Runtime> Drop for Rollback<'_, R> {
    fn drop(&mut self) {
        for path in self.paths.iter().rev() {
            debug!("Rolling back {:?}", path);
            let result = if self.runtime.is_symlink(path) {
                self.runtime.remove_symlink(path)
            } else if self.runtime.is_dir(path) {
                self.runtime.remove_dir_all(path)
            } else if self.runtime.exists(path) {
                self.runtime.remove_file(path)
            } else {
                continue;
            };
            if let Err(e) = result {
                warn!("Failed to roll back {:?}: {}", path, e);
            }
        }
    }
}
