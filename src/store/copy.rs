//! File and directory tree copies that keep permission bits.

use anyhow::Context;
use std::path::Path;

use crate::error::StoreResult;
use crate::runtime::Runtime;

pub fn copy_file<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> StoreResult<()> {
    runtime
        .copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Recursively copy the directory `from` to `to`.
///
/// Regular files keep their permission bits, directories get the source mode
/// once their children are written, and nested symlinks are recreated with
/// the same target instead of being followed.
#[tracing::instrument(skip(runtime))]
pub fn copy_tree<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> StoreResult<()> {
    runtime
        .create_dir_all(to)
        .with_context(|| format!("Failed to create directory {}", to.display()))?;

    let mut children = runtime
        .read_dir(from)
        .with_context(|| format!("Failed to read directory {}", from.display()))?;
    children.sort();

    for child in children {
        let Some(name) = child.file_name() else {
            continue;
        };
        let dest = to.join(name);

        if runtime.is_symlink(&child) {
            let target = runtime.read_link(&child)?;
            runtime
                .symlink(&target, &dest)
                .with_context(|| format!("Failed to recreate symlink {}", dest.display()))?;
        } else if runtime.is_dir(&child) {
            copy_tree(runtime, &child, &dest)?;
        } else {
            copy_file(runtime, &child, &dest)?;
        }
    }

    // Set last: a read-only source directory must not block writing its children.
    let mode = runtime.mode(from)?;
    runtime.set_permissions(to, mode)?;
    Ok(())
}
