//! JSON sidecar manifests (`<entry>/.manifest.json`).

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::runtime::Runtime;

pub const MANIFEST_FILENAME: &str = ".manifest.json";

#[tracing::instrument(skip(runtime))]
pub fn load_manifest<R: Runtime, T: DeserializeOwned>(runtime: &R, dir: &Path) -> StoreResult<T> {
    let path = dir.join(MANIFEST_FILENAME);
    let content = runtime
        .read_to_string(&path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Manifest { path, source })
}

/// Write the manifest next to the entry content.
///
/// The JSON goes to a temporary sibling first and is renamed into place, so a
/// crash never leaves a truncated manifest behind.
#[tracing::instrument(skip(runtime, manifest))]
pub fn save_manifest<R: Runtime, T: Serialize>(runtime: &R, dir: &Path, manifest: &T) -> StoreResult<()> {
    let path = dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(manifest).map_err(|source| StoreError::Manifest {
        path: path.clone(),
        source,
    })?;

    let tmp = dir.join(format!("{}.tmp", MANIFEST_FILENAME));
    runtime
        .write(&tmp, json.as_bytes())
        .with_context(|| format!("Failed to write manifest {}", tmp.display()))?;
    runtime
        .rename(&tmp, &path)
        .with_context(|| format!("Failed to move manifest into place at {}", path.display()))?;
    Ok(())
}
