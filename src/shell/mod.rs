//! Shell activation graph (`<root>/shell.d`).
//!
//! Every package owns one subdirectory holding snippet files and a manifest
//! with an optional `after` dependency and an `enabled` flag. Activation
//! sources the snippets of all enabled packages in dependency order.

mod kind;
mod order;

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::runtime::Runtime;
use crate::store::{self, Environment, MANIFEST_FILENAME};

pub use kind::{Shell, render_activation};

const SNIPPET_STEM: &str = "snippet";

/// `shell.d/<key>/.manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellManifest {
    /// Key of the package whose snippets must be sourced first.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub after: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ShellManifest {
    fn default() -> Self {
        Self {
            after: String::new(),
            enabled: true,
        }
    }
}

/// One package's snippets for a given shell, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellEntry {
    pub key: String,
    pub paths: Vec<PathBuf>,
}

/// Directory key for a package under `shell.d`.
///
/// Profiles are not part of the key: a package shares one shell.d entry
/// across all profiles.
pub fn package_dir_name(id: &str, provider: &str) -> String {
    let sanitize = |s: &str| s.replace(['/', '\\', ':', ' '], "_");
    format!("{}_{}", sanitize(id), sanitize(provider))
}

pub struct ShellStore<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> ShellStore<'a, R> {
    pub fn new(runtime: &'a R, env: &Environment) -> Self {
        Self {
            runtime,
            root: env.shell_root(),
        }
    }

    /// `<root>/shell.d`
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_dir(&self, id: &str, provider: &str) -> PathBuf {
        self.root.join(package_dir_name(id, provider))
    }

    #[tracing::instrument(skip(self))]
    pub fn ensure_package_dir(&self, id: &str, provider: &str) -> StoreResult<PathBuf> {
        let dir = self.package_dir(id, provider);
        self.runtime
            .create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Delete the package directory with its snippets and manifest.
    /// Returns false if there was nothing to delete.
    #[tracing::instrument(skip(self))]
    pub fn remove_package_dir(&self, id: &str, provider: &str) -> StoreResult<bool> {
        let dir = self.package_dir(id, provider);
        if !self.runtime.is_dir(&dir) {
            return Ok(false);
        }
        self.runtime
            .remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
        Ok(true)
    }

    /// The stored manifest, or the default (enabled, no `after`) if none was written yet.
    pub fn load_manifest(&self, dir: &Path) -> StoreResult<ShellManifest> {
        if !self.runtime.exists(&dir.join(MANIFEST_FILENAME)) {
            return Ok(ShellManifest::default());
        }
        store::load_manifest(self.runtime, dir)
    }

    pub fn save_manifest(&self, dir: &Path, manifest: &ShellManifest) -> StoreResult<()> {
        self.runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        store::save_manifest(self.runtime, dir, manifest)
    }

    /// Flip the `enabled` flag, keeping snippets and `after` as they are.
    pub fn set_enabled(&self, dir: &Path, enabled: bool) -> StoreResult<ShellManifest> {
        let mut manifest = self.load_manifest(dir)?;
        manifest.enabled = enabled;
        self.save_manifest(dir, &manifest)?;
        Ok(manifest)
    }

    /// Files in `dir` ending in `ext`, sorted by file name.
    pub fn snippet_files_in_dir(&self, dir: &Path, ext: &str) -> StoreResult<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self
            .runtime
            .read_dir(dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .into_iter()
            .filter(|path| {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    return false;
                };
                name != MANIFEST_FILENAME && name.ends_with(ext) && !self.runtime.is_dir(path)
            })
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Write `snippet<ext>` for `shell`, ending it with a newline.
    #[tracing::instrument(skip(self, content))]
    pub fn write_snippet(&self, dir: &Path, shell: Shell, content: &str) -> StoreResult<PathBuf> {
        self.runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(format!("{}{}", SNIPPET_STEM, shell.ext()));
        let mut content = content.to_string();
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        self.runtime
            .write(&path, content.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Non-hidden package directory names, sorted.
    pub fn list_package_dir_names(&self) -> StoreResult<Vec<String>> {
        if !self.runtime.is_dir(&self.root) {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = self
            .runtime
            .read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?
            .into_iter()
            .filter(|path| self.runtime.is_dir(path))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Enabled entries with at least one `ext` snippet, in activation order.
    ///
    /// `after` edges pointing at disabled or snippet-less packages are
    /// dropped. A cycle among the remaining edges is an error and no partial
    /// order is returned.
    #[tracing::instrument(skip(self))]
    pub fn enabled_entries_in_order(&self, ext: &str) -> StoreResult<Vec<ShellEntry>> {
        let mut after_of = BTreeMap::new();
        let mut paths_of = BTreeMap::new();

        for key in self.list_package_dir_names()? {
            let dir = self.root.join(&key);
            let manifest = self.load_manifest(&dir)?;
            if !manifest.enabled {
                debug!("{} is disabled", key);
                continue;
            }
            let paths = self.snippet_files_in_dir(&dir, ext)?;
            if paths.is_empty() {
                debug!("{} has no {} snippets", key, ext);
                continue;
            }
            after_of.insert(key.clone(), manifest.after);
            paths_of.insert(key, paths);
        }

        let order = order::topological_order(&after_of)?;
        Ok(order
            .into_iter()
            .map(|key| {
                let paths = paths_of.remove(&key).unwrap_or_default();
                ShellEntry { key, paths }
            })
            .collect())
    }
}
