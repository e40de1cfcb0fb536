//! Link store (`<root>/link.d`).
//!
//! Each entry takes over a user path: the original file or directory is
//! copied to `link.d/<name>/content` and the user path is replaced by a
//! symlink pointing at that copy. Removing the entry either copies the content
//! back (restore) or deletes it (purge).

mod status;

use anyhow::Context;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};
use crate::runtime::{Runtime, has_trailing_separator, is_path_under};
use crate::store::{
    Environment, Rollback, copy_file, copy_tree, load_manifest, resolve_user_path, save_manifest,
};

pub use status::LinkStatus;

const CONTENT_NAME: &str = "content";
const RESTORE_SUFFIX: &str = ".al-restore";

/// Shape of a linked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    File,
    Dir,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::File => write!(f, "file"),
            LinkType::Dir => write!(f, "dir"),
        }
    }
}

impl FromStr for LinkType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(LinkType::File),
            "dir" => Ok(LinkType::Dir),
            _ => Err(StoreError::validation(format!(
                "unknown link type: {} (expected file or dir)",
                s
            ))),
        }
    }
}

/// `link.d/<name>/.manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkManifest {
    /// Absolute path of the symlink.
    pub user_path: PathBuf,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_provider: String,
}

impl LinkManifest {
    pub fn has_package(&self) -> bool {
        !self.package_id.is_empty()
    }

    fn matches_package(&self, package_id: &str, package_provider: &str) -> bool {
        if package_id.is_empty() || package_provider.is_empty() {
            return true;
        }
        self.package_id == package_id && self.package_provider == package_provider
    }
}

/// A managed link: its name, its directory under `link.d` and its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub name: String,
    pub dir: PathBuf,
    pub manifest: LinkManifest,
}

impl LinkEntry {
    pub fn content_path(&self) -> PathBuf {
        content_path(&self.dir)
    }
}

/// Path of the content node inside an entry directory.
pub fn content_path(entry_dir: &Path) -> PathBuf {
    entry_dir.join(CONTENT_NAME)
}

/// Check a link name and return it trimmed.
///
/// Names become directory names under `link.d`, so only letters, digits,
/// `_`, `-` and `.` are accepted, and `.`/`..`-prefixed names are rejected.
pub fn validate_link_name(name: &str) -> StoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::validation("link name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name.starts_with("..") {
        return Err(StoreError::validation(format!("invalid link name: {}", name)));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if !name.chars().all(allowed) {
        return Err(StoreError::validation(format!(
            "link name may only contain letters, numbers, underscore, hyphen, and dot: {}",
            name
        )));
    }
    Ok(name)
}

pub struct LinkStore<'a, R: Runtime> {
    runtime: &'a R,
    env: &'a Environment,
    root: PathBuf,
}

impl<'a, R: Runtime> LinkStore<'a, R> {
    pub fn new(runtime: &'a R, env: &'a Environment) -> Self {
        Self {
            runtime,
            env,
            root: env.link_root(),
        }
    }

    /// `<root>/link.d`
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Classify a user path before anything touches it.
    ///
    /// Existing paths are classified by stat. For a missing path a trailing
    /// separator means `dir`, anything else `file`.
    #[tracing::instrument(skip(self))]
    pub fn detect_link_type(&self, user_path: &Path) -> StoreResult<LinkType> {
        let abs = resolve_user_path(self.env, user_path)?;
        if self.runtime.exists(&abs) {
            return Ok(if self.runtime.is_dir(&abs) {
                LinkType::Dir
            } else {
                LinkType::File
            });
        }
        if has_trailing_separator(user_path) {
            Ok(LinkType::Dir)
        } else {
            Ok(LinkType::File)
        }
    }

    /// Take over `user_path` under `name`.
    ///
    /// The entry directory is fully built (content and manifest) before the
    /// original path is touched. Any failure removes the entry directory
    /// again; if the symlink cannot be created after the original was
    /// removed, the original is first restored from the copied content.
    #[tracing::instrument(skip(self))]
    pub fn add_link(
        &self,
        name: &str,
        user_path: &Path,
        link_type: LinkType,
        package_id: &str,
        package_provider: &str,
    ) -> StoreResult<LinkEntry> {
        let name = validate_link_name(name)?;
        let abs_user_path = resolve_user_path(self.env, user_path)?;

        if is_path_under(&abs_user_path, self.env.root())
            || is_path_under(self.env.root(), &abs_user_path)
        {
            return Err(StoreError::validation(format!(
                "{} overlaps the managed directory {}",
                abs_user_path.display(),
                self.env.root().display()
            )));
        }

        let entry_dir = self.entry_dir(name);
        if self.runtime.exists(&entry_dir) || self.runtime.is_symlink(&entry_dir) {
            return Err(StoreError::conflict(format!("link name already exists: {}", name)));
        }

        let original_exists = self.runtime.exists(&abs_user_path);
        if !original_exists && self.runtime.is_symlink(&abs_user_path) {
            return Err(StoreError::validation(format!(
                "{} is a dangling symlink",
                abs_user_path.display()
            )));
        }
        if original_exists {
            let is_dir = self.runtime.is_dir(&abs_user_path);
            if is_dir != (link_type == LinkType::Dir) {
                return Err(StoreError::validation(format!(
                    "{} exists but is not a {}",
                    abs_user_path.display(),
                    if link_type == LinkType::Dir { "directory" } else { "file" }
                )));
            }
        }

        let mut rollback = Rollback::new(self.runtime);
        self.runtime
            .create_dir_all(&entry_dir)
            .with_context(|| format!("Failed to create {}", entry_dir.display()))?;
        rollback.add(&entry_dir);

        let content = content_path(&entry_dir);
        self.populate_content(&abs_user_path, &content, link_type, original_exists)?;

        let manifest = LinkManifest {
            user_path: abs_user_path.clone(),
            link_type,
            package_id: package_id.to_string(),
            package_provider: package_provider.to_string(),
        };
        save_manifest(self.runtime, &entry_dir, &manifest)?;

        if let Err(err) = self.swap_in_symlink(&abs_user_path, &content, link_type, original_exists)
        {
            if original_exists && !self.restore_original(&abs_user_path, &content, link_type) {
                // the entry holds the only complete copy now
                rollback.forget(&entry_dir);
                return Err(err
                    .context(format!(
                        "{} could not be restored; its content is kept in {}",
                        abs_user_path.display(),
                        content.display()
                    ))
                    .into());
            }
            return Err(err.into());
        }

        rollback.commit();
        info!("Linked {} -> {}", abs_user_path.display(), content.display());

        Ok(LinkEntry {
            name: name.to_string(),
            dir: entry_dir,
            manifest,
        })
    }

    fn populate_content(
        &self,
        user_path: &Path,
        content: &Path,
        link_type: LinkType,
        original_exists: bool,
    ) -> StoreResult<()> {
        match (link_type, original_exists) {
            (LinkType::File, true) => copy_file(self.runtime, user_path, content),
            (LinkType::Dir, true) => copy_tree(self.runtime, user_path, content),
            (LinkType::File, false) => {
                self.runtime
                    .write(content, b"")
                    .context("Failed to create placeholder file")?;
                Ok(())
            }
            (LinkType::Dir, false) => {
                self.runtime
                    .create_dir_all(content)
                    .context("Failed to create placeholder directory")?;
                Ok(())
            }
        }
    }

    /// Replace `user_path` with a symlink to `content`.
    ///
    /// Leaves restoring the original to the caller: on error the user path
    /// may be partly removed.
    fn swap_in_symlink(
        &self,
        user_path: &Path,
        content: &Path,
        link_type: LinkType,
        original_exists: bool,
    ) -> anyhow::Result<()> {
        if original_exists {
            self.remove_path(user_path, link_type)
                .with_context(|| format!("Failed to remove original {}", user_path.display()))?;
        } else if let Some(parent) = user_path.parent() {
            self.runtime
                .create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        self.runtime
            .symlink(content, user_path)
            .with_context(|| format!("Failed to create symlink at {}", user_path.display()))
    }

    /// Put the original back at `user_path` from the copied content.
    /// Returns false if it could not be restored.
    fn restore_original(&self, user_path: &Path, content: &Path, link_type: LinkType) -> bool {
        warn!(
            "Restoring {} from {}",
            user_path.display(),
            content.display()
        );
        if self.runtime.is_symlink(user_path) || self.runtime.exists(user_path) {
            if let Err(e) = self.remove_path(user_path, link_type) {
                debug!("Leftovers at {} remain: {}", user_path.display(), e);
            }
        }
        match self.copy_content(content, user_path, link_type) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to restore {}: {}", user_path.display(), e);
                false
            }
        }
    }

    fn remove_path(&self, path: &Path, link_type: LinkType) -> anyhow::Result<()> {
        if self.runtime.is_symlink(path) {
            self.runtime.remove_symlink(path)
        } else if link_type == LinkType::Dir {
            self.runtime.remove_dir_all(path)
        } else {
            self.runtime.remove_file(path)
        }
    }

    fn copy_content(&self, from: &Path, to: &Path, link_type: LinkType) -> StoreResult<()> {
        match link_type {
            LinkType::File => copy_file(self.runtime, from, to),
            LinkType::Dir => copy_tree(self.runtime, from, to),
        }
    }

    /// Undo a link.
    ///
    /// With `purge` the symlink and entry are deleted and nothing is left at
    /// the user path. Otherwise the content is copied back first into a
    /// hidden sibling of the user path, which is renamed into place once the
    /// symlink is gone.
    #[tracing::instrument(skip(self, entry), fields(name = %entry.name))]
    pub fn remove_link(&self, entry: &LinkEntry, purge: bool) -> StoreResult<()> {
        let user_path = &entry.manifest.user_path;
        let is_symlink = self.runtime.is_symlink(user_path);
        if !is_symlink && self.runtime.exists(user_path) {
            return Err(StoreError::conflict(format!(
                "{} exists and is not a symlink; refusing to replace it",
                user_path.display()
            )));
        }

        let staged = if purge {
            None
        } else {
            self.stage_restore(entry)?
        };
        let mut rollback = Rollback::new(self.runtime);
        if let Some(staging) = &staged {
            rollback.add(staging);
        }

        if is_symlink {
            self.runtime
                .remove_symlink(user_path)
                .with_context(|| format!("Failed to remove symlink {}", user_path.display()))?;
        } else {
            debug!("No symlink at {}", user_path.display());
        }

        if let Some(staging) = staged {
            self.runtime
                .rename(&staging, user_path)
                .with_context(|| format!("Failed to restore {}", user_path.display()))?;
            info!("Restored {}", user_path.display());
        }
        rollback.commit();

        self.runtime
            .remove_dir_all(&entry.dir)
            .with_context(|| format!("Failed to remove {}", entry.dir.display()))?;
        Ok(())
    }

    /// Copy the content next to the user path. Returns the staging path, or
    /// `None` when there is no content to restore.
    fn stage_restore(&self, entry: &LinkEntry) -> StoreResult<Option<PathBuf>> {
        let content = entry.content_path();
        if !self.runtime.exists(&content) {
            warn!(
                "{} has no content to restore, removing without copy-back",
                entry.name
            );
            return Ok(None);
        }

        let user_path = &entry.manifest.user_path;
        let staging = restore_staging_path(user_path)?;
        if self.runtime.is_dir(&staging) {
            self.runtime.remove_dir_all(&staging)?;
        } else if self.runtime.exists(&staging) || self.runtime.is_symlink(&staging) {
            self.runtime.remove_file(&staging)?;
        }
        if let Some(parent) = staging.parent() {
            self.runtime
                .create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut rollback = Rollback::new(self.runtime);
        rollback.add(&staging);
        self.copy_content(&content, &staging, entry.manifest.link_type)?;
        rollback.commit();
        Ok(Some(staging))
    }

    /// All entries, sorted by name. With both `package_id` and
    /// `package_provider` non-empty, only entries for that package.
    ///
    /// Entries with a missing or unreadable manifest are skipped.
    #[tracing::instrument(skip(self))]
    pub fn list_links(&self, package_id: &str, package_provider: &str) -> StoreResult<Vec<LinkEntry>> {
        if !self.runtime.is_dir(&self.root) {
            return Ok(Vec::new());
        }

        let mut dirs = self
            .runtime
            .read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;
        dirs.sort();

        let mut entries = Vec::new();
        for dir in dirs {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if validate_link_name(name).is_err() || !self.runtime.is_dir(&dir) {
                continue;
            }
            let manifest: LinkManifest = match load_manifest(self.runtime, &dir) {
                Ok(manifest) => manifest,
                Err(e) => {
                    debug!("Skipping {}: {}", dir.display(), e);
                    continue;
                }
            };
            if !manifest.matches_package(package_id, package_provider) {
                continue;
            }
            entries.push(LinkEntry {
                name: name.to_string(),
                dir,
                manifest,
            });
        }
        Ok(entries)
    }

    /// Exact lookup by name. `Ok(None)` when no such entry exists.
    #[tracing::instrument(skip(self))]
    pub fn get_link_by_name(&self, name: &str) -> StoreResult<Option<LinkEntry>> {
        let name = validate_link_name(name)?;
        let dir = self.entry_dir(name);
        if !self.runtime.is_dir(&dir) {
            return Ok(None);
        }
        let manifest = load_manifest(self.runtime, &dir)?;
        Ok(Some(LinkEntry {
            name: name.to_string(),
            dir,
            manifest,
        }))
    }

    /// Find the entry whose symlink lives at `user_path`.
    #[tracing::instrument(skip(self))]
    pub fn find_link_by_user_path(
        &self,
        user_path: &Path,
        package_id: &str,
        package_provider: &str,
    ) -> StoreResult<Option<LinkEntry>> {
        let abs = resolve_user_path(self.env, user_path)?;
        Ok(self
            .list_links(package_id, package_provider)?
            .into_iter()
            .find(|entry| entry.manifest.user_path == abs))
    }

    /// Forget the package an entry belongs to. Symlink and content stay.
    #[tracing::instrument(skip(self))]
    pub fn clear_link_package_association(&self, entry_dir: &Path) -> StoreResult<()> {
        let mut manifest: LinkManifest = load_manifest(self.runtime, entry_dir)?;
        manifest.package_id.clear();
        manifest.package_provider.clear();
        save_manifest(self.runtime, entry_dir, &manifest)
    }

    /// Compare the live user path with what the manifest promises.
    pub fn link_status(&self, entry: &LinkEntry) -> LinkStatus {
        let user_path = &entry.manifest.user_path;
        if !self.runtime.is_symlink(user_path) {
            return if self.runtime.exists(user_path) {
                LinkStatus::NotSymlink
            } else {
                LinkStatus::NotExists
            };
        }
        match self.runtime.read_link(user_path) {
            Ok(target) if target == entry.content_path() => LinkStatus::Valid,
            Ok(_) => LinkStatus::WrongTarget,
            Err(e) => {
                debug!("Cannot read {}: {}", user_path.display(), e);
                LinkStatus::Unresolvable
            }
        }
    }
}

fn restore_staging_path(user_path: &Path) -> StoreResult<PathBuf> {
    let (Some(parent), Some(file_name)) = (user_path.parent(), user_path.file_name()) else {
        return Err(StoreError::validation(format!(
            "cannot restore to {}",
            user_path.display()
        )));
    };
    let mut staged_name = std::ffi::OsString::from(".");
    staged_name.push(file_name);
    staged_name.push(RESTORE_SUFFIX);
    Ok(parent.join(staged_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use crate::store::MANIFEST_FILENAME;
    use crate::test_utils::FaultRuntime;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// Temp home with the managed root at `<home>/.al`; cwd is the home.
    fn setup() -> (TempDir, Environment) {
        let dir = tempdir().unwrap();
        let home = dir.path().join("home");
        fs::create_dir_all(&home).unwrap();
        let env = Environment::new(home.join(".al"), &home, &home);
        (dir, env)
    }

    #[test]
    fn test_add_link_existing_file() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join("x/.vimrc");
        fs::create_dir_all(user_path.parent().unwrap()).unwrap();
        fs::write(&user_path, "abc").unwrap();

        let entry = store
            .add_link("vimrc", &user_path, LinkType::File, "", "")
            .unwrap();

        let content = env.link_root().join("vimrc/content");
        assert_eq!(entry.dir, env.link_root().join("vimrc"));
        assert_eq!(entry.content_path(), content);
        assert_eq!(fs::read_to_string(&content).unwrap(), "abc");
        assert!(user_path.is_symlink());
        assert_eq!(fs::read_link(&user_path).unwrap(), content);
        assert_eq!(fs::read_to_string(&user_path).unwrap(), "abc");
    }

    #[test]
    fn test_manifest_json_layout() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join(".zshrc");
        fs::write(&user_path, "export A=1").unwrap();

        store
            .add_link("zshrc", &user_path, LinkType::File, "", "")
            .unwrap();
        let raw = fs::read_to_string(env.link_root().join("zshrc").join(MANIFEST_FILENAME)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["user_path"], user_path.to_str().unwrap());
        assert_eq!(json["type"], "file");
        assert!(json.get("package_id").is_none());
        assert!(json.get("package_provider").is_none());

        store
            .add_link("gitconfig", Path::new("~/.gitconfig"), LinkType::File, "formula:git", "brew")
            .unwrap();
        let raw =
            fs::read_to_string(env.link_root().join("gitconfig").join(MANIFEST_FILENAME)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["package_id"], "formula:git");
        assert_eq!(json["package_provider"], "brew");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_round_trip_restores_content_and_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join("bin/tool.sh");
        fs::create_dir_all(user_path.parent().unwrap()).unwrap();
        fs::write(&user_path, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(&user_path, fs::Permissions::from_mode(0o741)).unwrap();

        let entry = store
            .add_link("tool", &user_path, LinkType::File, "", "")
            .unwrap();
        store.remove_link(&entry, false).unwrap();

        assert!(!user_path.is_symlink());
        assert_eq!(fs::read_to_string(&user_path).unwrap(), "#!/bin/sh\necho hi\n");
        assert_eq!(
            fs::metadata(&user_path).unwrap().permissions().mode() & 0o777,
            0o741
        );
        assert!(!entry.dir.exists());
        assert!(!env.home().join("bin/.tool.sh.al-restore").exists());
    }

    #[test]
    fn test_dir_round_trip_restores_tree() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join(".config/nvim");
        fs::create_dir_all(user_path.join("lua")).unwrap();
        fs::write(user_path.join("init.lua"), "require('a')").unwrap();
        fs::write(user_path.join("lua/a.lua"), "return 1").unwrap();

        assert_eq!(store.detect_link_type(&user_path).unwrap(), LinkType::Dir);
        let entry = store
            .add_link("nvim", &user_path, LinkType::Dir, "", "")
            .unwrap();

        assert!(user_path.is_symlink());
        assert_eq!(
            fs::read_to_string(env.link_root().join("nvim/content/lua/a.lua")).unwrap(),
            "return 1"
        );

        store.remove_link(&entry, false).unwrap();

        assert!(!user_path.is_symlink());
        assert!(user_path.is_dir());
        assert_eq!(fs::read_to_string(user_path.join("init.lua")).unwrap(), "require('a')");
        assert_eq!(fs::read_to_string(user_path.join("lua/a.lua")).unwrap(), "return 1");
        assert!(!entry.dir.exists());
    }

    #[test]
    fn test_purge_leaves_nothing() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join(".tmux.conf");
        fs::write(&user_path, "set -g mouse on").unwrap();

        let entry = store
            .add_link("tmux", &user_path, LinkType::File, "", "")
            .unwrap();
        store.remove_link(&entry, true).unwrap();

        assert!(!user_path.exists());
        assert!(!user_path.is_symlink());
        assert!(!entry.dir.exists());
    }

    #[test]
    fn test_add_link_missing_path_creates_placeholders() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);

        let file_path = env.home().join("new/deep/.inputrc");
        let entry = store
            .add_link("inputrc", &file_path, LinkType::File, "", "")
            .unwrap();
        assert!(file_path.is_symlink());
        assert_eq!(fs::read_to_string(entry.content_path()).unwrap(), "");

        let dir_input = PathBuf::from("~/.config/alacritty/");
        let link_type = store.detect_link_type(&dir_input).unwrap();
        assert_eq!(link_type, LinkType::Dir);
        let entry = store
            .add_link("alacritty", &dir_input, link_type, "", "")
            .unwrap();
        assert_eq!(entry.manifest.user_path, env.home().join(".config/alacritty"));
        assert!(entry.content_path().is_dir());
        assert!(env.home().join(".config/alacritty").is_symlink());
    }

    #[test]
    fn test_detect_link_type_for_missing_paths_is_stable() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);

        for _ in 0..2 {
            assert_eq!(
                store.detect_link_type(Path::new("~/nothing/here")).unwrap(),
                LinkType::File
            );
            assert_eq!(
                store.detect_link_type(Path::new("~/nothing/here/")).unwrap(),
                LinkType::Dir
            );
        }

        // existing paths are classified by stat
        let existing = env.home().join("f");
        fs::write(&existing, "").unwrap();
        assert_eq!(store.detect_link_type(&existing).unwrap(), LinkType::File);
    }

    #[test]
    fn test_add_link_name_conflict() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        store
            .add_link("dup", Path::new("~/a"), LinkType::File, "", "")
            .unwrap();

        let err = store
            .add_link("dup", Path::new("~/b"), LinkType::File, "", "")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(!env.home().join("b").exists());
    }

    #[test]
    fn test_invalid_link_names() {
        for name in ["", "  ", ".", "..", "..hidden", "a/b", "a\\b", "with space", "ümlaut", "a:b"] {
            assert!(
                matches!(validate_link_name(name), Err(StoreError::Validation(_))),
                "{:?} should be rejected",
                name
            );
        }
        for name in ["vimrc", "my.config", "a_b-c", ".zshrc", " trimmed "] {
            assert!(validate_link_name(name).is_ok(), "{:?} should be accepted", name);
        }
        assert_eq!(validate_link_name(" trimmed ").unwrap(), "trimmed");
    }

    #[test]
    fn test_add_link_rejects_invalid_name_before_touching_disk() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);

        let err = store
            .add_link("../escape", Path::new("~/a"), LinkType::File, "", "")
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(!env.link_root().exists());
    }

    #[test]
    fn test_add_link_rejects_managed_root_overlap() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);

        let inside = store
            .add_link("inside", &env.root().join("x"), LinkType::File, "", "")
            .unwrap_err();
        assert!(matches!(inside, StoreError::Validation(_)));

        let home = store
            .add_link("home", Path::new("~"), LinkType::Dir, "", "")
            .unwrap_err();
        assert!(matches!(home, StoreError::Validation(_)));
    }

    #[test]
    fn test_add_link_rejects_type_mismatch() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let file = env.home().join("plain");
        fs::write(&file, "x").unwrap();

        let err = store
            .add_link("plain", &file, LinkType::Dir, "", "")
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(!file.is_symlink());
        assert!(!env.link_root().join("plain").exists());
    }

    #[test_log::test]
    fn test_add_link_rolls_back_when_parent_cannot_be_created() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        // A regular file where a parent directory would have to be created
        fs::write(env.home().join("blocker"), "x").unwrap();

        let result = store.add_link(
            "blocked",
            Path::new("~/blocker/child/file"),
            LinkType::File,
            "",
            "",
        );

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(!env.link_root().join("blocked").exists());
        assert_eq!(fs::read_to_string(env.home().join("blocker")).unwrap(), "x");
    }

    #[test_log::test]
    fn test_add_link_restores_original_when_symlink_fails() {
        let (_dir, env) = setup();
        let runtime = FaultRuntime {
            fail_symlink: true,
            ..Default::default()
        };
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join(".vimrc");
        fs::write(&user_path, "abc").unwrap();

        let err = store
            .add_link("vimrc", &user_path, LinkType::File, "", "")
            .unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert!(!user_path.is_symlink());
        assert_eq!(fs::read_to_string(&user_path).unwrap(), "abc");
        assert!(!env.link_root().join("vimrc").exists());
    }

    #[test_log::test]
    fn test_add_link_restores_directory_when_removal_fails_partway() {
        let (_dir, env) = setup();
        let user_dir = env.home().join("cfg");
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(user_dir.join("a.txt"), "precious").unwrap();
        fs::write(user_dir.join("b.txt"), "b").unwrap();
        let runtime = FaultRuntime {
            partial_remove_dir: Some(user_dir.clone()),
            ..Default::default()
        };
        let store = LinkStore::new(&runtime, &env);

        let err = store
            .add_link("cfg", &user_dir, LinkType::Dir, "", "")
            .unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert!(!user_dir.is_symlink());
        assert_eq!(fs::read_to_string(user_dir.join("a.txt")).unwrap(), "precious");
        assert_eq!(fs::read_to_string(user_dir.join("b.txt")).unwrap(), "b");
        assert!(!env.link_root().join("cfg").exists());
    }

    #[test_log::test]
    fn test_add_link_keeps_entry_when_original_cannot_be_restored() {
        let (_dir, env) = setup();
        let user_dir = env.home().join("cfg");
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(user_dir.join("a.txt"), "precious").unwrap();
        fs::write(user_dir.join("b.txt"), "b").unwrap();
        let runtime = FaultRuntime {
            partial_remove_dir: Some(user_dir.clone()),
            fail_copy_under: Some(user_dir.clone()),
            ..Default::default()
        };
        let store = LinkStore::new(&runtime, &env);

        let err = store
            .add_link("cfg", &user_dir, LinkType::Dir, "", "")
            .unwrap_err();

        let content = env.link_root().join("cfg").join("content");
        assert!(err.to_string().contains(&content.display().to_string()));
        assert_eq!(fs::read_to_string(content.join("a.txt")).unwrap(), "precious");
        assert_eq!(fs::read_to_string(content.join("b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_list_links_sorted_filtered_and_skips_corrupt() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);

        assert!(store.list_links("", "").unwrap().is_empty());

        store
            .add_link("zeta", Path::new("~/z"), LinkType::File, "formula:git", "brew")
            .unwrap();
        store
            .add_link("alpha", Path::new("~/a"), LinkType::File, "", "")
            .unwrap();
        store
            .add_link("mid", Path::new("~/m"), LinkType::File, "formula:git", "mas")
            .unwrap();
        fs::create_dir_all(env.link_root().join("broken")).unwrap();
        fs::write(env.link_root().join("broken").join(MANIFEST_FILENAME), "{").unwrap();

        let names: Vec<_> = store
            .list_links("", "")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);

        let names: Vec<_> = store
            .list_links("formula:git", "brew")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["zeta"]);

        // half a filter is no filter
        assert_eq!(store.list_links("formula:git", "").unwrap().len(), 3);
    }

    #[test]
    fn test_get_link_by_name() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);

        assert!(store.get_link_by_name("missing").unwrap().is_none());
        assert!(store.get_link_by_name("../x").is_err());

        let added = store
            .add_link("vimrc", Path::new("~/.vimrc"), LinkType::File, "", "")
            .unwrap();
        let found = store.get_link_by_name("vimrc").unwrap().unwrap();
        assert_eq!(found, added);
    }

    #[test]
    fn test_find_link_by_user_path() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        store
            .add_link("vimrc", Path::new("~/.vimrc"), LinkType::File, "formula:vim", "brew")
            .unwrap();

        let found = store
            .find_link_by_user_path(&env.home().join(".vimrc"), "", "")
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "vimrc");

        assert!(
            store
                .find_link_by_user_path(Path::new("./.vimrc"), "formula:vim", "brew")
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_link_by_user_path(Path::new("~/.vimrc"), "formula:neovim", "brew")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_clear_link_package_association() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let entry = store
            .add_link("gitconfig", Path::new("~/.gitconfig"), LinkType::File, "formula:git", "brew")
            .unwrap();

        store.clear_link_package_association(&entry.dir).unwrap();

        let reloaded = store.get_link_by_name("gitconfig").unwrap().unwrap();
        assert!(!reloaded.manifest.has_package());
        assert!(reloaded.manifest.package_provider.is_empty());
        assert_eq!(reloaded.manifest.user_path, entry.manifest.user_path);
        assert!(store.link_status(&reloaded).is_valid());
    }

    #[test]
    fn test_link_status() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let entry = store
            .add_link("rc", Path::new("~/.rc"), LinkType::File, "", "")
            .unwrap();
        let user_path = &entry.manifest.user_path;
        assert_eq!(store.link_status(&entry), LinkStatus::Valid);

        fs::remove_file(user_path).unwrap();
        assert_eq!(store.link_status(&entry), LinkStatus::NotExists);

        fs::write(user_path, "replaced").unwrap();
        assert_eq!(store.link_status(&entry), LinkStatus::NotSymlink);

        fs::remove_file(user_path).unwrap();
        runtime.symlink(&env.home().join("elsewhere"), user_path).unwrap();
        assert_eq!(store.link_status(&entry), LinkStatus::WrongTarget);
    }

    #[test]
    fn test_remove_link_refuses_real_file_at_user_path() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let entry = store
            .add_link("rc", Path::new("~/.rc"), LinkType::File, "", "")
            .unwrap();
        fs::remove_file(&entry.manifest.user_path).unwrap();
        fs::write(&entry.manifest.user_path, "user edit").unwrap();

        let err = store.remove_link(&entry, true).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(
            fs::read_to_string(&entry.manifest.user_path).unwrap(),
            "user edit"
        );
        assert!(entry.dir.exists());
    }

    #[test]
    fn test_remove_link_tolerates_missing_symlink() {
        let (_dir, env) = setup();
        let runtime = RealRuntime;
        let store = LinkStore::new(&runtime, &env);
        let user_path = env.home().join(".profile");
        fs::write(&user_path, "PATH=$PATH:~/bin").unwrap();
        let entry = store
            .add_link("profile", &user_path, LinkType::File, "", "")
            .unwrap();
        fs::remove_file(&user_path).unwrap();

        store.remove_link(&entry, false).unwrap();

        assert_eq!(fs::read_to_string(&user_path).unwrap(), "PATH=$PATH:~/bin");
        assert!(!entry.dir.exists());
    }

    #[test]
    fn test_link_type_parse_and_display() {
        assert_eq!("file".parse::<LinkType>().unwrap(), LinkType::File);
        assert_eq!("dir".parse::<LinkType>().unwrap(), LinkType::Dir);
        assert!("folder".parse::<LinkType>().is_err());
        assert_eq!(LinkType::Dir.to_string(), "dir");
    }
}
