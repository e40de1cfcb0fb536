//! The explicit environment every store operation runs against.

use anyhow::Context;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::runtime::{Runtime, resolve_relative_path};

/// Environment variable that overrides the managed root directory.
pub const ROOT_ENV_VAR: &str = "AL_HOME";

const DEFAULT_ROOT_DIR: &str = ".al";
const LINK_DIR: &str = "link.d";
const SHELL_DIR: &str = "shell.d";
const PACKAGES_FILE: &str = "packages.json";

/// Root, home and working directory, resolved once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    root: PathBuf,
    home: PathBuf,
    cwd: PathBuf,
}

impl Environment {
    pub fn new(root: impl Into<PathBuf>, home: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            home: home.into(),
            cwd: cwd.into(),
        }
    }

    /// Resolve the environment from the runtime.
    ///
    /// The root is `root_override` if given, else `$AL_HOME`, else `~/.al`.
    /// Relative roots are taken relative to the working directory.
    #[tracing::instrument(skip(runtime))]
    pub fn detect<R: Runtime>(runtime: &R, root_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let home = runtime
            .home_dir()
            .context("Could not find home directory")?;
        let cwd = runtime.current_dir()?;

        let root = match root_override {
            Some(root) => resolve_relative_path(&cwd, &root),
            None => match runtime.env_var(ROOT_ENV_VAR) {
                Ok(value) if !value.trim().is_empty() => {
                    resolve_relative_path(&cwd, Path::new(value.trim()))
                }
                _ => home.join(DEFAULT_ROOT_DIR),
            },
        };

        debug!("Using root {}", root.display());
        Ok(Self { root, home, cwd })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// `<root>/link.d`
    pub fn link_root(&self) -> PathBuf {
        self.root.join(LINK_DIR)
    }

    /// `<root>/shell.d`
    pub fn shell_root(&self) -> PathBuf {
        self.root.join(SHELL_DIR)
    }

    /// `<root>/packages.json`
    pub fn packages_file(&self) -> PathBuf {
        self.root.join(PACKAGES_FILE)
    }
}

/// Turn a user-supplied path into an absolute, normalized one.
///
/// `~` and `~/...` expand against the home directory, other relative paths
/// are taken relative to the working directory.
pub fn resolve_user_path(env: &Environment, path: &Path) -> StoreResult<PathBuf> {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation("path cannot be empty"));
    }

    if trimmed == "~" {
        return Ok(env.home.clone());
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return Ok(resolve_relative_path(&env.home, Path::new(rest)));
    }

    Ok(resolve_relative_path(&env.cwd, Path::new(trimmed)))
}
