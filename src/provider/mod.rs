//! Package providers known to the tool.
//!
//! The stores only ever see `(id, provider)` strings; this module gives those
//! provider names a closed set of kinds and describes the package manager
//! behind each one.

mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::runtime::Runtime;

pub use registry::ProviderRegistry;

/// Provider kind identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Brew,
    Mas,
    Manual,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Brew, ProviderKind::Mas, ProviderKind::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Brew => "brew",
            ProviderKind::Mas => "mas",
            ProviderKind::Manual => "manual",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brew" => Ok(ProviderKind::Brew),
            "mas" => Ok(ProviderKind::Mas),
            "manual" => Ok(ProviderKind::Manual),
            _ => anyhow::bail!(
                "Unknown provider kind: {}. Expected brew, mas, or manual.",
                s
            ),
        }
    }
}

/// A package manager that packages can be associated with.
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// One-line human description.
    fn description(&self) -> &'static str;

    /// Executable the provider drives, `None` for providers without one.
    fn executable(&self) -> Option<&'static str>;

    /// Whether the provider's executable is found on `PATH`.
    fn is_available(&self, runtime: &dyn Runtime) -> bool {
        match self.executable() {
            Some(name) => find_on_path(runtime, name),
            None => true,
        }
    }
}

fn find_on_path(runtime: &dyn Runtime, name: &str) -> bool {
    let Ok(path) = runtime.env_var("PATH") else {
        return false;
    };
    std::env::split_paths(&path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .any(|dir| runtime.exists(&Path::new(&dir).join(name)))
}

/// Homebrew formulae and casks.
pub struct BrewProvider;

impl Provider for BrewProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Brew
    }

    fn description(&self) -> &'static str {
        "Homebrew formulae and casks"
    }

    fn executable(&self) -> Option<&'static str> {
        Some("brew")
    }
}

/// Mac App Store apps through the `mas` CLI.
pub struct MasProvider;

impl Provider for MasProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mas
    }

    fn description(&self) -> &'static str {
        "Mac App Store applications"
    }

    fn executable(&self) -> Option<&'static str> {
        Some("mas")
    }
}

/// Packages installed by hand; nothing to run.
pub struct ManualProvider;

impl Provider for ManualProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Manual
    }

    fn description(&self) -> &'static str {
        "Manually installed software"
    }

    fn executable(&self) -> Option<&'static str> {
        None
    }
}
