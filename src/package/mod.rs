//! Package records and name resolution.
//!
//! Package records live in `<root>/packages.json`. The stores never read
//! them; commands resolve a display name to a [`PackageRef`] first and hand
//! the `(id, provider)` pair to the store.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::runtime::Runtime;
use crate::store::Environment;

/// One installed package in one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PackageRecord {
    /// brew: `formula:<name>`, `cask:<name>` or `tap:<name>`; mas: the app id.
    pub id: String,
    /// Display name used on the command line.
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `packages.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackagesFile {
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
}

/// The `(id, provider)` pair a package is known by in the stores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackageRef {
    pub id: String,
    pub provider: String,
    pub name: String,
}

impl PackageRef {
    pub fn new(id: impl Into<String>, provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            name: name.into(),
        }
    }
}

impl From<&PackageRecord> for PackageRef {
    fn from(record: &PackageRecord) -> Self {
        Self::new(&record.id, &record.provider, &record.name)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (provider: {})", self.name, self.provider)
    }
}

/// Turns the package name a user typed into a unique package.
#[cfg_attr(test, mockall::automock)]
pub trait PackageResolver {
    fn resolve(&self, name: &str) -> Result<PackageRef>;
}

/// Resolver backed by `packages.json`.
pub struct JsonPackageResolver {
    records: Vec<PackageRecord>,
}

impl JsonPackageResolver {
    pub fn new(records: Vec<PackageRecord>) -> Self {
        Self { records }
    }

    /// Load `packages.json`; a missing file means no packages.
    #[tracing::instrument(skip(runtime, env))]
    pub fn load<R: Runtime>(runtime: &R, env: &Environment) -> Result<Self> {
        let path = env.packages_file();
        if !runtime.exists(&path) {
            debug!("No package records at {}", path.display());
            return Ok(Self::new(Vec::new()));
        }
        let content = runtime.read_to_string(&path)?;
        let file: PackagesFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self::new(file.packages))
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }
}

impl PackageResolver for JsonPackageResolver {
    fn resolve(&self, name: &str) -> Result<PackageRef> {
        let name = name.trim();
        let mut matches: Vec<PackageRef> = self
            .records
            .iter()
            .filter(|record| record.name == name)
            .map(PackageRef::from)
            .collect();
        // the same package in several profiles is still one package
        matches.sort();
        matches.dedup_by(|a, b| a.id == b.id && a.provider == b.provider);

        match matches.len() {
            0 => anyhow::bail!("package '{}' not found", name),
            1 => Ok(matches.remove(0)),
            _ => {
                let candidates: Vec<String> = matches
                    .iter()
                    .map(|m| format!("{} ({})", m.id, m.provider))
                    .collect();
                anyhow::bail!(
                    "package name '{}' is ambiguous: {}",
                    name,
                    candidates.join(", ")
                )
            }
        }
    }
}
