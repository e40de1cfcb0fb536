use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::link::{LinkEntry, LinkStore};
use crate::package::PackageResolver;
use crate::runtime::Runtime;

use super::config::Config;

/// How `link remove` and `link edit` pick an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSelector {
    Name(String),
    Path(PathBuf),
}

/// Move `path` into link.d under `name` and leave a symlink behind.
#[tracing::instrument(skip(config))]
pub fn link_add<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    name: &str,
    path: &Path,
    package: Option<&str>,
) -> Result<()> {
    let (package_id, package_provider) = config
        .package_filter(package)
        .context("resolving package")?;
    let store = LinkStore::new(&config.runtime, &config.env);

    let link_type = store.detect_link_type(path)?;
    debug!("Detected {} as {}", path.display(), link_type);
    let entry = store.add_link(name, path, link_type, &package_id, &package_provider)?;

    println!(
        "Added link {} -> {} (type: {})",
        entry.name,
        entry.manifest.user_path.display(),
        link_type
    );
    Ok(())
}

#[tracing::instrument(skip(config))]
pub fn link_list<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    package: Option<&str>,
) -> Result<()> {
    let (package_id, package_provider) = config
        .package_filter(package)
        .context("resolving package")?;
    let store = LinkStore::new(&config.runtime, &config.env);
    let links = store.list_links(&package_id, &package_provider)?;

    if links.is_empty() {
        println!("(no links)");
        return Ok(());
    }
    for entry in &links {
        println!("{}", format_link(entry));
    }
    Ok(())
}

/// Undo a link, restoring the original unless `purge` is set.
#[tracing::instrument(skip(config))]
pub fn link_remove<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    selector: &LinkSelector,
    package: Option<&str>,
    purge: bool,
    yes: bool,
) -> Result<()> {
    let store = LinkStore::new(&config.runtime, &config.env);
    let entry = find_entry(config, &store, selector, package)?;

    if purge && !yes {
        let prompt = format!(
            "Delete {} and its stored content without restoring it?",
            entry.manifest.user_path.display()
        );
        if !config.runtime.confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.remove_link(&entry, purge)?;

    let verb = if purge { "Purged" } else { "Removed" };
    println!("{} link {}", verb, entry.manifest.user_path.display());
    Ok(())
}

/// Open the stored content of a link in `$EDITOR`.
#[tracing::instrument(skip(config))]
pub fn link_edit<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    selector: &LinkSelector,
    package: Option<&str>,
) -> Result<()> {
    let store = LinkStore::new(&config.runtime, &config.env);
    let entry = find_entry(config, &store, selector, package)?;
    let editor = config.editor();
    config
        .runtime
        .open_editor(&editor, &entry.content_path())
        .with_context(|| format!("running {}", editor))
}

/// Check every link's symlink against its manifest.
#[tracing::instrument(skip(config))]
pub fn link_status<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    package: Option<&str>,
) -> Result<()> {
    let (package_id, package_provider) = config
        .package_filter(package)
        .context("resolving package")?;
    let store = LinkStore::new(&config.runtime, &config.env);
    let links = store.list_links(&package_id, &package_provider)?;

    if links.is_empty() {
        println!("(no links)");
        return Ok(());
    }

    let mut broken = 0;
    for entry in &links {
        let status = store.link_status(entry);
        if !status.is_valid() {
            broken += 1;
        }
        println!(
            "{} {} -> {}: {}",
            if status.is_valid() { "✓" } else { "✗" },
            entry.name,
            entry.manifest.user_path.display(),
            status
        );
    }
    if broken > 0 {
        println!("\n{} of {} links need attention.", broken, links.len());
    }
    Ok(())
}

fn find_entry<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    store: &LinkStore<'_, R>,
    selector: &LinkSelector,
    package: Option<&str>,
) -> Result<LinkEntry> {
    let (package_id, package_provider) = config
        .package_filter(package)
        .context("resolving package")?;
    match selector {
        LinkSelector::Name(name) => {
            let entry = store
                .get_link_by_name(name)?
                .ok_or_else(|| StoreError::NotFound(format!("link not found: {}", name)))?;
            if !package_id.is_empty()
                && (entry.manifest.package_id != package_id
                    || entry.manifest.package_provider != package_provider)
            {
                anyhow::bail!("link {} does not belong to the given package", name);
            }
            Ok(entry)
        }
        LinkSelector::Path(path) => Ok(store
            .find_link_by_user_path(path, &package_id, &package_provider)?
            .ok_or_else(|| {
                StoreError::NotFound(format!("link not found for path {}", path.display()))
            })?),
    }
}

fn format_link(entry: &LinkEntry) -> String {
    let mut line = format!(
        "{} -> {} ({})",
        entry.name,
        entry.manifest.user_path.display(),
        entry.manifest.link_type
    );
    if entry.manifest.has_package() {
        line.push_str(&format!(
            " [package: {}/{}]",
            entry.manifest.package_id, entry.manifest.package_provider
        ));
    }
    line
}
