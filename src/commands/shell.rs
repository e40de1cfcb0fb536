use anyhow::{Context, Result};
use std::path::Path;

use crate::package::{PackageRef, PackageResolver};
use crate::runtime::Runtime;
use crate::shell::{Shell, ShellStore, package_dir_name, render_activation};

use super::config::Config;

/// Print a package's shell.d manifest and its snippets for the current shell.
#[tracing::instrument(skip(config))]
pub fn shell_show<R: Runtime, P: PackageResolver>(config: &Config<R, P>, package: &str) -> Result<()> {
    let pkg = config.resolve_package(package)?;
    let store = ShellStore::new(&config.runtime, &config.env);
    let dir = store.package_dir(&pkg.id, &pkg.provider);

    if !config.runtime.is_dir(&dir) {
        println!("No shell.d entry for {}", pkg);
        println!("Path: {} (directory does not exist)", dir.display());
        return Ok(());
    }

    let manifest = store.load_manifest(&dir).context("loading manifest")?;
    println!("Package: {}", pkg);
    println!("Path: {}", dir.display());
    println!("Enabled: {}", manifest.enabled);
    if !manifest.after.is_empty() {
        println!("After: {}", manifest.after);
    }

    let shell = Shell::detect(&config.runtime);
    let paths = store.snippet_files_in_dir(&dir, shell.ext())?;
    if paths.is_empty() {
        println!("(no snippet files)");
        return Ok(());
    }
    for path in paths {
        println!("--- {}", file_name(&path));
        println!("{}", config.runtime.read_to_string(&path)?);
    }
    Ok(())
}

/// Write the snippet for the current shell and optionally record `--after`.
#[tracing::instrument(skip(config, command))]
pub fn shell_set<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    package: &str,
    command: &str,
    after: Option<&str>,
) -> Result<()> {
    let pkg = config.resolve_package(package)?;
    let after_key = match after {
        Some(name) => {
            let dep = config
                .resolve_package(name)
                .context("resolving --after package")?;
            if same_package(&dep, &pkg) {
                anyhow::bail!("{} cannot be loaded after itself", pkg.name);
            }
            Some(package_dir_name(&dep.id, &dep.provider))
        }
        None => None,
    };

    let store = ShellStore::new(&config.runtime, &config.env);
    let dir = store.ensure_package_dir(&pkg.id, &pkg.provider)?;
    let shell = Shell::detect(&config.runtime);
    store.write_snippet(&dir, shell, command)?;

    let mut manifest = store.load_manifest(&dir)?;
    if let Some(key) = after_key {
        manifest.after = key;
    }
    store.save_manifest(&dir, &manifest)?;

    println!("Set {} shell snippet for {}", shell, pkg);
    Ok(())
}

/// Remove the package's shell.d directory.
#[tracing::instrument(skip(config))]
pub fn shell_unset<R: Runtime, P: PackageResolver>(config: &Config<R, P>, package: &str) -> Result<()> {
    let pkg = config.resolve_package(package)?;
    let store = ShellStore::new(&config.runtime, &config.env);
    let removed = store
        .remove_package_dir(&pkg.id, &pkg.provider)
        .context("removing shell.d")?;
    if removed {
        println!("Unset shell snippet for {}", pkg);
    } else {
        println!("No shell snippet set for {}", pkg);
    }
    Ok(())
}

/// Open the current shell's snippet in `$EDITOR`, creating it empty first.
#[tracing::instrument(skip(config))]
pub fn shell_edit<R: Runtime, P: PackageResolver>(config: &Config<R, P>, package: &str) -> Result<()> {
    let pkg = config.resolve_package(package)?;
    let store = ShellStore::new(&config.runtime, &config.env);
    let dir = store.ensure_package_dir(&pkg.id, &pkg.provider)?;
    let shell = Shell::detect(&config.runtime);

    let snippet = dir.join(format!("snippet{}", shell.ext()));
    if !config.runtime.exists(&snippet) {
        store.write_snippet(&dir, shell, "")?;
    }

    let editor = config.editor();
    config
        .runtime
        .open_editor(&editor, &snippet)
        .with_context(|| format!("running {}", editor))
}

/// Include or exclude the package from `al activate`, keeping its files.
#[tracing::instrument(skip(config))]
pub fn shell_set_enabled<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    package: &str,
    enabled: bool,
) -> Result<()> {
    let pkg = config.resolve_package(package)?;
    let store = ShellStore::new(&config.runtime, &config.env);
    let dir = store.package_dir(&pkg.id, &pkg.provider);
    store.set_enabled(&dir, enabled)?;

    let verb = if enabled { "Enabled" } else { "Disabled" };
    println!("{} shell snippet for {}", verb, pkg);
    Ok(())
}

/// Print shell code sourcing every enabled snippet in dependency order.
///
/// Meant for `eval "$(al activate zsh)"` in the shell's rc file.
#[tracing::instrument(skip(config))]
pub fn activate<R: Runtime, P: PackageResolver>(config: &Config<R, P>, shell: Shell) -> Result<()> {
    let store = ShellStore::new(&config.runtime, &config.env);
    let entries = store.enabled_entries_in_order(shell.ext())?;
    print!("{}", render_activation(&entries));
    Ok(())
}

fn same_package(a: &PackageRef, b: &PackageRef) -> bool {
    a.id == b.id && a.provider == b.provider
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
