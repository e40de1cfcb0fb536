use anyhow::{Result, bail};
use std::cell::OnceCell;
use std::path::PathBuf;

use crate::package::{JsonPackageResolver, PackageRef, PackageResolver};
use crate::runtime::Runtime;
use crate::store::Environment;

type ResolverLoader<R, P> = fn(&R, &Environment) -> Result<P>;

/// Everything a command needs: the runtime, the resolved environment and a
/// way to turn package names into `(id, provider)` pairs.
///
/// The resolver is loaded on first use, so commands that never name a
/// package do not read `packages.json`.
pub struct Config<R: Runtime, P: PackageResolver> {
    pub runtime: R,
    pub env: Environment,
    resolver: OnceCell<P>,
    load_resolver: ResolverLoader<R, P>,
}

impl<R: Runtime> Config<R, JsonPackageResolver> {
    pub fn new(runtime: R, root: Option<PathBuf>) -> Result<Self> {
        let env = Environment::detect(&runtime, root)?;
        Ok(Self {
            runtime,
            env,
            resolver: OnceCell::new(),
            load_resolver: JsonPackageResolver::load::<R>,
        })
    }
}

impl<R: Runtime, P: PackageResolver> Config<R, P> {
    pub fn with_resolver(runtime: R, env: Environment, resolver: P) -> Self {
        Self {
            runtime,
            env,
            resolver: OnceCell::from(resolver),
            load_resolver: |_, _| bail!("package resolver already provided"),
        }
    }

    pub fn resolver(&self) -> Result<&P> {
        if let Some(resolver) = self.resolver.get() {
            return Ok(resolver);
        }
        let loaded = (self.load_resolver)(&self.runtime, &self.env)?;
        Ok(self.resolver.get_or_init(|| loaded))
    }

    pub fn resolve_package(&self, name: &str) -> Result<PackageRef> {
        self.resolver()?.resolve(name)
    }

    /// Resolve an optional `--package` flag to the `(id, provider)` filter
    /// the stores take. No flag means no filter.
    pub fn package_filter(&self, package: Option<&str>) -> Result<(String, String)> {
        match package {
            Some(name) => {
                let pkg = self.resolve_package(name)?;
                Ok((pkg.id, pkg.provider))
            }
            None => Ok((String::new(), String::new())),
        }
    }

    /// `$EDITOR`, or vim.
    pub fn editor(&self) -> String {
        self.runtime
            .env_var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vim".to_string())
    }
}
