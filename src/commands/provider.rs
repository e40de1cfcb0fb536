use anyhow::Result;

use crate::package::PackageResolver;
use crate::provider::{Provider, ProviderRegistry};
use crate::runtime::Runtime;

use super::config::Config;

/// List known providers and whether their executable is on `PATH`.
#[tracing::instrument(skip(config, registry))]
pub fn provider_list<R: Runtime, P: PackageResolver>(
    config: &Config<R, P>,
    registry: &ProviderRegistry,
) -> Result<()> {
    for provider in registry.providers() {
        println!("{}", format_provider(provider.as_ref(), &config.runtime));
    }
    Ok(())
}

fn format_provider(provider: &dyn Provider, runtime: &dyn Runtime) -> String {
    let availability = match provider.executable() {
        Some(exe) if provider.is_available(runtime) => format!("{} found", exe),
        Some(exe) => format!("{} not found on PATH", exe),
        None => "built in".to_string(),
    };
    format!(
        "{:<8} {} ({})",
        provider.kind(),
        provider.description(),
        availability
    )
}
