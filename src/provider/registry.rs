//! Registry of the providers this tool knows about.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::{BrewProvider, ManualProvider, MasProvider, Provider, ProviderKind};

/// Registry for looking up providers by kind or by name.
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderKind, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Registry with brew, mas and manual registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BrewProvider));
        registry.register(Arc::new(MasProvider));
        registry.register(Arc::new(ManualProvider));
        registry
    }

    /// Register a provider for its kind, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let kind = provider.kind();
        self.providers.insert(kind, provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn Provider>> {
        self.providers.get(&kind)
    }

    /// Resolve a provider from the name stored in package records.
    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn Provider>> {
        let kind = name.parse::<ProviderKind>()?;
        self.providers
            .get(&kind)
            .with_context(|| format!("No provider registered for kind: {}", kind))
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.keys().copied().collect()
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.values()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
