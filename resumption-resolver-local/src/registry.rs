//! SourceRegistry — the explicit service context handed to a resolver.

use crate::source::Source;
use resumption_core::SourceId;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps source identities to the adapters that serve them.
///
/// Owned by whoever builds the resolver; there is no process-wide lookup.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceId, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `id`, replacing any previous adapter.
    pub fn register(&mut self, id: impl Into<SourceId>, source: Arc<dyn Source>) {
        self.sources.insert(id.into(), source);
    }

    /// Builder form of [`SourceRegistry::register`].
    pub fn with(mut self, id: impl Into<SourceId>, source: Arc<dyn Source>) -> Self {
        self.register(id, source);
        self
    }

    /// The adapter registered under `id`.
    pub fn get(&self, id: &SourceId) -> Option<&Arc<dyn Source>> {
        self.sources.get(id)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
