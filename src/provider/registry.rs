use std::collections::HashMap;
use std::sync::Arc;

use crate::types::ModelKind;

use super::traits::TextProvider;

/// Routes each persona's model to a provider, falling back to a default.
pub struct ProviderRegistry {
    providers: HashMap<ModelKind, Arc<dyn TextProvider>>,
    default: Arc<dyn TextProvider>,
}

impl ProviderRegistry {
    pub fn new(default: Arc<dyn TextProvider>) -> Self {
        Self {
            providers: HashMap::new(),
            default,
        }
    }

    pub fn register(&mut self, model: ModelKind, provider: Arc<dyn TextProvider>) {
        self.providers.insert(model, provider);
    }

    pub fn with(mut self, model: ModelKind, provider: Arc<dyn TextProvider>) -> Self {
        self.register(model, provider);
        self
    }

    /// Provider for `model`, or the default when none is registered.
    pub fn get(&self, model: &ModelKind) -> Arc<dyn TextProvider> {
        self.providers
            .get(model)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn has(&self, model: &ModelKind) -> bool {
        self.providers.contains_key(model)
    }

    pub fn default_provider(&self) -> Arc<dyn TextProvider> {
        self.default.clone()
    }

    pub fn models(&self) -> Vec<ModelKind> {
        self.providers.keys().cloned().collect()
    }
}

impl From<Arc<dyn TextProvider>> for ProviderRegistry {
    fn from(default: Arc<dyn TextProvider>) -> Self {
        Self::new(default)
    }
}
