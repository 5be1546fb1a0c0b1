//! LLM provider registry.
//!
//! Providers are registered by name and looked up polymorphically. An
//! unknown name is a hard configuration error at lookup time, never a
//! silent fallback.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::base::LlmHandler;
use crate::errors::ConfigError;

#[derive(Default)]
pub struct LlmRegistry {
    handlers: HashMap<String, Arc<dyn LlmHandler>>,
}

impl LlmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a provider name, replacing any previous
    /// registration for that name.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn LlmHandler>) {
        let name = name.into();
        info!(provider = %name, "LLM provider registered");
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn LlmHandler>, ConfigError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: name.to_string(),
                available: self.provider_names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered provider names, sorted for stable error messages.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}
