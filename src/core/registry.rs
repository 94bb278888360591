//! Integration registry
//!
//! The registry is built once from the loaded integration definitions and is
//! read-only afterwards. There is no mutation API; reloading means building
//! a new registry. It can be shared across concurrent execute calls without
//! locking.

use std::{collections::HashMap, sync::Arc};

use log::{debug, info};

use super::error::{IntegratorError, IntegratorResult};
use crate::config::Integration;

#[derive(Debug, Default)]
pub struct IntegrationRegistry {
    integrations: HashMap<String, Arc<Integration>>,
}

impl IntegrationRegistry {
    /// Build the registry. Duplicate identifiers are a configuration error.
    pub fn new(integrations: Vec<Integration>) -> IntegratorResult<Self> {
        let mut map = HashMap::with_capacity(integrations.len());
        for integration in integrations {
            if map.contains_key(&integration.id) {
                return Err(crate::config_error!(
                    "duplicate integration id '{}'",
                    integration.id
                ));
            }
            debug!(
                "Registering integration '{}' with {} services ({})",
                integration.id,
                integration.services.len(),
                integration.flow
            );
            map.insert(integration.id.clone(), Arc::new(integration));
        }
        info!("Loaded {} integrations", map.len());
        Ok(Self { integrations: map })
    }

    /// Look up an integration by exact identifier.
    pub fn get(&self, id: &str) -> IntegratorResult<Arc<Integration>> {
        self.integrations
            .get(id)
            .cloned()
            .ok_or_else(|| IntegratorError::IntegrationNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.integrations.contains_key(id)
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.integrations.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowMode;

    fn integration(id: &str) -> Integration {
        Integration {
            id: id.to_string(),
            name: String::new(),
            description: String::new(),
            services: vec![],
            flow: FlowMode::Parallel,
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry =
            IntegrationRegistry::new(vec![integration("b"), integration("a")]).unwrap();
        assert_eq!(registry.ids().len(), 2);
        assert_eq!(registry.ids(), vec!["a", "b"]);
        assert!(registry.contains("a"));
        assert_eq!(registry.get("b").unwrap().id, "b");
        assert!(matches!(
            registry.get("c"),
            Err(IntegratorError::IntegrationNotFound(id)) if id == "c"
        ));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let err = IntegrationRegistry::new(vec![integration("a"), integration("a")]).unwrap_err();
        assert!(matches!(err, IntegratorError::Configuration(_)));
    }

    #[test]
    fn test_empty_registry() {
        let registry = IntegrationRegistry::default();
        assert!(registry.ids().is_empty());
        assert!(!registry.contains("anything"));
        assert!(registry.get("anything").is_err());
    }
}
