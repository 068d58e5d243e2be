//! Registry of configured provider adapters.

use crate::adapter::ProviderAdapter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use stratus_core::{CoreError, CoreResult, Provider};

/// Per-provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub enabled: bool,

    /// Opaque path or secret id resolved by the deployment; never logged
    /// beyond its reference.
    pub credentials_ref: Option<String>,

    /// Container used when a request does not name one.
    pub default_container: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            credentials_ref: None,
            default_container: None,
        }
    }
}

/// The set of adapters this deployment is configured with.
pub struct ProviderRegistry {
    adapters: HashMap<Provider, Arc<ProviderAdapter>>,
    default_containers: HashMap<Provider, String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            default_containers: HashMap::new(),
        }
    }

    /// Register an adapter, optionally with a default container.
    pub fn register(
        &mut self,
        adapter: ProviderAdapter,
        default_container: Option<String>,
    ) -> &mut Self {
        let provider = adapter.provider();
        self.adapters.insert(provider, Arc::new(adapter));
        if let Some(container) = default_container {
            self.default_containers.insert(provider, container);
        }
        self
    }

    /// Adapter for a provider; `INVALID_ARGUMENT` when not configured.
    pub fn get(&self, provider: Provider) -> CoreResult<Arc<ProviderAdapter>> {
        self.adapters.get(&provider).cloned().ok_or_else(|| {
            CoreError::invalid_argument(format!("provider {} is not configured", provider))
        })
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.adapters.contains_key(&provider)
    }

    /// Providers with a registered adapter, in stable order.
    pub fn configured(&self) -> Vec<Provider> {
        let mut providers: Vec<_> = self.adapters.keys().copied().collect();
        providers.sort();
        providers
    }

    /// Resolve an explicit container name or fall back to the provider's
    /// configured default.
    pub fn container_for(
        &self,
        provider: Provider,
        explicit: Option<&str>,
    ) -> CoreResult<String> {
        if let Some(container) = explicit {
            return Ok(container.to_string());
        }
        self.default_containers
            .get(&provider)
            .cloned()
            .ok_or_else(|| {
                CoreError::invalid_argument(format!(
                    "no container named and provider {} has no default container",
                    provider
                ))
            })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderAdapter::Mock(MockAdapter::new(Provider::Aws)),
            Some("default-bucket".to_string()),
        );

        assert!(registry.is_configured(Provider::Aws));
        assert!(!registry.is_configured(Provider::Gcp));
        assert!(registry.get(Provider::Azure).is_err());
        assert_eq!(registry.configured(), vec![Provider::Aws]);
    }

    #[test]
    fn test_container_resolution() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderAdapter::Mock(MockAdapter::new(Provider::Aws)),
            Some("default-bucket".to_string()),
        );

        assert_eq!(
            registry.container_for(Provider::Aws, Some("explicit")).unwrap(),
            "explicit"
        );
        assert_eq!(
            registry.container_for(Provider::Aws, None).unwrap(),
            "default-bucket"
        );
        assert!(registry.container_for(Provider::Gcp, None).is_err());
    }
}
