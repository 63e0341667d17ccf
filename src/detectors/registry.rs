//! DetectorRegistry: register by id, enable/disable, filter by config.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use super::{AxiosDetector, Detector, FetchDetector};
use crate::config::ScanConfig;

/// Registry of detectors keyed by id.
///
/// Iteration order is by id, so detection output is stable regardless of
/// registration order.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: BTreeMap<String, Box<dyn Detector>>,
    disabled: HashSet<String>,
}

impl DetectorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detector. An existing detector with the same id is replaced
    /// and returned.
    pub fn register(&mut self, detector: Box<dyn Detector>) -> Option<Box<dyn Detector>> {
        let id = detector.id().to_string();
        let previous = self.detectors.insert(id.clone(), detector);
        if previous.is_some() {
            warn!(detector_id = %id, "detector re-registered, replacing previous instance");
        }
        previous
    }

    /// Remove a detector by id.
    pub fn unregister(&mut self, id: &str) -> Option<Box<dyn Detector>> {
        self.disabled.remove(id);
        self.detectors.remove(id)
    }

    /// Disable a specific detector by id.
    pub fn disable(&mut self, id: &str) {
        self.disabled.insert(id.to_string());
    }

    /// Enable a previously disabled detector.
    pub fn enable(&mut self, id: &str) {
        self.disabled.remove(id);
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.detectors.contains_key(id) && !self.disabled.contains(id)
    }

    /// Ids of enabled detectors allowed by `config.api_clients`.
    ///
    /// An empty allow-list selects every enabled detector.
    pub fn filter_by_config(&self, config: &ScanConfig) -> Vec<String> {
        self.detectors
            .keys()
            .filter(|id| self.is_enabled(id))
            .filter(|id| config.allows_client(id))
            .cloned()
            .collect()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Detector + 'static)> {
        self.detectors.get_mut(id).map(|d| d.as_mut())
    }

    /// Total number of registered detectors.
    pub fn count(&self) -> usize {
        self.detectors.len()
    }

    /// Clear every detector's per-file cache.
    pub fn clear_caches(&mut self) {
        for detector in self.detectors.values_mut() {
            detector.clear_cache();
        }
    }
}

/// Create a registry holding the built-in fetch and axios detectors.
pub fn create_default_registry(config: &ScanConfig) -> DetectorRegistry {
    let mut registry = DetectorRegistry::new();
    registry.register(Box::new(FetchDetector::new()));
    registry.register(Box::new(AxiosDetector::with_modules(
        config.client_modules("axios"),
    )));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiClientConfig;

    #[test]
    fn test_default_registry() {
        let registry = create_default_registry(&ScanConfig::new("."));
        assert_eq!(registry.count(), 2);
        assert!(registry.is_enabled("axios"));
        assert!(registry.is_enabled("fetch"));
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = DetectorRegistry::new();
        assert!(registry.register(Box::new(FetchDetector::new())).is_none());
        assert!(registry.register(Box::new(FetchDetector::new())).is_some());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_enable_disable() {
        let mut registry = create_default_registry(&ScanConfig::new("."));
        registry.disable("fetch");
        assert!(!registry.is_enabled("fetch"));
        assert!(registry.get_mut("fetch").is_some());
        assert_eq!(registry.filter_by_config(&ScanConfig::new(".")), vec!["axios"]);

        registry.enable("fetch");
        assert!(registry.is_enabled("fetch"));

        assert!(registry.unregister("fetch").is_some());
        assert!(!registry.is_enabled("fetch"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_filter_by_config() {
        let registry = create_default_registry(&ScanConfig::new("."));

        let mut config = ScanConfig::new(".");
        assert_eq!(registry.filter_by_config(&config), vec!["axios", "fetch"]);

        config.api_clients.push(ApiClientConfig::new("fetch"));
        assert_eq!(registry.filter_by_config(&config), vec!["fetch"]);

        config.api_clients = vec![ApiClientConfig::new("graphql")];
        assert!(registry.filter_by_config(&config).is_empty());
    }
}
