//! Routes
//!
//! Maps rollup identifiers to the endpoints of their trusted full nodes.
//! The table is loaded once from configuration and read-only afterwards.

use std::collections::HashMap;

/// The configured rollup id to full node endpoint mapping.
pub type FullNodeRpcs = HashMap<u32, String>;

/// Route Registry
///
/// A pure lookup from rollup identifier to full node endpoint. A missing
/// route is the cheapest possible rejection for a claim and short-circuits
/// the pipeline before any network or cryptographic work.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: FullNodeRpcs,
}

impl RouteRegistry {
    /// Constructs a registry from the configured endpoint table.
    pub fn new(routes: FullNodeRpcs) -> Self {
        Self { routes }
    }

    /// Resolves the full node endpoint for a rollup.
    pub fn resolve(&self, rollup_id: u32) -> Option<&str> {
        self.routes.get(&rollup_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_rollups() {
        let registry =
            RouteRegistry::new(FullNodeRpcs::from([(1, "http://node:8123".to_string())]));
        assert_eq!(registry.resolve(1), Some("http://node:8123"));
        assert_eq!(registry.resolve(2), None);
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = RouteRegistry::default();
        assert_eq!(registry.resolve(1), None);
    }
}
