//! Domain manager registry.
//!
//! One manager per domain; the last registration wins and keeps the slot of
//! the first one, so scans always visit domains in first-registration order.
//!
//! Every registration bumps a generation counter. A scan that started under
//! an older generation must not publish its result to a cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tool_factory_domain::DomainManager;
use tracing::info;

/// Registered domain managers, in registration order
#[derive(Default)]
pub struct DomainRegistry {
    managers: RwLock<Vec<(String, Arc<dyn DomainManager>)>>,
    generation: AtomicU64,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the manager of `domain`.
    ///
    /// Returns `true` when an existing manager was replaced.
    pub fn register(&self, domain: impl Into<String>, manager: Arc<dyn DomainManager>) -> bool {
        let domain = domain.into();
        let mut managers = self.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(slot) = managers.iter_mut().find(|(name, _)| *name == domain) {
            slot.1 = manager;
            info!(domain = %domain, "Replaced domain manager");
            true
        } else {
            info!(domain = %domain, "Registered domain manager");
            managers.push((domain, manager));
            false
        }
    }

    /// Changes whenever a manager is registered or replaced
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get(&self, domain: &str) -> Option<Arc<dyn DomainManager>> {
        self.read()
            .iter()
            .find(|(name, _)| name == domain)
            .map(|(_, manager)| Arc::clone(manager))
    }

    /// Snapshot of every registration; the lock is not held by the caller.
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn DomainManager>)> {
        self.read()
            .iter()
            .map(|(name, manager)| (name.clone(), Arc::clone(manager)))
            .collect()
    }

    pub fn domains(&self) -> Vec<String> {
        self.read().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<(String, Arc<dyn DomainManager>)>> {
        self.managers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, Arc<dyn DomainManager>)>> {
        self.managers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::StaticManager;

    #[test]
    fn test_register_preserves_order() {
        let registry = DomainRegistry::new();
        registry.register("billing", StaticManager::arc(vec![]));
        registry.register("search", StaticManager::arc(vec![]));

        assert_eq!(registry.domains(), vec!["billing", "search"]);
        assert!(registry.get("search").is_some());
        assert!(registry.get("hr").is_none());
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let registry = DomainRegistry::new();
        registry.register("billing", StaticManager::arc(vec![]));
        registry.register("search", StaticManager::arc(vec![]));

        let replaced = registry.register("billing", StaticManager::arc(vec![]));

        assert!(replaced);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.domains(), vec!["billing", "search"]);
    }

    #[test]
    fn test_every_registration_bumps_generation() {
        let registry = DomainRegistry::new();
        assert_eq!(registry.generation(), 0);

        registry.register("billing", StaticManager::arc(vec![]));
        registry.register("billing", StaticManager::arc(vec![]));

        assert_eq!(registry.generation(), 2);
    }
}
