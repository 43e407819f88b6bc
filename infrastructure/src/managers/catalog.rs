//! In-memory catalog domain manager.
//!
//! [`CatalogDomainManager`] owns a fixed list of descriptors, typically the
//! `[[domains.tools]]` entries of the configuration file. Tools can be
//! published and withdrawn at runtime; the factory sees the change after its
//! caches expire or are cleared.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tool_factory_domain::{
    DomainHealth, DomainManager, ManagerError, ToolDescriptor, ToolFilter, ToolLookup,
};
use tracing::debug;

use crate::config::FileDomainConfig;

pub struct CatalogDomainManager {
    domain: String,
    tools: RwLock<Vec<ToolDescriptor>>,
    available: AtomicBool,
}

impl CatalogDomainManager {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            tools: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn from_config(config: &FileDomainConfig) -> Self {
        let manager = Self::new(&config.name);
        for descriptor in config.descriptors() {
            manager.publish(descriptor);
        }
        manager
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Add a tool, replacing any tool of the same name.
    ///
    /// The descriptor is re-homed to this domain.
    pub fn publish(&self, mut descriptor: ToolDescriptor) {
        descriptor.domain = self.domain.clone();
        let mut tools = self.write();
        match tools.iter_mut().find(|t| t.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => tools.push(descriptor),
        }
    }

    pub fn withdraw(&self, tool_name: &str) -> bool {
        let mut tools = self.write();
        let before = tools.len();
        tools.retain(|t| t.name != tool_name);
        before != tools.len()
    }

    /// Take the catalog offline or back online
    pub fn set_available(&self, available: bool) {
        debug!(domain = %self.domain, available, "Catalog availability changed");
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn offline_reason(&self) -> String {
        format!("catalog '{}' is offline", self.domain)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ToolDescriptor>> {
        self.tools
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ToolDescriptor>> {
        self.tools
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DomainManager for CatalogDomainManager {
    async fn public_tools(&self, filter: &ToolFilter) -> Result<Vec<ToolDescriptor>, ManagerError> {
        if !self.is_available() {
            return Err(ManagerError::Unavailable(self.offline_reason()));
        }
        Ok(self
            .read()
            .iter()
            .filter(|t| t.is_public() && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn public_tool(&self, tool_name: &str) -> ToolLookup {
        if !self.is_available() {
            return ToolLookup::Unavailable(self.offline_reason());
        }
        match self.read().iter().find(|t| t.name == tool_name) {
            Some(tool) if tool.is_public() => ToolLookup::Found(tool.clone()),
            Some(_) => ToolLookup::NotPublic,
            None => ToolLookup::NotFound,
        }
    }

    async fn health_check(&self) -> DomainHealth {
        if self.is_available() {
            DomainHealth::Healthy
        } else {
            DomainHealth::Unhealthy(self.offline_reason())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn billing() -> CatalogDomainManager {
        let manager = CatalogDomainManager::new("billing");
        manager.publish(
            ToolDescriptor::new("calc_invoice", "billing", "billing-svc")
                .with_capability("finance"),
        );
        manager.publish(
            ToolDescriptor::new("send_receipt", "billing", "billing-svc").with_tag("email"),
        );
        manager.publish(ToolDescriptor::new("ledger", "billing", "billing-svc").private());
        manager
    }

    #[tokio::test]
    async fn test_public_tools_hide_private() {
        let manager = billing();
        let tools = manager.public_tools(&ToolFilter::new()).await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["calc_invoice", "send_receipt"]);

        let finance = manager
            .public_tools(&ToolFilter::capability("finance"))
            .await
            .unwrap();
        assert_eq!(finance.len(), 1);
    }

    #[tokio::test]
    async fn test_public_tool_lookup() {
        let manager = billing();
        assert!(manager.public_tool("calc_invoice").await.is_found());
        assert_eq!(manager.public_tool("ledger").await, ToolLookup::NotPublic);
        assert_eq!(manager.public_tool("ghost_tool").await, ToolLookup::NotFound);
    }

    #[tokio::test]
    async fn test_offline_catalog() {
        let manager = billing();
        manager.set_available(false);

        assert!(manager.public_tools(&ToolFilter::new()).await.is_err());
        assert!(matches!(
            manager.public_tool("calc_invoice").await,
            ToolLookup::Unavailable(_)
        ));
        assert!(!manager.health_check().await.is_healthy());

        manager.set_available(true);
        assert!(manager.health_check().await.is_healthy());
    }

    #[test]
    fn test_publish_replaces_and_withdraw_removes() {
        let manager = billing();
        manager.publish(
            ToolDescriptor::new("calc_invoice", "elsewhere", "billing-v2")
                .with_capability("finance"),
        );
        assert_eq!(manager.len(), 3);

        assert!(manager.withdraw("ledger"));
        assert!(!manager.withdraw("ledger"));
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_publish_rehomes_descriptor() {
        let manager = CatalogDomainManager::new("billing");
        manager.publish(ToolDescriptor::new("calc_invoice", "elsewhere", "billing-v2"));

        let ToolLookup::Found(tool) = manager.public_tool("calc_invoice").await else {
            panic!("calc_invoice should be public");
        };
        assert_eq!(tool.domain, "billing");
        assert_eq!(tool.provider_id, "billing-v2");
    }
}
