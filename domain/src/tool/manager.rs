//! Domain manager abstraction
//!
//! A domain manager owns a set of tools and decides which of them are public.
//! The factory never holds a concrete manager type: every domain is reached
//! through the [`DomainManager`] trait.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ToolFactory                  │
//! │   domain name ──▶ Arc<dyn DomainManager>     │
//! └──────────────────────────────────────────────┘
//!        │               │               │
//!        ▼               ▼               ▼
//!   ┌─────────┐    ┌─────────┐    ┌─────────┐
//!   │ billing │    │ search  │    │  ...    │
//!   └─────────┘    └─────────┘    └─────────┘
//! ```
//!
//! Lookups answer with a tagged [`ToolLookup`] so the factory can tell "keep
//! scanning" outcomes apart without catching errors across domain boundaries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{ToolDescriptor, ToolFilter};

/// Error type for domain manager operations
#[derive(Debug, Clone, Error)]
pub enum ManagerError {
    /// The manager itself cannot be reached
    #[error("Domain manager unavailable: {0}")]
    Unavailable(String),

    /// The manager answered with an error
    #[error("Domain manager failed: {0}")]
    Failed(String),
}

/// Outcome of looking up one tool in one domain
#[derive(Debug, Clone, PartialEq)]
pub enum ToolLookup {
    /// The tool exists and is public
    Found(ToolDescriptor),
    /// The tool exists but is private
    NotPublic,
    /// The domain does not know the tool
    NotFound,
    /// The domain manager could not be reached
    Unavailable(String),
}

impl ToolLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, ToolLookup::Found(_))
    }
}

/// Health reported by a domain manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DomainHealth {
    Healthy,
    Unhealthy(String),
}

impl DomainHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, DomainHealth::Healthy)
    }
}

impl std::fmt::Display for DomainHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainHealth::Healthy => write!(f, "healthy"),
            DomainHealth::Unhealthy(reason) => write!(f, "unhealthy: {}", reason),
        }
    }
}

/// Contract every domain-manager adapter implements.
#[async_trait]
pub trait DomainManager: Send + Sync {
    /// Public tools matching the filter, in the manager's own order.
    ///
    /// Must never return a private descriptor.
    async fn public_tools(&self, filter: &ToolFilter) -> Result<Vec<ToolDescriptor>, ManagerError>;

    /// Look up a single tool by name
    async fn public_tool(&self, name: &str) -> ToolLookup;

    /// Probe the manager
    async fn health_check(&self) -> DomainHealth;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A mock manager for testing the contract shape
    struct MockManager {
        tools: Vec<ToolDescriptor>,
        available: bool,
    }

    #[async_trait]
    impl DomainManager for MockManager {
        async fn public_tools(
            &self,
            filter: &ToolFilter,
        ) -> Result<Vec<ToolDescriptor>, ManagerError> {
            if !self.available {
                return Err(ManagerError::Unavailable("mock offline".into()));
            }
            Ok(self
                .tools
                .iter()
                .filter(|t| t.is_public() && filter.matches(t))
                .cloned()
                .collect())
        }

        async fn public_tool(&self, name: &str) -> ToolLookup {
            if !self.available {
                return ToolLookup::Unavailable("mock offline".into());
            }
            match self.tools.iter().find(|t| t.name == name) {
                Some(t) if t.is_public() => ToolLookup::Found(t.clone()),
                Some(_) => ToolLookup::NotPublic,
                None => ToolLookup::NotFound,
            }
        }

        async fn health_check(&self) -> DomainHealth {
            if self.available {
                DomainHealth::Healthy
            } else {
                DomainHealth::Unhealthy("mock offline".into())
            }
        }
    }

    fn manager(available: bool) -> MockManager {
        MockManager {
            tools: vec![
                ToolDescriptor::new("calc_invoice", "billing", "billing-svc")
                    .with_capability("finance"),
                ToolDescriptor::new("ledger", "billing", "billing-svc").private(),
            ],
            available,
        }
    }

    #[tokio::test]
    async fn test_lookup_outcomes() {
        let manager = manager(true);

        assert!(manager.public_tool("calc_invoice").await.is_found());
        assert_eq!(manager.public_tool("ledger").await, ToolLookup::NotPublic);
        assert_eq!(manager.public_tool("missing").await, ToolLookup::NotFound);
    }

    #[tokio::test]
    async fn test_public_tools_hides_private() {
        let manager = manager(true);
        let tools = manager.public_tools(&ToolFilter::new()).await.unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "calc_invoice");
    }

    #[tokio::test]
    async fn test_unavailable_manager() {
        let manager = manager(false);

        assert!(manager.public_tools(&ToolFilter::new()).await.is_err());
        assert!(matches!(
            manager.public_tool("calc_invoice").await,
            ToolLookup::Unavailable(_)
        ));
        assert_eq!(
            manager.health_check().await.to_string(),
            "unhealthy: mock offline"
        );
    }
}
