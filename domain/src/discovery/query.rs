//! Discovery query shapes

use serde::{Deserialize, Serialize};

/// Optional restrictions applied to a free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Only scan this domain
    pub domain: Option<String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// A cacheable discovery query.
///
/// Each shape serializes to a canonical key; two queries with the same key
/// share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiscoveryQuery {
    /// Every public tool of every domain
    All,
    /// Tools tagged with a capability
    Capability(String),
    /// Tools owned by one domain
    Domain(String),
    /// Case-insensitive free-text search
    Search {
        query: String,
        filters: SearchFilters,
    },
}

impl DiscoveryQuery {
    pub fn capability(capability: impl Into<String>) -> Self {
        DiscoveryQuery::Capability(capability.into())
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        DiscoveryQuery::Domain(domain.into())
    }

    pub fn search(query: impl Into<String>, filters: SearchFilters) -> Self {
        DiscoveryQuery::Search {
            query: query.into(),
            filters,
        }
    }

    /// Canonical cache key for this query shape
    pub fn cache_key(&self) -> String {
        match self {
            DiscoveryQuery::All => "all".to_string(),
            DiscoveryQuery::Capability(capability) => {
                format!("capability:{}", capability.to_lowercase())
            }
            DiscoveryQuery::Domain(domain) => format!("domain:{}", domain),
            DiscoveryQuery::Search { query, filters } => format!(
                "search:{}|domain={}",
                query.to_lowercase(),
                filters.domain.as_deref().unwrap_or("*")
            ),
        }
    }
}

impl std::fmt::Display for DiscoveryQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys() {
        assert_eq!(DiscoveryQuery::capability("finance").cache_key(), "capability:finance");
        assert_eq!(DiscoveryQuery::domain("billing").cache_key(), "domain:billing");
        assert_eq!(
            DiscoveryQuery::search("Receipt", SearchFilters::new()).cache_key(),
            "search:receipt|domain=*"
        );
        assert_eq!(
            DiscoveryQuery::search("receipt", SearchFilters::new().with_domain("billing"))
                .cache_key(),
            "search:receipt|domain=billing"
        );
    }

    #[test]
    fn test_capability_keys_ignore_case() {
        assert_eq!(
            DiscoveryQuery::capability("Finance").cache_key(),
            DiscoveryQuery::capability("finance").cache_key()
        );
    }
}
