//! Discovery engine: "which tools match X?"
//!
//! Every query shape is answered from a TTL cache keyed by
//! [`DiscoveryQuery::cache_key`]; on a miss the registered domain managers
//! are scanned in registration order and the result is stored.
//!
//! | Operation | Cache key | Scan |
//! |-----------|-----------|------|
//! | [`discover_by_capability`](DiscoveryEngine::discover_by_capability) | `capability:<c>` | every domain |
//! | [`discover_by_domain`](DiscoveryEngine::discover_by_domain) | `domain:<d>` | one domain |
//! | [`search_tools`](DiscoveryEngine::search_tools) | `search:<q>\|domain=<d>` | every (or one) domain |
//! | [`discover_all`](DiscoveryEngine::discover_all) | `all` | every domain |
//! | [`discover_related_tools`](DiscoveryEngine::discover_related_tools) | not cached | sub-queries |
//!
//! A manager that fails or does not answer within the call timeout is logged
//! and skipped; discovery never fails as a whole. A scan that overlaps a
//! registration is returned to its caller but not cached.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tool_factory_domain::{
    DiscoveryQuery, DomainManager, SearchFilters, ToolDescriptor, ToolFactoryError, ToolFilter,
    ToolLookup,
};
use tracing::{debug, warn};

use super::registry::DomainRegistry;
use crate::cache::TtlCache;

pub struct DiscoveryEngine {
    registry: Arc<DomainRegistry>,
    cache: TtlCache<String, Vec<ToolDescriptor>>,
    call_timeout: Duration,
}

impl DiscoveryEngine {
    pub fn new(
        registry: Arc<DomainRegistry>,
        cache_ttl: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            cache: TtlCache::new(cache_ttl),
            call_timeout,
        }
    }

    pub async fn discover_by_capability(&self, capability: &str) -> Vec<ToolDescriptor> {
        self.discover(&DiscoveryQuery::capability(capability)).await
    }

    /// Tools of one domain; an unregistered domain yields nothing
    pub async fn discover_by_domain(&self, domain: &str) -> Vec<ToolDescriptor> {
        self.discover(&DiscoveryQuery::domain(domain)).await
    }

    pub async fn search_tools(&self, query: &str, filters: SearchFilters) -> Vec<ToolDescriptor> {
        self.discover(&DiscoveryQuery::search(query, filters)).await
    }

    pub async fn discover_all(&self) -> Vec<ToolDescriptor> {
        self.discover(&DiscoveryQuery::All).await
    }

    /// Tools sharing a capability or the domain of `tool_name`.
    ///
    /// The tool itself is excluded and names are de-duplicated, first
    /// occurrence wins. An unknown tool has no relations.
    pub async fn discover_related_tools(&self, tool_name: &str) -> Vec<ToolDescriptor> {
        let target = match self.locate(tool_name).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                debug!(tool = %tool_name, error = %e, "No related tools for unknown tool");
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for capability in &target.capabilities {
            candidates.extend(self.discover_by_capability(capability).await);
        }
        candidates.extend(self.discover_by_domain(&target.domain).await);

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|t| t.name != target.name)
            .filter(|t| seen.insert(t.name.clone()))
            .collect()
    }

    /// Serve a query from the cache, scanning on a miss
    pub async fn discover(&self, query: &DiscoveryQuery) -> Vec<ToolDescriptor> {
        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!(query = %key, hits = cached.len(), "Discovery cache hit");
            return cached;
        }

        let generation = self.registry.generation();
        let tools = match query {
            DiscoveryQuery::All => {
                self.scan(self.registry.snapshot(), &ToolFilter::new())
                    .await
            }
            DiscoveryQuery::Capability(capability) => {
                let filter = ToolFilter::capability(capability);
                self.scan(self.registry.snapshot(), &filter).await
            }
            DiscoveryQuery::Domain(domain) => match self.registry.get(domain) {
                Some(manager) => {
                    self.scan(vec![(domain.clone(), manager)], &ToolFilter::new())
                        .await
                }
                None => Vec::new(),
            },
            DiscoveryQuery::Search { query, filters } => {
                let managers = match &filters.domain {
                    Some(domain) => self
                        .registry
                        .get(domain)
                        .map(|m| vec![(domain.clone(), m)])
                        .unwrap_or_default(),
                    None => self.registry.snapshot(),
                };
                self.scan(managers, &ToolFilter::new())
                    .await
                    .into_iter()
                    .filter(|t| t.matches_text(query))
                    .collect()
            }
        };

        debug!(query = %key, found = tools.len(), "Discovery scan complete");
        if self.registry.generation() == generation {
            self.cache.insert(key, tools.clone());
        } else {
            debug!(query = %key, "Registry changed during scan, result not cached");
        }
        tools
    }

    /// Resolve a tool name to its public descriptor by asking every domain.
    ///
    /// `ToolNotPublic` when some domain owns the tool privately and no other
    /// domain exposes it; `ToolNotFound` when nobody knows it.
    pub async fn locate(&self, tool_name: &str) -> Result<ToolDescriptor, ToolFactoryError> {
        let mut private_owner: Option<String> = None;

        for (domain, manager) in self.registry.snapshot() {
            let lookup = timeout(self.call_timeout, manager.public_tool(tool_name))
                .await
                .unwrap_or_else(|_| ToolLookup::Unavailable(self.timed_out()));
            match lookup {
                ToolLookup::Found(descriptor) if descriptor.is_public() => return Ok(descriptor),
                ToolLookup::Found(_) | ToolLookup::NotPublic => {
                    debug!(tool = %tool_name, domain = %domain, "Tool is not public");
                    private_owner.get_or_insert(domain);
                }
                ToolLookup::NotFound => {}
                ToolLookup::Unavailable(reason) => {
                    warn!(
                        tool = %tool_name,
                        domain = %domain,
                        reason = %reason,
                        "Domain manager unavailable, continuing in degraded mode"
                    );
                }
            }
        }

        match private_owner {
            Some(domain) => Err(ToolFactoryError::not_public(tool_name, domain)),
            None => Err(ToolFactoryError::not_found(tool_name)),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    async fn scan(
        &self,
        managers: Vec<(String, Arc<dyn DomainManager>)>,
        filter: &ToolFilter,
    ) -> Vec<ToolDescriptor> {
        let mut tools = Vec::new();
        for (domain, manager) in managers {
            let call = manager.public_tools(filter);
            match timeout(self.call_timeout, call).await {
                Ok(Ok(found)) => {
                    let visible = found
                        .into_iter()
                        .filter(|t| t.is_public() && filter.matches(t));
                    tools.extend(visible);
                }
                Ok(Err(e)) => {
                    warn!(domain = %domain, error = %e, "Skipping domain during discovery");
                }
                Err(_) => {
                    warn!(
                        domain = %domain,
                        reason = %self.timed_out(),
                        "Skipping domain during discovery"
                    );
                }
            }
        }
        tools
    }

    fn timed_out(&self) -> String {
        format!(
            "domain manager did not answer within {:.1}s",
            self.call_timeout.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{
        GatedManager, HangingManager, StaticManager, billing_tools, search_tools,
    };

    struct Fixture {
        engine: Arc<DiscoveryEngine>,
        registry: Arc<DomainRegistry>,
        billing: Arc<StaticManager>,
        search: Arc<StaticManager>,
    }

    fn fixture(ttl: Duration) -> Fixture {
        let registry = Arc::new(DomainRegistry::new());
        let billing = StaticManager::arc(billing_tools());
        let search = StaticManager::arc(search_tools());
        registry.register("billing", billing.clone());
        registry.register("search", search.clone());
        Fixture {
            engine: Arc::new(DiscoveryEngine::new(
                Arc::clone(&registry),
                ttl,
                Duration::from_secs(30),
            )),
            registry,
            billing,
            search,
        }
    }

    fn names(tools: &[ToolDescriptor]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_scenario_queries() {
        let f = fixture(Duration::from_secs(600));

        let by_capability = f.engine.discover_by_capability("finance").await;
        assert_eq!(names(&by_capability), vec!["calc_invoice"]);

        let by_domain = f.engine.discover_by_domain("billing").await;
        assert_eq!(names(&by_domain), vec!["calc_invoice", "send_receipt"]);

        let by_text = f.engine.search_tools("receipt", SearchFilters::new()).await;
        assert_eq!(names(&by_text), vec!["send_receipt"]);
    }

    #[tokio::test]
    async fn test_private_tools_never_discovered() {
        let f = fixture(Duration::from_secs(600));

        assert!(!names(&f.engine.discover_all().await).contains(&"ledger"));
        assert!(
            f.engine
                .search_tools("ledger", SearchFilters::new())
                .await
                .is_empty()
        );
    }

    // The cache runs on the wall clock, so expiry tests use a short TTL
    // and really sleep.

    #[tokio::test]
    async fn test_capability_cache_hit_and_expiry() {
        let f = fixture(Duration::from_millis(50));

        let first = f.engine.discover_by_capability("finance").await;
        let second = f.engine.discover_by_capability("finance").await;
        assert_eq!(first, second);
        assert_eq!(f.billing.scan_count(), 1);
        assert_eq!(f.search.scan_count(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        f.engine.discover_by_capability("finance").await;
        assert_eq!(f.billing.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_domain_cache_hit_and_expiry() {
        let f = fixture(Duration::from_millis(50));

        f.engine.discover_by_domain("billing").await;
        f.engine.discover_by_domain("billing").await;
        assert_eq!(f.billing.scan_count(), 1);
        assert_eq!(f.search.scan_count(), 0);

        tokio::time::sleep(Duration::from_millis(120)).await;
        f.engine.discover_by_domain("billing").await;
        assert_eq!(f.billing.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_domain_is_empty() {
        let f = fixture(Duration::from_secs(600));
        assert!(f.engine.discover_by_domain("hr").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_honors_domain_filter() {
        let f = fixture(Duration::from_secs(600));

        let in_search = f
            .engine
            .search_tools("doc", SearchFilters::new().with_domain("search"))
            .await;
        assert_eq!(names(&in_search), vec!["index_doc"]);

        let in_billing = f
            .engine
            .search_tools("doc", SearchFilters::new().with_domain("billing"))
            .await;
        assert!(in_billing.is_empty());
        assert_eq!(f.billing.scan_count(), 1);
        assert_eq!(f.search.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_manager_is_skipped() {
        let f = fixture(Duration::from_secs(600));
        f.billing.set_available(false);

        let all = f.engine.discover_all().await;
        assert_eq!(names(&all), vec!["index_doc"]);
    }

    #[tokio::test]
    async fn test_related_tools() {
        let f = fixture(Duration::from_secs(600));
        f.registry.register(
            "treasury",
            StaticManager::arc(vec![
                ToolDescriptor::new("forecast", "treasury", "treasury-svc")
                    .with_capability("finance"),
            ]),
        );

        let related = f.engine.discover_related_tools("calc_invoice").await;
        assert_eq!(names(&related), vec!["forecast", "send_receipt"]);

        assert!(
            f.engine
                .discover_related_tools("ghost_tool")
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_locate_distinguishes_private_and_missing() {
        let f = fixture(Duration::from_secs(600));

        assert_eq!(f.engine.locate("index_doc").await.unwrap().domain, "search");
        assert!(f.engine.locate("ledger").await.unwrap_err().is_not_public());
        assert!(
            f.engine
                .locate("ghost_tool")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_clear_cache_forces_rescan() {
        let f = fixture(Duration::from_secs(600));

        f.engine.discover_all().await;
        assert_eq!(f.engine.cache_len(), 1);
        f.engine.clear_cache();
        assert_eq!(f.engine.cache_len(), 0);

        f.engine.discover_all().await;
        assert_eq!(f.billing.scan_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_manager_is_skipped_after_call_timeout() {
        let registry = Arc::new(DomainRegistry::new());
        registry.register("stuck", Arc::new(HangingManager));
        let search = StaticManager::arc(search_tools());
        registry.register("search", search.clone());
        let engine = DiscoveryEngine::new(
            Arc::clone(&registry),
            Duration::from_secs(600),
            Duration::from_secs(2),
        );

        let all = engine.discover_all().await;
        assert_eq!(names(&all), vec!["index_doc"]);

        let found = engine.locate("index_doc").await.unwrap();
        assert_eq!(found.domain, "search");
        assert!(
            engine
                .locate("calc_invoice")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_scan_overlapping_registration_is_not_cached() {
        let f = fixture(Duration::from_secs(600));
        let gated = GatedManager::arc(vec![
            ToolDescriptor::new("forecast", "treasury", "treasury-svc").with_capability("finance"),
        ]);
        f.registry.register("treasury", gated.clone());

        let engine = Arc::clone(&f.engine);
        let scan = tokio::spawn(async move {
            engine.discover_by_capability("finance").await
        });
        gated.entered.notified().await;

        f.registry.register(
            "payroll",
            StaticManager::arc(vec![
                ToolDescriptor::new("run_payroll", "payroll", "payroll-svc")
                    .with_capability("finance"),
            ]),
        );
        gated.release.notify_one();

        let stale = scan.await.unwrap();
        assert_eq!(names(&stale), vec!["calc_invoice", "forecast"]);
        assert_eq!(f.engine.cache_len(), 0);

        gated.release.notify_one();
        let fresh = f.engine.discover_by_capability("finance").await;
        assert_eq!(names(&fresh), vec!["calc_invoice", "forecast", "run_payroll"]);
        assert_eq!(f.engine.cache_len(), 1);
    }
}
