//! Tool Factory façade: the public entry point.
//!
//! The façade owns the domain registry, the executor cache and the call
//! counters, and wires the discovery, execution and analytics engines
//! together. It is explicitly constructed by the composition root; there is
//! no global instance.
//!
//! # Resolution order
//!
//! ```text
//! get_tool(name)
//!   ├─ executor cache (TTL) ─── hit ──▶ invoke
//!   ├─ pattern exposure (if configured) ─── found ──▶ bind, cache, invoke
//!   └─ domain scan (registration order)
//!        ├─ Found ──▶ bind, cache, invoke
//!        ├─ NotPublic / NotFound / Unavailable ──▶ next domain
//!        └─ exhausted ──▶ ToolNotPublic | ToolNotFound
//! ```
//!
//! Every `get_tool` call counts once in `total_calls` and once in either
//! `successful_calls` or `failed_calls`.

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tool_factory_domain::{
    DomainHealth, DomainManager, PatternExposure, ProviderConnector, SearchFilters,
    ToolContext, ToolDescriptor, ToolFactoryError, ToolFilter, ToolResult,
};
use tracing::{debug, info, warn};

use super::analytics::{AnalyticsEngine, AnalyticsRecorder};
use super::discovery::DiscoveryEngine;
use super::execution::{ChainResult, ExecutionEngine};
use super::pool::{ConnectionPool, PoolStats};
use super::registry::DomainRegistry;
use crate::cache::TtlCache;
use crate::config::FactoryConfig;

pub const FACTORY_VERSION: &str = env!("CARGO_PKG_VERSION");

const EXECUTED_VIA: &str = "execute_tool";

// ==================== Reports ====================

/// Call counters of the façade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub pattern_exposure_calls: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactoryStatistics {
    pub version: String,
    pub pattern_exposure_available: bool,
    /// In registration order
    pub registered_domains: Vec<String>,
    pub cached_tools: usize,
    pub cache_ttl_seconds: u64,
    pub discovery_cache_entries: usize,
    pub execution_stats: ExecutionStats,
    pub connection_pool: PoolStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStatus {
    pub domain: String,
    /// `healthy` or `unhealthy: <reason>`
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub domain_status: Vec<DomainStatus>,
    pub cached_tools: usize,
    pub execution_stats: ExecutionStats,
}

/// Public tools grouped by domain, capability and provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolCatalog {
    pub total_tools: usize,
    pub by_domain: BTreeMap<String, Vec<String>>,
    pub by_capability: BTreeMap<String, Vec<String>>,
    pub by_provider: BTreeMap<String, Vec<String>>,
}

impl ToolCatalog {
    pub fn from_tools(tools: &[ToolDescriptor]) -> Self {
        let mut catalog = ToolCatalog {
            total_tools: tools.len(),
            ..Default::default()
        };
        for tool in tools {
            catalog
                .by_domain
                .entry(tool.domain.clone())
                .or_default()
                .push(tool.name.clone());
            catalog
                .by_provider
                .entry(tool.provider_id.clone())
                .or_default()
                .push(tool.name.clone());
            for capability in &tool.capabilities {
                catalog
                    .by_capability
                    .entry(capability.clone())
                    .or_default()
                    .push(tool.name.clone());
            }
        }
        catalog
    }
}

// ==================== Bound executor ====================

/// A resolved tool bound to the execution engine
#[derive(Clone)]
pub struct BoundTool {
    descriptor: ToolDescriptor,
    engine: ExecutionEngine,
}

impl BoundTool {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub async fn execute(&self, context: &ToolContext) -> Result<ToolResult, ToolFactoryError> {
        self.engine.execute_tool(&self.descriptor, context).await
    }
}

#[derive(Default)]
struct Counters {
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    pattern_exposure_calls: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ExecutionStats {
        ExecutionStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            pattern_exposure_calls: self.pattern_exposure_calls.load(Ordering::Relaxed),
        }
    }
}

// ==================== Façade ====================

pub struct ToolFactory {
    config: FactoryConfig,
    registry: Arc<DomainRegistry>,
    discovery: DiscoveryEngine,
    execution: ExecutionEngine,
    analytics: Arc<AnalyticsEngine>,
    recorder: AnalyticsRecorder,
    pattern_exposure: Option<Arc<dyn PatternExposure>>,
    executors: TtlCache<String, BoundTool>,
    counters: Counters,
}

impl ToolFactory {
    /// Wire the engines together. Must be called inside a Tokio runtime.
    pub fn new(config: FactoryConfig, connector: Arc<dyn ProviderConnector>) -> Self {
        let registry = Arc::new(DomainRegistry::new());
        let discovery = DiscoveryEngine::new(
            Arc::clone(&registry),
            config.discovery_cache_ttl,
            config.invocation_timeout,
        );
        let analytics = Arc::new(AnalyticsEngine::new(
            config.max_records_per_tool,
            config.recent_error_limit,
        ));
        let recorder = AnalyticsRecorder::spawn(Arc::clone(&analytics), config.analytics_buffer);
        let pool = Arc::new(ConnectionPool::new(
            connector,
            config.invocation_timeout,
            config.health_check_interval,
        ));
        let execution =
            ExecutionEngine::new(pool, config.invocation_timeout).with_recorder(recorder.clone());

        Self {
            executors: TtlCache::new(config.executor_cache_ttl),
            config,
            registry,
            discovery,
            execution,
            analytics,
            recorder,
            pattern_exposure: None,
            counters: Counters::default(),
        }
    }

    pub fn with_pattern_exposure(mut self, exposure: Arc<dyn PatternExposure>) -> Self {
        self.pattern_exposure = Some(exposure);
        self
    }

    // ==================== Registration ====================

    /// Register or replace the manager of `domain`; both caches are cleared.
    pub fn register_domain_manager(&self, domain: &str, manager: Arc<dyn DomainManager>) {
        self.registry.register(domain, manager);
        self.discovery.clear_cache();
        self.executors.clear();
    }

    // ==================== Execution ====================

    /// Resolve, bind and invoke a tool.
    pub async fn get_tool(
        &self,
        tool_name: &str,
        context: &ToolContext,
        requester: Option<&str>,
    ) -> Result<ToolResult, ToolFactoryError> {
        Counters::bump(&self.counters.total_calls);

        let outcome = match self.bind(tool_name, requester).await {
            Ok(bound) => bound.execute(context).await,
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(_) => Counters::bump(&self.counters.successful_calls),
            Err(e) => {
                Counters::bump(&self.counters.failed_calls);
                warn!(tool = %tool_name, error = %e, "Tool call failed");
            }
        }
        outcome
    }

    /// [`get_tool`](Self::get_tool) plus requester and entry point in the metadata
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        context: &ToolContext,
        requester: Option<&str>,
    ) -> Result<ToolResult, ToolFactoryError> {
        let mut result = self.get_tool(tool_name, context, requester).await?;
        if let Some(metadata) = result.metadata.as_mut() {
            metadata.requester = requester.map(str::to_string);
            metadata.executed_via = Some(EXECUTED_VIA.to_string());
        }
        Ok(result)
    }

    /// Run named tools in order, merging each result into the next context.
    ///
    /// A name that cannot be resolved aborts the chain at that step.
    pub async fn execute_tool_chain<S: AsRef<str>>(
        &self,
        tool_names: &[S],
        initial_context: ToolContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<ChainResult, ToolFactoryError> {
        let mut context = initial_context;
        let mut steps = Vec::with_capacity(tool_names.len());

        for (step, name) in tool_names.iter().enumerate() {
            let name = name.as_ref();
            if let Some(token) = cancel
                && token.is_cancelled()
            {
                let cancelled = ToolFactoryError::Cancelled {
                    tool: name.to_string(),
                };
                return Err(ToolFactoryError::chain_aborted(step, name, steps, cancelled));
            }

            match self.get_tool(name, &context, None).await {
                Ok(result) => {
                    context = result.merge_into(&context);
                    steps.push(result);
                }
                Err(e) => return Err(ToolFactoryError::chain_aborted(step, name, steps, e)),
            }
        }

        Ok(ChainResult {
            steps,
            final_context: context,
        })
    }

    /// Invoke named tools concurrently; one result per name, in input order.
    ///
    /// Unresolvable names become failure items.
    pub async fn execute_tools_parallel<S: AsRef<str>>(
        &self,
        tool_names: &[S],
        shared_context: &ToolContext,
        cancel: Option<&CancellationToken>,
    ) -> Vec<ToolResult> {
        let mut resolved = Vec::new();
        let mut results: Vec<Option<ToolResult>> = Vec::with_capacity(tool_names.len());

        for name in tool_names {
            let name = name.as_ref();
            match self.bind(name, None).await {
                Ok(bound) => {
                    resolved.push(bound.descriptor);
                    results.push(None);
                }
                Err(e) => results.push(Some(e.into_result(name))),
            }
        }

        let mut executed = self
            .execution
            .execute_tools_parallel(&resolved, shared_context, cancel)
            .await
            .into_iter();

        let results: Vec<ToolResult> = results
            .into_iter()
            .zip(tool_names)
            .map(|(slot, name)| {
                slot.or_else(|| executed.next())
                    .unwrap_or_else(|| ToolResult::failure(name.as_ref(), "missing result"))
            })
            .collect();

        for result in &results {
            Counters::bump(&self.counters.total_calls);
            if result.success {
                Counters::bump(&self.counters.successful_calls);
            } else {
                Counters::bump(&self.counters.failed_calls);
            }
        }
        results
    }

    // ==================== Discovery ====================

    /// Public tools matching every given criterion
    pub async fn discover_tools(
        &self,
        criteria: &ToolFilter,
        requester: Option<&str>,
    ) -> Vec<ToolDescriptor> {
        if let Some(tools) = self.exposed(requester, |t| criteria.matches(t)).await {
            return tools;
        }

        let candidates = if let Some(domain) = &criteria.domain {
            self.discovery.discover_by_domain(domain).await
        } else if let Some(capability) = &criteria.capability {
            self.discovery.discover_by_capability(capability).await
        } else if let Some(query) = &criteria.query {
            self.discovery
                .search_tools(query, SearchFilters::new())
                .await
        } else {
            self.discovery.discover_all().await
        };

        candidates
            .into_iter()
            .filter(|t| criteria.matches(t))
            .collect()
    }

    /// Descriptor of a public tool; `None` when it is private or unknown
    pub async fn get_tool_info(
        &self,
        tool_name: &str,
        requester: Option<&str>,
    ) -> Option<ToolDescriptor> {
        match self.resolve(tool_name, requester).await {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                debug!(tool = %tool_name, error = %e, "No tool info");
                None
            }
        }
    }

    pub async fn get_domain_tools(
        &self,
        domain: &str,
        requester: Option<&str>,
    ) -> Vec<ToolDescriptor> {
        if let Some(tools) = self.exposed(requester, |t| t.domain == domain).await {
            return tools;
        }
        if self.registry.get(domain).is_none() {
            warn!(domain = %domain, "Domain not registered");
        }
        self.discovery.discover_by_domain(domain).await
    }

    pub async fn discover_related_tools(&self, tool_name: &str) -> Vec<ToolDescriptor> {
        self.discovery.discover_related_tools(tool_name).await
    }

    /// Every public tool grouped by domain, capability and provider
    pub async fn catalog(&self, requester: Option<&str>) -> ToolCatalog {
        let tools = self.discover_tools(&ToolFilter::new(), requester).await;
        ToolCatalog::from_tools(&tools)
    }

    // ==================== Introspection ====================

    pub fn statistics(&self) -> FactoryStatistics {
        FactoryStatistics {
            version: FACTORY_VERSION.to_string(),
            pattern_exposure_available: self.pattern_exposure.is_some(),
            registered_domains: self.registry.domains(),
            cached_tools: self.executors.len(),
            cache_ttl_seconds: self.executors.ttl().as_secs(),
            discovery_cache_entries: self.discovery.cache_len(),
            execution_stats: self.counters.snapshot(),
            connection_pool: self.execution.pool().stats(),
        }
    }

    /// Drop every cached executor and discovery result
    pub fn clear_cache(&self) {
        self.executors.clear();
        self.discovery.clear_cache();
        info!("Tool cache cleared");
    }

    /// Probe every domain manager concurrently, each bounded by the call timeout
    pub async fn health_check(&self) -> HealthReport {
        let timeout = self.config.invocation_timeout;
        let managers = self.registry.snapshot();
        let probes = managers.into_iter().map(|(domain, manager)| async move {
            let health = tokio::time::timeout(timeout, manager.health_check())
                .await
                .unwrap_or_else(|_| {
                    DomainHealth::Unhealthy(format!(
                        "health check timed out after {:.1}s",
                        timeout.as_secs_f64()
                    ))
                });
            (domain, health)
        });

        let results = join_all(probes).await;
        let degraded = results.iter().any(|(_, health)| !health.is_healthy());
        for (domain, health) in &results {
            if !health.is_healthy() {
                warn!(domain = %domain, status = %health, "Domain unhealthy");
            }
        }

        HealthReport {
            status: if degraded {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            version: FACTORY_VERSION.to_string(),
            domain_status: results
                .into_iter()
                .map(|(domain, health)| DomainStatus {
                    domain,
                    status: health.to_string(),
                })
                .collect(),
            cached_tools: self.executors.len(),
            execution_stats: self.counters.snapshot(),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn discovery(&self) -> &DiscoveryEngine {
        &self.discovery
    }

    pub fn analytics(&self) -> &Arc<AnalyticsEngine> {
        &self.analytics
    }

    /// Wait until every invocation so far is visible to the analytics engine
    pub async fn flush_analytics(&self) {
        self.recorder.flush().await;
    }

    // ==================== Resolution ====================

    /// Cached executor, or resolve and cache a new one
    async fn bind(
        &self,
        tool_name: &str,
        requester: Option<&str>,
    ) -> Result<BoundTool, ToolFactoryError> {
        if let Some(bound) = self.executors.get(tool_name) {
            Counters::bump(&self.counters.cache_hits);
            debug!(tool = %tool_name, "Executor cache hit");
            return Ok(bound);
        }
        Counters::bump(&self.counters.cache_misses);
        debug!(tool = %tool_name, "Executor cache miss");

        let generation = self.registry.generation();
        let descriptor = self.resolve(tool_name, requester).await?;
        let bound = BoundTool {
            descriptor,
            engine: self.execution.clone(),
        };
        // A binding resolved across a registration may name a replaced manager
        if self.registry.generation() == generation {
            self.executors.insert(tool_name.to_string(), bound.clone());
        }
        Ok(bound)
    }

    /// Pattern exposure first, then the domain scan
    async fn resolve(
        &self,
        tool_name: &str,
        requester: Option<&str>,
    ) -> Result<ToolDescriptor, ToolFactoryError> {
        if let Some(mut found) = self.exposed(requester, |t| t.name == tool_name).await {
            debug!(tool = %tool_name, "Resolved through pattern exposure");
            return Ok(found.remove(0));
        }
        self.discovery.locate(tool_name).await
    }

    /// Public tools reported by pattern exposure that satisfy `keep`.
    ///
    /// `None` when exposure is not configured, fails, or reports nothing
    /// matching; the caller then scans the domains.
    async fn exposed<F>(&self, requester: Option<&str>, keep: F) -> Option<Vec<ToolDescriptor>>
    where
        F: Fn(&ToolDescriptor) -> bool,
    {
        let exposure = self.pattern_exposure.as_ref()?;
        Counters::bump(&self.counters.pattern_exposure_calls);

        let call_timeout = self.config.invocation_timeout;
        let call = exposure.public_tools(requester);
        match tokio::time::timeout(call_timeout, call).await {
            Ok(Ok(tools)) => {
                let kept: Vec<ToolDescriptor> = tools
                    .into_iter()
                    .filter(|t| t.is_public() && keep(t))
                    .collect();
                (!kept.is_empty()).then_some(kept)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Pattern exposure failed, falling back to domain scan");
                None
            }
            Err(_) => {
                warn!(
                    timeout_secs = call_timeout.as_secs_f64(),
                    "Pattern exposure timed out, falling back to domain scan"
                );
                None
            }
        }
    }
}
