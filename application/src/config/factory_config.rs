//! Factory runtime parameters.
//!
//! [`FactoryConfig`] groups the knobs shared by the façade and its engines.
//! The infrastructure layer builds one from the merged configuration files;
//! tests build one directly with the `with_*` methods.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime parameters of the tool factory.
///
/// | Field | Default | Used by |
/// |-------|---------|---------|
/// | `discovery_cache_ttl` | 600s | DiscoveryEngine |
/// | `executor_cache_ttl` | 300s | ToolFactory |
/// | `invocation_timeout` | 30s | ExecutionEngine, health checks |
/// | `health_check_interval` | 60s | ConnectionPool |
/// | `analytics_buffer` | 1024 | AnalyticsRecorder |
/// | `recent_error_limit` | 5 | AnalyticsEngine |
/// | `max_records_per_tool` | 10000 | AnalyticsEngine |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// How long a discovery result stays valid
    pub discovery_cache_ttl: Duration,
    /// How long a bound executor stays valid
    pub executor_cache_ttl: Duration,
    /// Upper bound for every provider call (connect, probe, invoke)
    pub invocation_timeout: Duration,
    /// Minimum time between two health probes of a pooled connection
    pub health_check_interval: Duration,
    /// Capacity of the analytics event queue
    pub analytics_buffer: usize,
    /// Number of errors returned by error analysis
    pub recent_error_limit: usize,
    /// Retention per tool; oldest records are dropped first
    pub max_records_per_tool: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            discovery_cache_ttl: Duration::from_secs(600),
            executor_cache_ttl: Duration::from_secs(300),
            invocation_timeout: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(60),
            analytics_buffer: 1024,
            recent_error_limit: 5,
            max_records_per_tool: 10_000,
        }
    }
}

impl FactoryConfig {
    // ==================== Builder Methods ====================

    pub fn with_discovery_cache_ttl(mut self, ttl: Duration) -> Self {
        self.discovery_cache_ttl = ttl;
        self
    }

    pub fn with_executor_cache_ttl(mut self, ttl: Duration) -> Self {
        self.executor_cache_ttl = ttl;
        self
    }

    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = timeout;
        self
    }

    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub fn with_analytics_buffer(mut self, capacity: usize) -> Self {
        self.analytics_buffer = capacity;
        self
    }

    pub fn with_recent_error_limit(mut self, limit: usize) -> Self {
        self.recent_error_limit = limit;
        self
    }

    pub fn with_max_records_per_tool(mut self, max: usize) -> Self {
        self.max_records_per_tool = max;
        self
    }
}
