//! Factory runtime settings from TOML (`[factory]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tool_factory_application::FactoryConfig;

/// Raw factory configuration from TOML
///
/// # Example
///
/// ```toml
/// [factory]
/// discovery_cache_ttl_seconds = 600
/// executor_cache_ttl_seconds = 300
/// invocation_timeout_seconds = 30
/// health_check_interval_seconds = 60
/// analytics_buffer = 1024
/// recent_error_limit = 5
/// max_records_per_tool = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFactoryConfig {
    pub discovery_cache_ttl_seconds: u64,
    pub executor_cache_ttl_seconds: u64,
    /// Upper bound for connect, probe and invoke calls
    pub invocation_timeout_seconds: u64,
    pub health_check_interval_seconds: u64,
    /// Capacity of the analytics queue
    pub analytics_buffer: usize,
    pub recent_error_limit: usize,
    pub max_records_per_tool: usize,
}

impl Default for FileFactoryConfig {
    fn default() -> Self {
        let defaults = FactoryConfig::default();
        Self {
            discovery_cache_ttl_seconds: defaults.discovery_cache_ttl.as_secs(),
            executor_cache_ttl_seconds: defaults.executor_cache_ttl.as_secs(),
            invocation_timeout_seconds: defaults.invocation_timeout.as_secs(),
            health_check_interval_seconds: defaults.health_check_interval.as_secs(),
            analytics_buffer: defaults.analytics_buffer,
            recent_error_limit: defaults.recent_error_limit,
            max_records_per_tool: defaults.max_records_per_tool,
        }
    }
}

impl FileFactoryConfig {
    /// Convert to the application-layer runtime parameters
    pub fn to_factory_config(&self) -> FactoryConfig {
        FactoryConfig::default()
            .with_discovery_cache_ttl(Duration::from_secs(self.discovery_cache_ttl_seconds))
            .with_executor_cache_ttl(Duration::from_secs(self.executor_cache_ttl_seconds))
            .with_invocation_timeout(Duration::from_secs(self.invocation_timeout_seconds))
            .with_health_check_interval(Duration::from_secs(self.health_check_interval_seconds))
            .with_analytics_buffer(self.analytics_buffer)
            .with_recent_error_limit(self.recent_error_limit)
            .with_max_records_per_tool(self.max_records_per_tool)
    }
}
