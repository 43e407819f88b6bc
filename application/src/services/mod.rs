//! Tool factory services.
//!
//! | Service | Role |
//! |---------|------|
//! | [`DomainRegistry`] | domain name → manager, registration order |
//! | [`DiscoveryEngine`] | cached capability / domain / text / relation queries |
//! | [`ConnectionPool`] | one reusable connection per provider |
//! | [`ExecutionEngine`] | single, chained and parallel invocation |
//! | [`AnalyticsEngine`] | invocation records and derived reports |
//! | [`ToolFactory`] | façade wiring everything together |

pub mod analytics;
pub mod discovery;
pub mod execution;
pub mod factory;
pub mod pool;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use analytics::{AnalyticsEngine, AnalyticsRecorder, DEFAULT_WINDOW};
pub use discovery::DiscoveryEngine;
pub use execution::{ChainResult, ExecutionEngine};
pub use factory::{
    BoundTool, DomainStatus, ExecutionStats, FACTORY_VERSION, FactoryStatistics, HealthReport,
    HealthStatus, ToolCatalog, ToolFactory,
};
pub use pool::{ConnectionPool, PoolStats};
pub use registry::DomainRegistry;
