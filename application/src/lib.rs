//! Application layer for tool-factory
//!
//! This crate contains the discovery, execution and analytics engines, the
//! [`ToolFactory`] façade that wires them together, and the runtime
//! configuration they share. It depends only on the domain layer.

pub mod cache;
pub mod config;
pub mod services;

// Re-export commonly used types
pub use cache::TtlCache;
pub use config::FactoryConfig;
pub use services::{
    AnalyticsEngine, AnalyticsRecorder, BoundTool, ChainResult, ConnectionPool, DEFAULT_WINDOW,
    DiscoveryEngine, DomainRegistry, ExecutionEngine, FactoryStatistics, HealthReport,
    HealthStatus, PoolStats, ToolCatalog, ToolFactory,
};
