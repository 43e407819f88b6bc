//! Domain layer for tool-factory
//!
//! This crate contains the core business types and contracts of the tool
//! factory. It has no dependencies on infrastructure or runtime concerns.
//!
//! # Core Concepts
//!
//! ## Tools and domains
//!
//! A **tool** is a named remote capability. Tools are owned by **domains**
//! (reached through a [`DomainManager`]) and executed by **providers**
//! (reached through a [`ProviderConnector`]). Only public tools are visible
//! outside their domain.
//!
//! ## Discovery
//!
//! Callers find tools by capability, domain, free text or relation to another
//! tool. Every query shape has a canonical cache key ([`DiscoveryQuery`]).
//!
//! ## Analytics
//!
//! Every invocation becomes an [`InvocationRecord`]; statistics, grades,
//! trends and recommendations are derived from those records on read.

pub mod analytics;
pub mod discovery;
pub mod tool;

// Re-export commonly used types
pub use analytics::{
    ErrorAnalysis, ErrorRecord, InvocationRecord, PerformanceAnalysis, PerformanceGrade, Priority,
    Recommendation, RecommendationKind, Trend, UsageStatistics,
};
pub use discovery::{DiscoveryQuery, SearchFilters};
pub use tool::{
    DomainHealth, DomainManager, ExecutionMetadata, InvocationState, LAST_RESULT_KEY, ManagerError,
    PatternExposure, ProviderConnection, ProviderConnector, ProviderError, ProviderResponse,
    ToolContext, ToolDescriptor, ToolFactoryError, ToolFilter, ToolLookup, ToolResult, Visibility,
};
