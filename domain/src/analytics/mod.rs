//! Analytics domain module
//!
//! Invocation records are appended by the analytics engine; every report is
//! recomputed from them on read:
//!
//! - [`UsageStatistics`]: counts, success rate, timing and size averages
//! - [`PerformanceAnalysis`]: distribution, outliers, [`Trend`], [`PerformanceGrade`]
//! - [`ErrorAnalysis`]: error frequency and recent errors
//! - [`Recommendation`]: rule-based hints from [`rules::recommend`]

pub mod entities;
pub mod rules;
pub mod stats;
pub mod value_objects;

pub use entities::{ErrorRecord, InvocationRecord};
pub use value_objects::{
    ErrorAnalysis, PerformanceAnalysis, PerformanceGrade, Priority, Recommendation,
    RecommendationKind, Trend, UsageStatistics,
};
