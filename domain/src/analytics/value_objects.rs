//! Analytics reports: derived on read, never persisted

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::ErrorRecord;

/// Direction of execution-time change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
}

impl Trend {
    pub fn as_str(&self) -> &str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Degrading => "degrading",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Performance grade, A best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceGrade {
    A,
    B,
    C,
    D,
}

impl std::fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PerformanceGrade::A => "A",
            PerformanceGrade::B => "B",
            PerformanceGrade::C => "C",
            PerformanceGrade::D => "D",
        };
        write!(f, "{}", s)
    }
}

/// Usage statistics over a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    /// `None` when aggregated across every tool
    pub tool_name: Option<String>,
    pub window_seconds: u64,
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub success_rate: f64,
    pub avg_execution_time: f64,
    pub median_execution_time: f64,
    pub min_execution_time: f64,
    pub max_execution_time: f64,
    pub avg_context_size: f64,
    pub avg_result_size: f64,
}

/// Execution-time distribution of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub tool_name: Option<String>,
    pub sample_count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub outliers: Vec<f64>,
    pub outlier_percentage: f64,
    pub trend: Trend,
    pub grade: PerformanceGrade,
}

impl PerformanceAnalysis {
    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }
}

/// Error profile over a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub tool_name: Option<String>,
    pub window_seconds: u64,
    pub error_count: usize,
    pub total_usage: usize,
    /// errors ÷ usage in the window
    pub error_rate: f64,
    /// Occurrences per distinct error message
    pub error_frequency: BTreeMap<String, usize>,
    pub most_frequent_error: Option<String>,
    /// Newest first
    pub recent_errors: Vec<ErrorRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// What a recommendation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    SlowExecution,
    HighVariance,
    FrequentOutliers,
    DegradingTrend,
    HighErrorRate,
    RecurringError,
}

/// Rule-based optimization hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tool_name: Option<String>,
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
}

impl Recommendation {
    pub fn new(
        tool_name: Option<&str>,
        kind: RecommendationKind,
        priority: Priority,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.map(str::to_string),
            kind,
            priority,
            message: message.into(),
        }
    }
}
