//! Analytics entities: append-only invocation and error records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::value_objects::{ToolContext, ToolResult, context_size};

/// One tool invocation as seen by the analytics engine.
///
/// Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub tool_name: String,
    pub timestamp: DateTime<Utc>,
    /// Serialized context size in bytes
    pub context_size: usize,
    /// Serialized result data size in bytes
    pub result_size: usize,
    pub success: bool,
    /// Wall-clock execution time in seconds
    pub execution_time: f64,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub domain: String,
}

impl InvocationRecord {
    /// Build a record from an invocation outcome.
    ///
    /// Execution time, provider and domain come from the result metadata when
    /// present.
    pub fn from_result(
        tool_name: impl Into<String>,
        context: &ToolContext,
        result: &ToolResult,
    ) -> Self {
        let (execution_time, provider_id, domain, timestamp) = match &result.metadata {
            Some(m) => (
                m.execution_time,
                m.provider.clone(),
                m.domain.clone(),
                m.executed_at,
            ),
            None => (0.0, String::new(), String::new(), Utc::now()),
        };
        Self {
            tool_name: tool_name.into(),
            timestamp,
            context_size: context_size(context),
            result_size: result.data_size(),
            success: result.success,
            execution_time,
            provider_id,
            domain,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time = seconds;
        self
    }
}

/// A failed invocation kept in the per-tool error log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub tool_name: String,
    pub timestamp: DateTime<Utc>,
    pub error: String,
    pub context_size: usize,
}
