//! Tool domain value objects: invocation input, output and metadata
//!
//! A tool is invoked with a [`ToolContext`] (a JSON object) and produces a
//! [`ToolResult`]. Providers answer with the wire-level [`ProviderResponse`],
//! which the execution engine normalizes into a [`ToolResult`] and stamps with
//! [`ExecutionMetadata`].
//!
//! ```text
//! ToolContext ──▶ provider.invoke() ──▶ ProviderResponse ──▶ ToolResult
//!                                                             └─ metadata
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input handed to a tool: a JSON object of named arguments.
pub type ToolContext = Map<String, Value>;

/// Reserved context key holding the previous chain step's result.
pub const LAST_RESULT_KEY: &str = "_lastResult";

/// Raw answer of a provider to `invoke(tool_name, context)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Absent on the wire means success
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl ProviderResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Execution metadata attached to every successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub tool_name: String,
    pub provider: String,
    pub domain: String,
    /// Wall-clock execution time in seconds
    pub execution_time: f64,
    pub executed_at: DateTime<Utc>,
    /// Caller that requested the execution (façade `execute_tool` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
    /// Entry point used (e.g. "execute_tool")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_via: Option<String>,
}

/// Result of a tool execution, carrying data or error information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output data (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Metadata about the execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExecutionMetadata>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            data,
            error: None,
            metadata: None,
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Normalize a provider answer
    pub fn from_response(tool_name: impl Into<String>, response: ProviderResponse) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: response.success,
            data: response.data,
            error: response.error,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ExecutionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serialized size of the result data in bytes (0 when absent)
    pub fn data_size(&self) -> usize {
        self.data
            .as_ref()
            .and_then(|d| serde_json::to_string(d).ok())
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Build the context for the next chain step.
    ///
    /// Object keys of `data` overwrite same-named context keys; the whole
    /// result is kept under [`LAST_RESULT_KEY`].
    pub fn merge_into(&self, context: &ToolContext) -> ToolContext {
        let mut next = context.clone();
        if let Some(Value::Object(fields)) = &self.data {
            for (key, value) in fields {
                next.insert(key.clone(), value.clone());
            }
        }
        let last = serde_json::to_value(self).unwrap_or(Value::Null);
        next.insert(LAST_RESULT_KEY.to_string(), last);
        next
    }
}

/// Serialized size of a context in bytes
pub fn context_size(context: &ToolContext) -> usize {
    serde_json::to_string(context).map(|s| s.len()).unwrap_or(0)
}

/// Lifecycle of a single invocation inside the execution engine.
///
/// `Pending → Resolving → Connected → Invoking → {Completed | Failed}`.
/// Terminal states are never retried by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Pending,
    Resolving,
    Connected,
    Invoking,
    Completed,
    Failed,
}

impl InvocationState {
    pub fn as_str(&self) -> &str {
        match self {
            InvocationState::Pending => "pending",
            InvocationState::Resolving => "resolving",
            InvocationState::Connected => "connected",
            InvocationState::Invoking => "invoking",
            InvocationState::Completed => "completed",
            InvocationState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvocationState::Completed | InvocationState::Failed)
    }

    /// Whether moving to `next` follows the invocation state machine
    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Resolving, Connected)
                | (Connected, Invoking)
                | (Invoking, Completed)
                | (Pending | Resolving | Connected | Invoking, Failed)
        )
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> ToolContext {
        match value {
            Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    #[test]
    fn test_provider_response_defaults_to_success() {
        let response: ProviderResponse = serde_json::from_value(json!({"data": 1})).unwrap();
        assert!(response.success);
        assert_eq!(response.data, Some(json!(1)));
    }

    #[test]
    fn test_from_response_keeps_error_message() {
        let result = ToolResult::from_response("calc", ProviderResponse::failed("boom"));
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("boom"));
    }

    #[test]
    fn test_merge_into_overwrites_and_keeps_last_result() {
        let ctx = context(json!({"amount": 10, "currency": "EUR"}));
        let result = ToolResult::success("calc", Some(json!({"amount": 12, "total": 14})));

        let next = result.merge_into(&ctx);

        assert_eq!(next["amount"], json!(12));
        assert_eq!(next["currency"], json!("EUR"));
        assert_eq!(next["total"], json!(14));
        assert_eq!(next[LAST_RESULT_KEY]["tool_name"], json!("calc"));
    }

    #[test]
    fn test_merge_into_non_object_data() {
        let ctx = context(json!({"a": 1}));
        let result = ToolResult::success("count", Some(json!(3)));

        let next = result.merge_into(&ctx);

        assert_eq!(next.len(), 2);
        assert_eq!(next[LAST_RESULT_KEY]["data"], json!(3));
    }

    #[test]
    fn test_data_size() {
        assert_eq!(ToolResult::failure("x", "err").data_size(), 0);
        assert_eq!(ToolResult::success("x", Some(json!("ab"))).data_size(), 4);
    }

    #[test]
    fn test_invocation_state_machine() {
        use InvocationState::*;
        assert!(Pending.can_transition_to(Resolving));
        assert!(Invoking.can_transition_to(Completed));
        assert!(Resolving.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Invoking));
        assert!(Failed.is_terminal());
    }
}
