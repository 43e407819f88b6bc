//! Error taxonomy surfaced by the tool factory

use super::value_objects::ToolResult;
use thiserror::Error;

/// Errors returned by the façade and the execution engine.
///
/// Callers branch on the variant: "not found" and "not public" are lookup
/// outcomes, everything else means the tool was located but could not be run.
#[derive(Error, Debug, Clone)]
pub enum ToolFactoryError {
    /// No domain knows the tool, public or private
    #[error("Tool {tool} not publicly available in any domain")]
    ToolNotFound { tool: String },

    /// The tool exists but its owner keeps it private
    #[error("Tool {tool} exists in domain {domain} but is not public")]
    ToolNotPublic { tool: String, domain: String },

    /// A domain manager or provider could not be reached
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// The invocation ran but failed or timed out
    #[error("Execution of {tool} failed: {message}")]
    ExecutionFailure { tool: String, message: String },

    /// The caller cancelled before the step started
    #[error("Execution of {tool} cancelled")]
    Cancelled { tool: String },

    /// A chain stopped at a failing step
    #[error("Tool chain aborted at step {step} ({tool}): {source}")]
    ChainAborted {
        step: usize,
        tool: String,
        /// Results of the steps that completed before the failure
        completed: Vec<ToolResult>,
        #[source]
        source: Box<ToolFactoryError>,
    },
}

impl ToolFactoryError {
    pub fn not_found(tool: impl Into<String>) -> Self {
        ToolFactoryError::ToolNotFound { tool: tool.into() }
    }

    pub fn not_public(tool: impl Into<String>, domain: impl Into<String>) -> Self {
        ToolFactoryError::ToolNotPublic {
            tool: tool.into(),
            domain: domain.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolFactoryError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolFactoryError::ExecutionFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Wrap the error of chain step `step`
    pub fn chain_aborted(
        step: usize,
        tool: impl Into<String>,
        completed: Vec<ToolResult>,
        source: ToolFactoryError,
    ) -> Self {
        ToolFactoryError::ChainAborted {
            step,
            tool: tool.into(),
            completed,
            source: Box::new(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolFactoryError::ToolNotFound { .. })
    }

    pub fn is_not_public(&self) -> bool {
        matches!(self, ToolFactoryError::ToolNotPublic { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolFactoryError::Cancelled { .. })
    }

    /// Per-item failure result used by parallel execution
    pub fn into_result(self, tool_name: impl Into<String>) -> ToolResult {
        ToolResult::failure(tool_name, self.to_string())
    }
}
