//! Execution engine: single, chained and parallel invocation.
//!
//! Each invocation walks a fixed state machine and is never retried:
//!
//! ```text
//! Pending ──▶ Resolving ──▶ Connected ──▶ Invoking ──┬──▶ Completed
//!                 │                                  └──▶ Failed
//!                 └── handshake failed ──────────────────▶ Failed
//! ```
//!
//! | Outcome | Error | Pool |
//! |---------|-------|------|
//! | handshake failed / timed out | `ProviderUnavailable` | nothing pooled |
//! | invocation timed out | `ExecutionFailure` | connection marked unhealthy |
//! | transport error | `ExecutionFailure` | kept |
//! | provider reported failure | `ExecutionFailure` | kept |
//!
//! Every outcome is handed to the analytics recorder before the call
//! returns.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tool_factory_domain::{
    ExecutionMetadata, InvocationRecord, InvocationState, ToolContext, ToolDescriptor,
    ToolFactoryError, ToolResult,
};
use tracing::{debug, trace, warn};

use super::analytics::AnalyticsRecorder;
use super::pool::ConnectionPool;

/// Outcome of a chain whose every step succeeded
#[derive(Debug, Clone, Serialize)]
pub struct ChainResult {
    /// One result per step, in chain order
    pub steps: Vec<ToolResult>,
    /// Context after merging the last step's result
    pub final_context: ToolContext,
}

impl ChainResult {
    pub fn last(&self) -> Option<&ToolResult> {
        self.steps.last()
    }
}

#[derive(Clone)]
pub struct ExecutionEngine {
    pool: Arc<ConnectionPool>,
    recorder: Option<AnalyticsRecorder>,
    call_timeout: Duration,
}

impl ExecutionEngine {
    pub fn new(pool: Arc<ConnectionPool>, call_timeout: Duration) -> Self {
        Self {
            pool,
            recorder: None,
            call_timeout,
        }
    }

    pub fn with_recorder(mut self, recorder: AnalyticsRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Invoke one tool through its provider's pooled connection.
    ///
    /// A successful result carries [`ExecutionMetadata`]; any failure is a
    /// typed error preserving the provider's message.
    pub async fn execute_tool(
        &self,
        descriptor: &ToolDescriptor,
        context: &ToolContext,
    ) -> Result<ToolResult, ToolFactoryError> {
        let tool = descriptor.name.as_str();
        let provider = descriptor.provider_id.as_str();
        let started = Instant::now();
        let mut state = InvocationState::Pending;

        transition(&mut state, InvocationState::Resolving, tool);
        let connection = match self.pool.acquire(provider).await {
            Ok(connection) => connection,
            Err(e) => {
                transition(&mut state, InvocationState::Failed, tool);
                self.track_failure(descriptor, context, started, &e);
                return Err(e);
            }
        };
        transition(&mut state, InvocationState::Connected, tool);

        transition(&mut state, InvocationState::Invoking, tool);
        let call = connection.invoke(tool, context);
        let outcome = tokio::time::timeout(self.call_timeout, call).await;

        let failure = match outcome {
            Ok(Ok(response)) if response.success => {
                transition(&mut state, InvocationState::Completed, tool);
                let result = ToolResult::from_response(tool, response)
                    .with_metadata(metadata(descriptor, started));
                self.track(context, &result);
                debug!(tool = %tool, provider = %provider, "Tool executed");
                return Ok(result);
            }
            Ok(Ok(response)) => ToolFactoryError::execution(
                tool,
                response
                    .error
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            ),
            Ok(Err(e)) => ToolFactoryError::execution(tool, e.to_string()),
            Err(_) => {
                self.pool.mark_unhealthy(provider, &connection);
                ToolFactoryError::execution(
                    tool,
                    format!("timed out after {:.1}s", self.call_timeout.as_secs_f64()),
                )
            }
        };

        transition(&mut state, InvocationState::Failed, tool);
        warn!(tool = %tool, provider = %provider, error = %failure, "Tool execution failed");
        self.track_failure(descriptor, context, started, &failure);
        Err(failure)
    }

    /// Run tools strictly in order, feeding each result into the next context.
    ///
    /// Stops at the first failure, or before the next step once `cancel`
    /// fires; either way the error is `ChainAborted` with the results of the
    /// steps that completed. A step already in flight is never interrupted.
    pub async fn execute_tool_chain(
        &self,
        chain: &[ToolDescriptor],
        initial_context: ToolContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<ChainResult, ToolFactoryError> {
        let mut context = initial_context;
        let mut steps = Vec::with_capacity(chain.len());

        for (step, descriptor) in chain.iter().enumerate() {
            if let Some(token) = cancel
                && token.is_cancelled()
            {
                debug!(step, tool = %descriptor.name, "Chain cancelled");
                let cancelled = ToolFactoryError::Cancelled {
                    tool: descriptor.name.clone(),
                };
                return Err(ToolFactoryError::chain_aborted(
                    step,
                    &descriptor.name,
                    steps,
                    cancelled,
                ));
            }

            match self.execute_tool(descriptor, &context).await {
                Ok(result) => {
                    context = result.merge_into(&context);
                    steps.push(result);
                }
                Err(e) => {
                    return Err(ToolFactoryError::chain_aborted(
                        step,
                        &descriptor.name,
                        steps,
                        e,
                    ));
                }
            }
        }

        Ok(ChainResult {
            steps,
            final_context: context,
        })
    }

    /// Invoke every tool concurrently against the same context.
    ///
    /// Output is aligned with the input: `result[i]` belongs to `tools[i]`.
    /// Failures become failure items. When `cancel` fires, every item that
    /// has not completed resolves as a cancelled failure.
    pub async fn execute_tools_parallel(
        &self,
        tools: &[ToolDescriptor],
        shared_context: &ToolContext,
        cancel: Option<&CancellationToken>,
    ) -> Vec<ToolResult> {
        let mut slots: Vec<Option<ToolResult>> = vec![None; tools.len()];
        let mut join_set = JoinSet::new();

        for (index, descriptor) in tools.iter().enumerate() {
            let engine = self.clone();
            let descriptor = descriptor.clone();
            let context = shared_context.clone();
            join_set.spawn(async move {
                let result = engine
                    .execute_tool(&descriptor, &context)
                    .await
                    .unwrap_or_else(|e| e.into_result(&descriptor.name));
                (index, result)
            });
        }

        let mut cancelled = false;
        loop {
            let joined = if let Some(token) = cancel {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        join_set.abort_all();
                        cancelled = true;
                        break;
                    }
                    joined = join_set.join_next() => joined,
                }
            } else {
                join_set.join_next().await
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "Parallel execution task failed"),
            }
        }

        slots
            .into_iter()
            .zip(tools)
            .map(|(slot, descriptor)| {
                slot.unwrap_or_else(|| {
                    if cancelled {
                        ToolFactoryError::Cancelled {
                            tool: descriptor.name.clone(),
                        }
                        .into_result(&descriptor.name)
                    } else {
                        ToolResult::failure(&descriptor.name, "execution task did not complete")
                    }
                })
            })
            .collect()
    }

    fn track(&self, context: &ToolContext, result: &ToolResult) {
        if let Some(recorder) = &self.recorder {
            let record = InvocationRecord::from_result(&result.tool_name, context, result);
            recorder.record(record, result.error.clone());
        }
    }

    fn track_failure(
        &self,
        descriptor: &ToolDescriptor,
        context: &ToolContext,
        started: Instant,
        error: &ToolFactoryError,
    ) {
        let result = ToolResult::failure(&descriptor.name, error.to_string())
            .with_metadata(metadata(descriptor, started));
        self.track(context, &result);
    }
}

fn metadata(descriptor: &ToolDescriptor, started: Instant) -> ExecutionMetadata {
    ExecutionMetadata {
        tool_name: descriptor.name.clone(),
        provider: descriptor.provider_id.clone(),
        domain: descriptor.domain.clone(),
        execution_time: started.elapsed().as_secs_f64(),
        executed_at: Utc::now(),
        requester: None,
        executed_via: None,
    }
}

fn transition(state: &mut InvocationState, next: InvocationState, tool: &str) {
    debug_assert!(state.can_transition_to(next), "{} -> {}", state, next);
    trace!(tool = %tool, from = %state, to = %next, "Invocation state");
    *state = next;
}
