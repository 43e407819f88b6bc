//! Analytics engine: invocation records and the reports derived from them.
//!
//! Records are append-only and kept per tool, oldest dropped first once the
//! retention limit is reached. Every report is recomputed on read.
//!
//! The execution path never writes here directly: it hands records to an
//! [`AnalyticsRecorder`], a bounded queue drained by a background task. A
//! full queue drops the record with a warning instead of blocking the call.
//!
//! ```text
//! ExecutionEngine ──try_send──▶ [ mpsc queue ] ──▶ drain task ──▶ AnalyticsEngine
//!                                                                   │
//!                     usage_statistics / performance_analysis ◀─────┘
//!                     error_analysis / optimization_recommendations
//! ```

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tool_factory_domain::analytics::{rules, stats};
use tool_factory_domain::{
    ErrorAnalysis, ErrorRecord, InvocationRecord, PerformanceAnalysis, Recommendation,
    ToolContext, ToolResult, UsageStatistics,
};
use tracing::{debug, warn};

/// Window used when the caller does not pick one
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3600);

const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Default)]
struct Log {
    records: HashMap<String, VecDeque<InvocationRecord>>,
    errors: HashMap<String, VecDeque<ErrorRecord>>,
}

pub struct AnalyticsEngine {
    log: RwLock<Log>,
    max_records_per_tool: usize,
    recent_error_limit: usize,
}

impl AnalyticsEngine {
    pub fn new(max_records_per_tool: usize, recent_error_limit: usize) -> Self {
        Self {
            log: RwLock::new(Log::default()),
            max_records_per_tool: max_records_per_tool.max(1),
            recent_error_limit,
        }
    }

    /// Append a record for an invocation outcome
    pub fn track_usage(&self, tool_name: &str, context: &ToolContext, result: &ToolResult) {
        let record = InvocationRecord::from_result(tool_name, context, result);
        self.record(record, result.error.clone());
    }

    /// Append a prepared record; failures also land in the error log.
    pub fn record(&self, record: InvocationRecord, error: Option<String>) {
        let limit = self.max_records_per_tool;
        let mut log = self.write();

        if !record.success {
            let errors = log.errors.entry(record.tool_name.clone()).or_default();
            errors.push_back(ErrorRecord {
                tool_name: record.tool_name.clone(),
                timestamp: record.timestamp,
                error: error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
                context_size: record.context_size,
            });
            while errors.len() > limit {
                errors.pop_front();
            }
        }

        let records = log.records.entry(record.tool_name.clone()).or_default();
        records.push_back(record);
        while records.len() > limit {
            records.pop_front();
        }
    }

    /// Tools with at least one retained record, sorted by name
    pub fn tracked_tools(&self) -> Vec<String> {
        let mut tools: Vec<String> = self.read().records.keys().cloned().collect();
        tools.sort();
        tools
    }

    pub fn total_records(&self) -> usize {
        self.read().records.values().map(VecDeque::len).sum()
    }

    /// Usage over the last `window`; `None` when nothing was recorded in it.
    pub fn usage_statistics(
        &self,
        tool_name: Option<&str>,
        window: Duration,
    ) -> Option<UsageStatistics> {
        let cutoff = cutoff(window);
        let records: Vec<InvocationRecord> = self
            .records_for(tool_name)
            .into_iter()
            .filter(|r| in_window(r.timestamp, cutoff))
            .collect();
        if records.is_empty() {
            return None;
        }

        let times: Vec<f64> = records.iter().map(|r| r.execution_time).collect();
        let total = records.len();
        let successful = records.iter().filter(|r| r.success).count();

        Some(UsageStatistics {
            tool_name: tool_name.map(str::to_string),
            window_seconds: window.as_secs(),
            total_calls: total,
            successful_calls: successful,
            failed_calls: total - successful,
            success_rate: successful as f64 / total as f64,
            avg_execution_time: stats::mean(&times),
            median_execution_time: stats::median(&times),
            min_execution_time: times.iter().copied().fold(f64::INFINITY, f64::min),
            max_execution_time: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg_context_size: records.iter().map(|r| r.context_size as f64).sum::<f64>()
                / total as f64,
            avg_result_size: records.iter().map(|r| r.result_size as f64).sum::<f64>()
                / total as f64,
        })
    }

    /// Execution-time distribution over every retained record.
    ///
    /// `None` when the tool has no records.
    pub fn performance_analysis(&self, tool_name: Option<&str>) -> Option<PerformanceAnalysis> {
        let records = self.records_for(tool_name);
        if records.is_empty() {
            return None;
        }

        let times: Vec<f64> = records.iter().map(|r| r.execution_time).collect();
        let mean = stats::mean(&times);
        let std_dev = stats::std_dev(&times);
        let outliers = stats::outliers(&times);

        Some(PerformanceAnalysis {
            tool_name: tool_name.map(str::to_string),
            sample_count: times.len(),
            mean,
            median: stats::median(&times),
            std_dev,
            outlier_percentage: outliers.len() as f64 / times.len() as f64 * 100.0,
            trend: stats::trend(&times),
            grade: stats::grade(mean, std_dev, outliers.len()),
            outliers,
        })
    }

    pub fn error_analysis(&self, tool_name: Option<&str>, window: Duration) -> ErrorAnalysis {
        let cutoff = cutoff(window);
        let total_usage = self
            .records_for(tool_name)
            .iter()
            .filter(|r| in_window(r.timestamp, cutoff))
            .count();
        let errors: Vec<ErrorRecord> = self
            .errors_for(tool_name)
            .into_iter()
            .filter(|e| in_window(e.timestamp, cutoff))
            .collect();

        let mut error_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for error in &errors {
            *error_frequency.entry(error.error.clone()).or_default() += 1;
        }

        let mut most_frequent_error: Option<(&String, usize)> = None;
        for (message, count) in &error_frequency {
            if most_frequent_error.is_none_or(|(_, best)| *count > best) {
                most_frequent_error = Some((message, *count));
            }
        }
        let most_frequent_error = most_frequent_error.map(|(message, _)| message.clone());

        let recent_errors = errors
            .iter()
            .rev()
            .take(self.recent_error_limit)
            .cloned()
            .collect();

        ErrorAnalysis {
            tool_name: tool_name.map(str::to_string),
            window_seconds: window.as_secs(),
            error_count: errors.len(),
            total_usage,
            error_rate: if total_usage == 0 {
                0.0
            } else {
                errors.len() as f64 / total_usage as f64
            },
            error_frequency,
            most_frequent_error,
            recent_errors,
        }
    }

    /// Rule-based hints for one tool, or for every tracked tool
    pub fn optimization_recommendations(&self, tool_name: Option<&str>) -> Vec<Recommendation> {
        match tool_name {
            Some(tool) => self.recommend_for(tool),
            None => self
                .tracked_tools()
                .iter()
                .flat_map(|tool| self.recommend_for(tool))
                .collect(),
        }
    }

    fn recommend_for(&self, tool: &str) -> Vec<Recommendation> {
        let performance = self.performance_analysis(Some(tool));
        let errors = self.error_analysis(Some(tool), DEFAULT_WINDOW);
        rules::recommend(Some(tool), performance.as_ref(), Some(&errors))
    }

    /// Records of one tool, or of every tool ordered by timestamp
    fn records_for(&self, tool_name: Option<&str>) -> Vec<InvocationRecord> {
        let log = self.read();
        match tool_name {
            Some(tool) => log
                .records
                .get(tool)
                .map(|r| r.iter().cloned().collect())
                .unwrap_or_default(),
            None => {
                let mut all: Vec<InvocationRecord> =
                    log.records.values().flatten().cloned().collect();
                all.sort_by_key(|r| r.timestamp);
                all
            }
        }
    }

    fn errors_for(&self, tool_name: Option<&str>) -> Vec<ErrorRecord> {
        let log = self.read();
        match tool_name {
            Some(tool) => log
                .errors
                .get(tool)
                .map(|e| e.iter().cloned().collect())
                .unwrap_or_default(),
            None => {
                let mut all: Vec<ErrorRecord> = log.errors.values().flatten().cloned().collect();
                all.sort_by_key(|e| e.timestamp);
                all
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Log> {
        self.log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Log> {
        self.log
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn cutoff(window: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| Utc::now().checked_sub_signed(w))
}

fn in_window(timestamp: DateTime<Utc>, cutoff: Option<DateTime<Utc>>) -> bool {
    cutoff.is_none_or(|c| timestamp >= c)
}

// ==================== Recorder ====================

enum AnalyticsEvent {
    Invocation {
        record: InvocationRecord,
        error: Option<String>,
    },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget handle feeding the analytics engine.
#[derive(Clone)]
pub struct AnalyticsRecorder {
    sender: mpsc::Sender<AnalyticsEvent>,
}

impl AnalyticsRecorder {
    /// Start the drain task. Must be called inside a Tokio runtime.
    ///
    /// The task ends once every recorder clone is dropped.
    pub fn spawn(engine: Arc<AnalyticsEngine>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event {
                    AnalyticsEvent::Invocation { record, error } => engine.record(record, error),
                    AnalyticsEvent::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Analytics recorder stopped");
        });
        Self { sender }
    }

    /// Queue a record without waiting; dropped with a warning when full.
    pub fn record(&self, record: InvocationRecord, error: Option<String>) {
        let tool = record.tool_name.clone();
        match self
            .sender
            .try_send(AnalyticsEvent::Invocation { record, error })
        {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(tool = %tool, "Analytics queue full, dropping invocation record");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(tool = %tool, "Analytics recorder closed, dropping invocation record");
            }
        }
    }

    /// Wait until every record queued before this call has been applied
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(AnalyticsEvent::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }
}
