//! Optimization recommendation rules
//!
//! | Rule | Threshold | Priority |
//! |------|-----------|----------|
//! | Slow execution | mean > 5s | High |
//! | High variance | std dev > 50% of mean | Medium |
//! | Frequent outliers | outliers > 10% of samples | Medium |
//! | Degrading trend | trend = degrading | High |
//! | High error rate | error rate > 10% | High |
//! | Recurring error | one message seen > 5 times | Medium |

use super::value_objects::{
    ErrorAnalysis, PerformanceAnalysis, Priority, Recommendation, RecommendationKind, Trend,
};

pub const SLOW_MEAN_SECONDS: f64 = 5.0;
pub const HIGH_VARIANCE_RATIO: f64 = 0.5;
pub const OUTLIER_PERCENTAGE_LIMIT: f64 = 10.0;
pub const ERROR_RATE_LIMIT: f64 = 0.10;
pub const RECURRING_ERROR_LIMIT: usize = 5;

/// Apply every rule to the available analyses
pub fn recommend(
    tool_name: Option<&str>,
    performance: Option<&PerformanceAnalysis>,
    errors: Option<&ErrorAnalysis>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(perf) = performance {
        if perf.mean > SLOW_MEAN_SECONDS {
            recommendations.push(Recommendation::new(
                tool_name,
                RecommendationKind::SlowExecution,
                Priority::High,
                format!(
                    "Average execution time {:.2}s exceeds {:.0}s; consider caching or batching",
                    perf.mean, SLOW_MEAN_SECONDS
                ),
            ));
        }

        if perf.mean > 0.0 && perf.std_dev > perf.mean * HIGH_VARIANCE_RATIO {
            recommendations.push(Recommendation::new(
                tool_name,
                RecommendationKind::HighVariance,
                Priority::Medium,
                format!(
                    "Execution time is inconsistent (std dev {:.2}s vs mean {:.2}s)",
                    perf.std_dev, perf.mean
                ),
            ));
        }

        if perf.outlier_percentage > OUTLIER_PERCENTAGE_LIMIT {
            recommendations.push(Recommendation::new(
                tool_name,
                RecommendationKind::FrequentOutliers,
                Priority::Medium,
                format!(
                    "{:.1}% of executions are outliers; investigate slow paths",
                    perf.outlier_percentage
                ),
            ));
        }

        if perf.trend == Trend::Degrading {
            recommendations.push(Recommendation::new(
                tool_name,
                RecommendationKind::DegradingTrend,
                Priority::High,
                "Recent executions are slower than the historical average",
            ));
        }
    }

    if let Some(errors) = errors {
        if errors.error_rate > ERROR_RATE_LIMIT {
            recommendations.push(Recommendation::new(
                tool_name,
                RecommendationKind::HighErrorRate,
                Priority::High,
                format!(
                    "Error rate {:.1}% exceeds {:.0}%",
                    errors.error_rate * 100.0,
                    ERROR_RATE_LIMIT * 100.0
                ),
            ));
        }

        for (message, count) in &errors.error_frequency {
            if *count > RECURRING_ERROR_LIMIT {
                recommendations.push(Recommendation::new(
                    tool_name,
                    RecommendationKind::RecurringError,
                    Priority::Medium,
                    format!("Error \"{}\" occurred {} times", message, count),
                ));
            }
        }
    }

    recommendations
}
