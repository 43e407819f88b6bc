//! Pure statistics over execution-time samples.
//!
//! | Function | Empty input | Notes |
//! |----------|-------------|-------|
//! | [`mean`] | `0.0` | |
//! | [`median`] | `0.0` | average of the two middle values for even lengths |
//! | [`std_dev`] | `0.0` | sample standard deviation, `0.0` below 2 samples |
//! | [`outliers`] | `[]` | values above `Q3 + 1.5×IQR`, needs 4 samples |
//! | [`trend`] | `Stable` | last 10 vs. earlier samples, needs 20 samples |

use super::value_objects::{PerformanceGrade, Trend};

/// Samples compared against the earlier history when computing a trend
pub const TREND_RECENT_WINDOW: usize = 10;
/// Minimum samples before a trend is computed
pub const TREND_MIN_SAMPLES: usize = 20;
/// Relative change of the recent mean that counts as a trend
pub const TREND_THRESHOLD: f64 = 0.10;
/// Minimum samples for quartile-based outlier detection
pub const OUTLIER_MIN_SAMPLES: usize = 4;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Percentile `p` in `[0, 1]` with linear interpolation between ranks
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Values strictly above `Q3 + 1.5×IQR`, in input order
pub fn outliers(values: &[f64]) -> Vec<f64> {
    if values.len() < OUTLIER_MIN_SAMPLES {
        return Vec::new();
    }
    let q1 = percentile(values, 0.25);
    let q3 = percentile(values, 0.75);
    let fence = q3 + 1.5 * (q3 - q1);
    values.iter().copied().filter(|v| *v > fence).collect()
}

/// Compare the most recent samples with the earlier ones.
///
/// Samples must be in chronological order. Higher execution times mean the
/// tool is degrading.
pub fn trend(values: &[f64]) -> Trend {
    if values.len() < TREND_MIN_SAMPLES {
        return Trend::Stable;
    }
    let split = values.len() - TREND_RECENT_WINDOW;
    let earlier = mean(&values[..split]);
    let recent = mean(&values[split..]);
    if earlier == 0.0 {
        return if recent > 0.0 {
            Trend::Degrading
        } else {
            Trend::Stable
        };
    }
    let change = (recent - earlier) / earlier;
    if change > TREND_THRESHOLD {
        Trend::Degrading
    } else if change < -TREND_THRESHOLD {
        Trend::Improving
    } else {
        Trend::Stable
    }
}

/// Grade from mean time, standard deviation and outlier count.
///
/// | Grade | mean | std dev | outliers |
/// |-------|------|---------|----------|
/// | A | < 1s | < 0.5 | 0 |
/// | B | < 2s | < 1.0 | ≤ 1 |
/// | C | < 5s | < 2.5 | ≤ 3 |
/// | D | anything worse | | |
pub fn grade(mean: f64, std_dev: f64, outlier_count: usize) -> PerformanceGrade {
    if mean < 1.0 && std_dev < 0.5 && outlier_count == 0 {
        PerformanceGrade::A
    } else if mean < 2.0 && std_dev < 1.0 && outlier_count <= 1 {
        PerformanceGrade::B
    } else if mean < 5.0 && std_dev < 2.5 && outlier_count <= 3 {
        PerformanceGrade::C
    } else {
        PerformanceGrade::D
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}
