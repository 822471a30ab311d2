//! Return z-score engine
//!
//! Pure, synchronous transforms over already-loaded price series:
//!
//! ```text
//! prices -> compute_returns -> (full-sample | rolling) -> filter_range -> signals
//! ```
//!
//! Every normalizer divides through [`safe_div`], so "zero spread means a
//! zero z-score" holds everywhere.

pub mod full_sample;
pub mod pipeline;
pub mod returns;
pub mod rolling;
pub mod signals;

pub use full_sample::compute_stats_full_sample;
pub use pipeline::{recompute, ChartView};
pub use returns::compute_returns;
pub use rolling::compute_stats_rolling;
pub use signals::{count_clipped, count_signals, filter_range, list_signals};

/// Spreads below this are floating-point residue from identical inputs
const ZERO_STD_EPSILON: f64 = 1e-12;

/// `num / den`, or 0.0 when `den` is zero
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den != 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Sample mean and standard deviation of `values`
///
/// Variance divides by `n - 1`, or by 1 for a single value (which leaves
/// it at 0). An empty slice yields `(0.0, 0.0)`. A standard deviation that
/// is only rounding noise is reported as exactly 0.
pub fn sample_mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let divisor = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let std = (sum_sq / divisor).sqrt();

    if std < ZERO_STD_EPSILON {
        (mean, 0.0)
    } else {
        (mean, std)
    }
}
