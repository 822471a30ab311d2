use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fractional return ending on `date` (0.0123 = +1.23%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    /// Later endpoint of the return interval
    pub date: NaiveDate,
    pub ret: f64,
}

/// A return with its z-score
///
/// `local_mean` / `local_std` are only set in rolling mode and hold the
/// statistics this specific point was normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPoint {
    pub date: NaiveDate,
    pub ret: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_std: Option<f64>,
}

impl NormalizedPoint {
    pub fn abs_z(&self) -> f64 {
        self.z.abs()
    }
}

/// Output of a normalizer
///
/// In full-sample mode `mean`/`std` are the statistics every point used.
/// In rolling mode they are averages of the per-point local statistics and
/// only describe the series; they are never used to recompute a z-score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsResult {
    pub mean: f64,
    pub std: f64,
    pub data: Vec<NormalizedPoint>,
}

impl StatsResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Signal tally for a threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalCount {
    pub count: usize,
    /// Share of points that are signals, 0–100, one decimal
    pub pct: f64,
}

impl SignalCount {
    /// Percentage formatted the way the chart legend shows it ("4.0")
    pub fn pct_label(&self) -> String {
        format!("{:.1}", self.pct)
    }
}
