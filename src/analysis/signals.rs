use crate::models::{NormalizedPoint, SignalCount};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Keep points with `start <= date <= end`
///
/// If either bound is missing the input is returned unchanged.
pub fn filter_range(
    data: &[NormalizedPoint],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<NormalizedPoint> {
    match (start, end) {
        (Some(start), Some(end)) => data
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect(),
        _ => data.to_vec(),
    }
}

fn is_signal(point: &NormalizedPoint, threshold: f64) -> bool {
    point.abs_z() >= threshold
}

/// Count points with `|z| >= threshold` and their share of the series
pub fn count_signals(data: &[NormalizedPoint], threshold: f64) -> SignalCount {
    let count = data.iter().filter(|p| is_signal(p, threshold)).count();
    let pct = if data.is_empty() {
        0.0
    } else {
        (count as f64 / data.len() as f64 * 1000.0).round() / 10.0
    };
    SignalCount { count, pct }
}

/// Signals ordered by `|z|` descending, ties kept in series order
pub fn list_signals(data: &[NormalizedPoint], threshold: f64) -> Vec<NormalizedPoint> {
    let mut signals: Vec<NormalizedPoint> = data
        .iter()
        .filter(|p| is_signal(p, threshold))
        .copied()
        .collect();

    // sort_by is stable
    signals.sort_by(|a, b| b.abs_z().partial_cmp(&a.abs_z()).unwrap_or(Ordering::Equal));
    signals
}

/// Points whose bar exceeds the display ceiling (`|z| > scale`)
pub fn count_clipped(data: &[NormalizedPoint], scale: f64) -> usize {
    data.iter().filter(|p| p.abs_z() > scale).count()
}
