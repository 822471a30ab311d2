use super::{safe_div, sample_mean_std};
use crate::models::{NormalizedPoint, PeriodReturn, StatsResult};

/// Normalize every return against one mean/std over the whole series
pub fn compute_stats_full_sample(returns: &[PeriodReturn]) -> StatsResult {
    if returns.is_empty() {
        return StatsResult::empty();
    }

    let values: Vec<f64> = returns.iter().map(|r| r.ret).collect();
    let (mean, std) = sample_mean_std(&values);

    let data = returns
        .iter()
        .map(|r| NormalizedPoint {
            date: r.date,
            ret: r.ret,
            z: safe_div(r.ret - mean, std),
            local_mean: None,
            local_std: None,
        })
        .collect();

    StatsResult { mean, std, data }
}
