use super::{safe_div, sample_mean_std};
use crate::models::{NormalizedPoint, PeriodReturn, StatsResult};

/// Normalize each return against a trailing window of earlier returns
///
/// For index `i`:
/// - warm-up (`i < window`): statistics over `returns[0..=i]`, an expanding
///   window that includes the point itself
/// - steady (`i >= window`): statistics over `returns[i - window..i]`,
///   exactly `window` prior points and never the point itself
///
/// Each point carries the `local_mean`/`local_std` it was scored against.
/// The result's `mean`/`std` are plain averages of those local values and
/// are descriptive only.
///
/// A `window` of 0 is treated as 1.
pub fn compute_stats_rolling(returns: &[PeriodReturn], window: usize) -> StatsResult {
    if returns.is_empty() {
        return StatsResult::empty();
    }

    let window = window.max(1);
    let values: Vec<f64> = returns.iter().map(|r| r.ret).collect();

    let data: Vec<NormalizedPoint> = returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let slice = if i < window {
                &values[..=i]
            } else {
                &values[i - window..i]
            };
            let (local_mean, local_std) = sample_mean_std(slice);

            NormalizedPoint {
                date: r.date,
                ret: r.ret,
                z: safe_div(r.ret - local_mean, local_std),
                local_mean: Some(local_mean),
                local_std: Some(local_std),
            }
        })
        .collect();

    let n = data.len() as f64;
    let mean = data.iter().filter_map(|p| p.local_mean).sum::<f64>() / n;
    let std = data.iter().filter_map(|p| p.local_std).sum::<f64>() / n;

    StatsResult { mean, std, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    const SCENARIO: [f64; 4] = [0.02, -0.00980392156862745, 0.039603960396039604, -0.14285714285714285];

    fn returns_of(values: &[f64]) -> Vec<PeriodReturn> {
        let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &ret)| PeriodReturn {
                date: start + Duration::days(i as i64),
                ret,
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_returns() {
        let result = compute_stats_rolling(&[], 20);
        assert_eq!(result, StatsResult::empty());
    }

    #[test]
    fn test_window_two_scenario() {
        let result = compute_stats_rolling(&returns_of(&SCENARIO), 2);
        let data = &result.data;
        assert_eq!(data.len(), 4);

        // Point 0: warm-up window [r0], single sample -> std 0, z 0
        assert!(approx(data[0].local_mean.unwrap(), SCENARIO[0]));
        assert_eq!(data[0].local_std, Some(0.0));
        assert_eq!(data[0].z, 0.0);

        // Point 1: warm-up window [r0, r1] includes itself
        let (m01, s01) = sample_mean_std(&SCENARIO[0..2]);
        assert!(approx(data[1].local_mean.unwrap(), m01));
        assert!(approx(data[1].local_std.unwrap(), s01));
        assert!(approx(data[1].z, -std::f64::consts::FRAC_1_SQRT_2));

        // Point 2: steady window [r0, r1]
        assert!(approx(data[2].local_mean.unwrap(), m01));
        assert!(approx(data[2].local_std.unwrap(), s01));
        assert!((data[2].z - 1.637326).abs() < 1e-5);

        // Point 3: steady window [r1, r2]
        let (m12, s12) = sample_mean_std(&SCENARIO[1..3]);
        assert!(approx(data[3].local_mean.unwrap(), m12));
        assert!(approx(data[3].local_std.unwrap(), s12));
        assert!((data[3].z - (-4.515521)).abs() < 1e-5);
    }

    #[test]
    fn test_aggregate_is_average_of_local_stats() {
        let result = compute_stats_rolling(&returns_of(&SCENARIO), 2);

        let mean_avg = result.data.iter().map(|p| p.local_mean.unwrap()).sum::<f64>() / 4.0;
        let std_avg = result.data.iter().map(|p| p.local_std.unwrap()).sum::<f64>() / 4.0;

        assert!(approx(result.mean, mean_avg));
        assert!(approx(result.std, std_avg));
    }

    #[test]
    fn test_steady_region_ignores_current_point() {
        let base = [0.01, -0.01, 0.02, -0.02, 0.015, -0.005, 0.0, 0.01];
        let mut shocked = base;
        shocked[6] = 0.5;

        let window = 3;
        let a = compute_stats_rolling(&returns_of(&base), window);
        let b = compute_stats_rolling(&returns_of(&shocked), window);

        // Point 6's own statistics do not see the shock
        assert_eq!(a.data[6].local_mean, b.data[6].local_mean);
        assert_eq!(a.data[6].local_std, b.data[6].local_std);
        // Nothing before it moves either
        for i in 0..6 {
            assert_eq!(a.data[i], b.data[i]);
        }
        // The shock itself scores large against the calm window
        assert!(b.data[6].z > 10.0);
    }

    #[test]
    fn test_warm_up_uses_expanding_inclusive_window() {
        let values = [0.03, -0.01, 0.02, 0.04, -0.02, 0.01];
        let window = 4;
        let result = compute_stats_rolling(&returns_of(&values), window);

        for i in 0..window {
            let (mean, std) = sample_mean_std(&values[..=i]);
            assert!(approx(result.data[i].local_mean.unwrap(), mean), "i={}", i);
            assert!(approx(result.data[i].local_std.unwrap(), std), "i={}", i);
        }
        for i in window..values.len() {
            let (mean, std) = sample_mean_std(&values[i - window..i]);
            assert!(approx(result.data[i].local_mean.unwrap(), mean), "i={}", i);
            assert!(approx(result.data[i].local_std.unwrap(), std), "i={}", i);
        }
    }

    #[test]
    fn test_regime_change_scores_higher_than_full_sample() {
        // Volatile past, calm present, then a moderate move
        let mut values = Vec::new();
        for i in 0..40 {
            values.push(if i % 2 == 0 { 0.05 } else { -0.05 });
        }
        for i in 0..40 {
            values.push(if i % 2 == 0 { 0.002 } else { -0.002 });
        }
        values.push(0.03);

        let returns = returns_of(&values);
        let rolling = compute_stats_rolling(&returns, 20);
        let full = crate::analysis::compute_stats_full_sample(&returns);

        let last = values.len() - 1;
        assert!(rolling.data[last].z.abs() > 5.0);
        assert!(full.data[last].z.abs() < 1.5);
    }

    #[test]
    fn test_window_one_constant_history() {
        let result = compute_stats_rolling(&returns_of(&[0.01, 0.02, 0.03]), 1);
        // Every steady window has a single sample -> std 0 -> z 0
        assert!(result.data.iter().all(|p| p.z == 0.0));
        assert_eq!(result.data[2].local_mean, Some(0.02));
    }

    #[test]
    fn test_zero_window_treated_as_one() {
        let values = [0.01, 0.02, 0.03];
        let zero = compute_stats_rolling(&returns_of(&values), 0);
        let one = compute_stats_rolling(&returns_of(&values), 1);
        assert_eq!(zero, one);
    }
}
