use crate::models::{PeriodReturn, PricePoint, ReturnPeriod};

/// Convert a close series into fixed-step period returns
///
/// Steps over rows, not calendar days: for every `i = step, 2*step, ...`
/// the return is `(close[i] - close[i - step]) / close[i - step]`, dated at
/// `prices[i]`. Output length is `floor((N - 1) / step)`, empty when
/// `N <= step`.
///
/// The prior close is divided as-is. Loaders only produce positive closes
/// (see [`crate::models::normalize_prices`]), so series built through them
/// never hit a zero divisor.
pub fn compute_returns(prices: &[PricePoint], period: ReturnPeriod) -> Vec<PeriodReturn> {
    let step = period.step();

    if prices.len() <= step {
        return Vec::new();
    }

    (step..prices.len())
        .step_by(step)
        .map(|i| {
            let prev = prices[i - step].close;
            let curr = &prices[i];
            PeriodReturn {
                date: curr.date,
                ret: (curr.close - prev) / prev,
            }
        })
        .collect()
}
