use super::{
    compute_returns, compute_stats_full_sample, compute_stats_rolling, count_clipped,
    count_signals, filter_range, list_signals,
};
use crate::constants::CLIP_SCALE;
use crate::models::{ChartConfig, NormalizedPoint, PriceHistory, SigmaMode, SignalCount};
use serde::Serialize;

/// Everything the presentation layer draws for one [`ChartConfig`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub config: ChartConfig,
    pub name: Option<String>,
    pub currency: Option<String>,
    /// Aggregate mean of the normalizer (see `StatsResult`)
    pub mean: f64,
    /// Aggregate std of the normalizer (see `StatsResult`)
    pub std: f64,
    /// Returns computed over the whole history, before range filtering
    pub total_returns: usize,
    /// Normalized points inside the configured date range
    pub data: Vec<NormalizedPoint>,
    pub signals: SignalCount,
    /// In-range signals, strongest first
    pub signal_list: Vec<NormalizedPoint>,
    /// In-range points beyond the display ceiling
    pub clipped: usize,
    /// The date range selected no points
    pub empty_range: bool,
}

impl ChartView {
    /// Keep only the first `limit` entries of the signal list
    pub fn truncate_signals(mut self, limit: usize) -> Self {
        self.signal_list.truncate(limit);
        self
    }
}

/// Recompute the whole chart from one immutable configuration
///
/// Statistics are computed over the full history first, so a rolling window
/// near the start of the selected range still sees the returns before it;
/// the date range only restricts what is shown and counted.
pub fn recompute(config: &ChartConfig, history: &PriceHistory) -> ChartView {
    let returns = compute_returns(&history.prices, config.period);

    let stats = match config.sigma_mode {
        SigmaMode::Full => compute_stats_full_sample(&returns),
        SigmaMode::Rolling => compute_stats_rolling(&returns, config.window),
    };

    let data = filter_range(&stats.data, config.start_date, config.end_date);
    let signals = count_signals(&data, config.threshold);
    let signal_list = list_signals(&data, config.threshold);
    let clipped = count_clipped(&data, CLIP_SCALE);

    tracing::debug!(
        ticker = %config.ticker,
        period = %config.period,
        mode = %config.sigma_mode,
        returns = returns.len(),
        in_range = data.len(),
        signals = signals.count,
        "Recomputed deviation chart"
    );

    ChartView {
        config: config.clone(),
        name: history.name.clone(),
        currency: history.currency.clone(),
        mean: stats.mean,
        std: stats.std,
        total_returns: returns.len(),
        empty_range: data.is_empty(),
        data,
        signals,
        signal_list,
        clipped,
    }
}
