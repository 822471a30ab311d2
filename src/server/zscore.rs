use crate::analysis::recompute;
use crate::constants::{DEFAULT_SIGNAL_LIMIT, HISTORY_CACHE_MAX_AGE};
use crate::models::{ChartConfig, ReturnPeriod, SigmaMode};
use crate::server::api::{error_response, upstream_error_response};
use crate::server::SharedUpstream;
use crate::services::HistoryRange;
use crate::utils::parse_date;
use axum::{
    extract::{Path, Query, State},
    http::{header::CACHE_CONTROL, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Query parameters for /api/zscore/{ticker}
#[derive(Debug, Deserialize, Default)]
pub struct ZScoreQuery {
    /// daily (default), weekly, monthly
    pub period: Option<String>,
    /// full (default) or rolling
    pub mode: Option<String>,
    pub window: Option<usize>,
    pub threshold: Option<f64>,
    /// Start date filter (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// End date filter (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Max entries in the signal list
    pub limit: Option<usize>,
}

/// Turn raw query parameters into a validated config
pub fn parse_chart_config(ticker: &str, params: &ZScoreQuery) -> Result<ChartConfig, String> {
    let mut config = ChartConfig::new(ticker);

    if let Some(period) = params.period.as_deref() {
        config = config.with_period(ReturnPeriod::from_str(period)?);
    }
    if let Some(mode) = params.mode.as_deref() {
        config = config.with_sigma_mode(SigmaMode::from_str(mode)?);
    }
    if let Some(window) = params.window {
        config = config.with_window(window);
    }
    if let Some(threshold) = params.threshold {
        config = config.with_threshold(threshold);
    }

    let start = params.start_date.as_deref().map(parse_date).transpose()?;
    let end = params.end_date.as_deref().map(parse_date).transpose()?;
    config = config.with_range(start, end);

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// GET /api/zscore/{ticker} - deviation chart computed server-side
///
/// Examples:
/// - /api/zscore/SPY
/// - /api/zscore/SPY?period=weekly&threshold=1.5
/// - /api/zscore/AAPL?mode=rolling&window=20&start_date=2024-01-01&end_date=2024-06-30
#[instrument(skip(upstream))]
pub async fn zscore_handler(
    State(upstream): State<SharedUpstream>,
    Path(ticker): Path<String>,
    Query(params): Query<ZScoreQuery>,
) -> Response {
    let config = match parse_chart_config(&ticker, &params) {
        Ok(config) => config,
        Err(message) => {
            warn!(ticker = %ticker, error = %message, "Invalid zscore parameters");
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    let history = match upstream
        .fetch_history_range(&config.ticker, &HistoryRange::covering(&config))
        .await
    {
        Ok(history) => history,
        Err(e) => {
            warn!(ticker = %config.ticker, error = %e, "History fetch failed");
            return upstream_error_response(&e);
        }
    };

    let view = recompute(&config, &history)
        .truncate_signals(params.limit.unwrap_or(DEFAULT_SIGNAL_LIMIT));

    info!(
        ticker = %config.ticker,
        points = view.data.len(),
        signals = view.signals.count,
        "Returning zscore chart"
    );

    (
        StatusCode::OK,
        [(CACHE_CONTROL, format!("max-age={}", HISTORY_CACHE_MAX_AGE))],
        Json(view),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_defaults() {
        let config = parse_chart_config(" spy ", &ZScoreQuery::default()).unwrap();
        assert_eq!(config, ChartConfig::new("SPY"));
    }

    #[test]
    fn test_parse_all_fields() {
        let params = ZScoreQuery {
            period: Some("1w".to_string()),
            mode: Some("rolling".to_string()),
            window: Some(20),
            threshold: Some(1.5),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-06-30".to_string()),
            limit: Some(5),
        };
        let config = parse_chart_config("aapl", &params).unwrap();

        assert_eq!(config.ticker, "AAPL");
        assert_eq!(config.period, ReturnPeriod::Weekly);
        assert_eq!(config.sigma_mode, SigmaMode::Rolling);
        assert_eq!(config.window, 20);
        assert_eq!(config.threshold, 1.5);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        let bad = [
            ZScoreQuery { period: Some("hourly".to_string()), ..Default::default() },
            ZScoreQuery { mode: Some("ewma".to_string()), ..Default::default() },
            ZScoreQuery { window: Some(0), ..Default::default() },
            ZScoreQuery { threshold: Some(-1.0), ..Default::default() },
            ZScoreQuery { start_date: Some("01/02/2024".to_string()), ..Default::default() },
            ZScoreQuery {
                start_date: Some("2024-06-01".to_string()),
                end_date: Some("2024-01-01".to_string()),
                ..Default::default()
            },
        ];

        for params in &bad {
            assert!(parse_chart_config("SPY", params).is_err(), "{:?} should fail", params);
        }
    }
}
