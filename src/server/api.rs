use crate::constants::{HISTORY_CACHE_MAX_AGE, SEARCH_CACHE_MAX_AGE};
use crate::server::SharedUpstream;
use crate::services::{status_for, HistoryRange, UpstreamError};
use axum::{
    extract::{Path, Query, State},
    http::{header::CACHE_CONTROL, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Query parameters for /api/history/{ticker}
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    /// Range start, unix seconds
    pub period1: Option<i64>,
    /// Range end, unix seconds
    pub period2: Option<i64>,
    /// Bar interval, e.g. 1d
    pub interval: Option<String>,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub(crate) fn upstream_error_response(error: &UpstreamError) -> Response {
    error_response(status_for(error), error.to_string())
}

fn cache_headers(max_age: u32) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(&format!("max-age={}", max_age))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache")),
    );
    headers
}

/// GET /api/history - no ticker given
pub async fn missing_ticker_handler() -> Response {
    error_response(StatusCode::BAD_REQUEST, "Ticker is required")
}

/// GET /api/history/{ticker} - daily closes reshaped from the upstream chart API
///
/// Examples:
/// - /api/history/AAPL (trailing 3 years, daily)
/// - /api/history/SPY?period1=1609459200&period2=1640995200
/// - /api/history/BTC-USD?interval=1wk
#[instrument(skip(upstream))]
pub async fn history_handler(
    State(upstream): State<SharedUpstream>,
    Path(ticker): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Response {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return missing_ticker_handler().await;
    }

    let range = HistoryRange::with_overrides(params.period1, params.period2, params.interval);
    debug!(ticker = %ticker, ?range, "Fetching history");

    match upstream.fetch_history_range(&ticker, &range).await {
        Ok(history) => {
            info!(ticker = %ticker, points = history.prices.len(), "Returning history");
            (StatusCode::OK, cache_headers(HISTORY_CACHE_MAX_AGE), Json(history)).into_response()
        }
        Err(e) => {
            warn!(ticker = %ticker, error = %e, "History fetch failed");
            upstream_error_response(&e)
        }
    }
}

/// GET /api/search/{query} - symbol lookup, equities first, no news
#[instrument(skip(upstream))]
pub async fn search_handler(
    State(upstream): State<SharedUpstream>,
    Path(query): Path<String>,
) -> Response {
    match upstream.search_symbols(&query).await {
        Ok(quotes) => {
            debug!(query = %query, results = quotes.len(), "Returning search results");
            (StatusCode::OK, cache_headers(SEARCH_CACHE_MAX_AGE), Json(quotes)).into_response()
        }
        Err(e) => {
            warn!(query = %query, error = %e, "Search failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /health
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
