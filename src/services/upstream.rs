use crate::constants::{
    DEFAULT_HISTORY_YEARS, DEFAULT_INTERVAL, SEARCH_MAX_RESULTS, UPSTREAM_TIMEOUT_SECS,
};
use crate::models::{normalize_prices, ChartConfig, PriceHistory, SigmaMode};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

/// Calendar slack added to the warm-up span for holidays
const WARMUP_PADDING_DAYS: i64 = 10;

#[derive(Debug)]
pub enum UpstreamError {
    Http(reqwest::Error),
    Serialization(serde_json::Error),
    /// Upstream answered with a non-success status
    Status { status: u16, message: String },
    InvalidResponse(String),
    InvalidUrl(String),
    NoData,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        UpstreamError::Http(error)
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(error: serde_json::Error) -> Self {
        UpstreamError::Serialization(error)
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamError::Http(e) => write!(f, "HTTP error: {}", e),
            UpstreamError::Serialization(e) => write!(f, "Serialization error: {}", e),
            UpstreamError::Status { status, message } => {
                write!(f, "Upstream status {}: {}", status, message)
            }
            UpstreamError::InvalidResponse(s) => write!(f, "Invalid response: {}", s),
            UpstreamError::InvalidUrl(s) => write!(f, "Invalid URL: {}", s),
            UpstreamError::NoData => write!(f, "No data available"),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpstreamError::Http(e) => Some(e),
            UpstreamError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UpstreamError> for crate::error::AppError {
    fn from(error: UpstreamError) -> Self {
        use crate::error::AppError;
        match error {
            UpstreamError::Http(e) => AppError::Network(e.to_string()),
            UpstreamError::Serialization(e) => AppError::Parse(e.to_string()),
            UpstreamError::Status { status, message } => AppError::Upstream { status, message },
            UpstreamError::InvalidResponse(s) => AppError::Parse(s),
            UpstreamError::InvalidUrl(s) => AppError::Config(s),
            UpstreamError::NoData => AppError::NotFound("no result payload".to_string()),
        }
    }
}

/// Time window for a history request, in unix seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRange {
    pub period1: i64,
    pub period2: i64,
    pub interval: String,
}

impl HistoryRange {
    /// Trailing `years` up to now at daily bars
    pub fn trailing_years(years: i64) -> Self {
        Self::trailing_years_from(Utc::now(), years)
    }

    fn trailing_years_from(now: DateTime<Utc>, years: i64) -> Self {
        let start = now - ChronoDuration::days(365 * years);
        Self {
            period1: start.timestamp(),
            period2: now.timestamp(),
            interval: DEFAULT_INTERVAL.to_string(),
        }
    }

    /// Range wide enough to chart `config`
    ///
    /// Starts at the earlier of the default trailing span and the configured
    /// start date minus a warm-up margin (one return step, plus the rolling
    /// window when in rolling mode), and always runs up to now so the
    /// full-sample statistics cover the whole fetched history.
    pub fn covering(config: &ChartConfig) -> Self {
        Self::covering_from(Utc::now(), config)
    }

    fn covering_from(now: DateTime<Utc>, config: &ChartConfig) -> Self {
        let mut range = Self::trailing_years_from(now, DEFAULT_HISTORY_YEARS);

        if let Some(start) = config.start_date {
            let step = config.period.step();
            let warmup_rows = match config.sigma_mode {
                SigmaMode::Full => step,
                SigmaMode::Rolling => step + config.window.max(1) * step,
            };
            // Rows are trading days; pad for weekends and holidays
            let warmup_days = (warmup_rows as i64 * 7 + 4) / 5 + WARMUP_PADDING_DAYS;
            let first = (start - ChronoDuration::days(warmup_days))
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp());
            if let Some(first) = first {
                range.period1 = range.period1.min(first);
            }
        }

        if let Some(end) = config.end_date {
            let last = (end + ChronoDuration::days(1))
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp());
            if let Some(last) = last {
                range.period2 = range.period2.max(last);
            }
        }

        range
    }

    /// Default range with any provided field overriding it
    pub fn with_overrides(period1: Option<i64>, period2: Option<i64>, interval: Option<String>) -> Self {
        let default = Self::default();
        Self {
            period1: period1.unwrap_or(default.period1),
            period2: period2.unwrap_or(default.period2),
            interval: interval
                .filter(|i| !i.trim().is_empty())
                .unwrap_or(default.interval),
        }
    }
}

impl Default for HistoryRange {
    fn default() -> Self {
        Self::trailing_years(DEFAULT_HISTORY_YEARS)
    }
}

/// One row of `/api/search/{query}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuote {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub quote_type: String,
    pub exchange: String,
}

/// HTTP client for the upstream financial-data API (Yahoo Finance shaped)
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    user_agents: Vec<String>,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(UpstreamError::InvalidUrl(format!(
                "base_url must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(StdDuration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        info!(base_url = %base_url, "Created UpstreamClient");

        Ok(Self {
            client,
            base_url,
            user_agents,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_user_agent(&self) -> &str {
        use rand::seq::SliceRandom;
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or("Mozilla/5.0")
    }

    /// Build `{base}/{prefix...}/{segment}` with `segment` percent-encoded
    fn endpoint(&self, prefix: &[&str], segment: Option<&str>) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty();
            segments.extend(prefix);
            if let Some(segment) = segment {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, UpstreamError> {
        debug!(url = %url, "Upstream request");

        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", self.get_user_agent())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = upstream_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("upstream request failed")
                    .to_string()
            });
            warn!(url = %url, status = status.as_u16(), message = %message, "Upstream returned error status");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a close series for `ticker` over `range`
    pub async fn fetch_history_range(
        &self,
        ticker: &str,
        range: &HistoryRange,
    ) -> Result<PriceHistory, UpstreamError> {
        let mut url = self.endpoint(&["v8", "finance", "chart"], Some(ticker))?;
        url.query_pairs_mut()
            .append_pair("period1", &range.period1.to_string())
            .append_pair("period2", &range.period2.to_string())
            .append_pair("interval", &range.interval);

        let json = self.get_json(url).await?;
        let history = parse_chart_response(ticker, &json)?;

        info!(ticker, points = history.prices.len(), "Fetched history from upstream");
        Ok(history)
    }

    /// Symbol search, quotes only, at most `SEARCH_MAX_RESULTS`
    pub async fn search_symbols(&self, query: &str) -> Result<Vec<SearchQuote>, UpstreamError> {
        let mut url = self.endpoint(&["v1", "finance", "search"], None)?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("quotesCount", &SEARCH_MAX_RESULTS.to_string())
            .append_pair("newsCount", "0");

        let json = self.get_json(url).await?;
        let quotes = parse_search_response(&json);

        debug!(query, results = quotes.len(), "Upstream search complete");
        Ok(quotes)
    }
}

/// Pull `{chart|finance}.error.description` out of an upstream error body
fn upstream_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    ["chart", "finance"].iter().find_map(|root| {
        json.get(root)
            .and_then(|r| r.get("error"))
            .and_then(|e| e.get("description").or_else(|| e.get("code")))
            .and_then(|d| d.as_str())
            .map(str::to_string)
    })
}

/// Reshape an upstream chart payload into a [`PriceHistory`]
///
/// Timestamps are shifted by the exchange's `gmtoffset` before taking the
/// calendar date. Null or invalid closes are dropped.
pub fn parse_chart_response(ticker: &str, json: &Value) -> Result<PriceHistory, UpstreamError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| UpstreamError::InvalidResponse("missing 'chart' field".to_string()))?;

    let result = match chart.get("result").and_then(|r| r.as_array()).and_then(|r| r.first()) {
        Some(result) => result,
        None => return Err(UpstreamError::NoData),
    };

    let meta = result.get("meta");
    let meta_str = |key: &str| {
        meta.and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let gmt_offset = meta
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    let timestamps: Vec<Option<i64>> = result
        .get("timestamp")
        .and_then(|t| t.as_array())
        .map(|arr| arr.iter().map(|v| v.as_i64()).collect())
        .unwrap_or_default();

    let closes: Vec<Option<f64>> = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .map(|arr| arr.iter().map(|v| v.as_f64()).collect())
        .unwrap_or_default();

    if !timestamps.is_empty() && closes.len() != timestamps.len() {
        return Err(UpstreamError::InvalidResponse(format!(
            "{} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        )));
    }

    let raw: Vec<(NaiveDate, Option<f64>)> = timestamps
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::<Utc>::from_timestamp(ts? + gmt_offset, 0)?.date_naive();
            Some((date, close))
        })
        .collect();

    let (prices, dropped) = normalize_prices(raw);
    if dropped > 0 {
        debug!(ticker, dropped, "Dropped missing closes");
    }

    Ok(PriceHistory {
        ticker: meta_str("symbol").unwrap_or_else(|| ticker.to_uppercase()),
        currency: meta_str("currency"),
        exchange: meta_str("fullExchangeName").or_else(|| meta_str("exchangeName")),
        name: meta_str("longName").or_else(|| meta_str("shortName")),
        prices,
    })
}

/// Reshape an upstream search payload, keeping quotes with a symbol
pub fn parse_search_response(json: &Value) -> Vec<SearchQuote> {
    let quotes = match json.get("quotes").and_then(|q| q.as_array()) {
        Some(quotes) => quotes,
        None => return Vec::new(),
    };

    quotes
        .iter()
        .filter_map(|q| {
            let field = |key: &str| {
                q.get(key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            let symbol = field("symbol")?;
            Some(SearchQuote {
                name: field("longname")
                    .or_else(|| field("shortname"))
                    .unwrap_or_else(|| symbol.clone()),
                quote_type: field("quoteType").unwrap_or_default(),
                exchange: field("exchDisp").or_else(|| field("exchange")).unwrap_or_default(),
                symbol,
            })
        })
        .take(SEARCH_MAX_RESULTS)
        .collect()
}

/// Map an upstream failure to the HTTP status the proxy answers with
pub fn status_for(error: &UpstreamError) -> StatusCode {
    match error {
        UpstreamError::Status { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        UpstreamError::NoData => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::models::ReturnPeriod;

    fn chart_fixture() -> Value {
        json!({
            "chart": {
                "result": [{
                    "meta": {
                        "currency": "USD",
                        "symbol": "AAPL",
                        "exchangeName": "NMS",
                        "fullExchangeName": "NasdaqGS",
                        "longName": "Apple Inc.",
                        "shortName": "Apple",
                        "gmtoffset": -14400
                    },
                    // 13:30 UTC on each day = 09:30 New York
                    "timestamp": [1704202200, 1704288600, 1704375000, 1704461400],
                    "indicators": {
                        "quote": [{ "close": [185.64, null, 181.91, 181.18] }]
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_parse_chart_response() {
        let history = parse_chart_response("aapl", &chart_fixture()).unwrap();

        assert_eq!(history.ticker, "AAPL");
        assert_eq!(history.currency.as_deref(), Some("USD"));
        assert_eq!(history.exchange.as_deref(), Some("NasdaqGS"));
        assert_eq!(history.name.as_deref(), Some("Apple Inc."));

        // Null close dropped
        assert_eq!(history.prices.len(), 3);
        assert_eq!(history.prices[0].date.to_string(), "2024-01-02");
        assert_eq!(history.prices[1].date.to_string(), "2024-01-04");
        assert_eq!(history.prices[2].close, 181.18);
    }

    #[test]
    fn test_parse_chart_response_serializes_proxy_shape() {
        let history = parse_chart_response("AAPL", &chart_fixture()).unwrap();
        let json = serde_json::to_value(&history).unwrap();

        assert_eq!(json["ticker"], "AAPL");
        assert_eq!(json["prices"][0]["date"], "2024-01-02");
        assert_eq!(json["prices"][0]["close"], 185.64);
        assert!(json.get("currency").is_some());
        assert!(json.get("exchange").is_some());
        assert!(json.get("name").is_some());
    }

    #[test]
    fn test_parse_chart_response_no_result() {
        let json = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        assert!(matches!(parse_chart_response("ZZZZ", &json), Err(UpstreamError::NoData)));

        let empty = json!({ "chart": { "result": [] } });
        assert!(matches!(parse_chart_response("ZZZZ", &empty), Err(UpstreamError::NoData)));
    }

    #[test]
    fn test_parse_chart_response_malformed() {
        assert!(matches!(
            parse_chart_response("AAPL", &json!({ "foo": 1 })),
            Err(UpstreamError::InvalidResponse(_))
        ));

        let mismatched = json!({
            "chart": { "result": [{
                "timestamp": [1704202200, 1704288600],
                "indicators": { "quote": [{ "close": [1.0] }] }
            }]}
        });
        assert!(matches!(
            parse_chart_response("AAPL", &mismatched),
            Err(UpstreamError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_chart_response_without_timestamps_is_empty() {
        let json = json!({
            "chart": { "result": [{ "meta": { "symbol": "NEW" }, "indicators": { "quote": [{}] } }] }
        });
        let history = parse_chart_response("NEW", &json).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.currency, None);
    }

    #[test]
    fn test_parse_search_response() {
        let json = json!({
            "quotes": [
                { "symbol": "AAPL", "longname": "Apple Inc.", "shortname": "Apple", "quoteType": "EQUITY", "exchange": "NMS", "exchDisp": "NASDAQ" },
                { "symbol": "APLE", "shortname": "Apple Hospitality", "quoteType": "EQUITY", "exchange": "NYQ" },
                { "longname": "No symbol here" }
            ],
            "news": [{ "title": "ignored" }]
        });

        let quotes = parse_search_response(&json);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].name, "Apple Inc.");
        assert_eq!(quotes[0].exchange, "NASDAQ");
        assert_eq!(quotes[1].name, "Apple Hospitality");
        assert_eq!(quotes[1].exchange, "NYQ");

        let as_json = serde_json::to_value(&quotes[0]).unwrap();
        assert_eq!(as_json["type"], "EQUITY");
    }

    #[test]
    fn test_parse_search_response_caps_results() {
        let quotes: Vec<Value> = (0..20)
            .map(|i| json!({ "symbol": format!("T{}", i), "quoteType": "EQUITY" }))
            .collect();
        let parsed = parse_search_response(&json!({ "quotes": quotes }));
        assert_eq!(parsed.len(), SEARCH_MAX_RESULTS);
        assert!(parse_search_response(&json!({})).is_empty());
    }

    #[test]
    fn test_upstream_error_message() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert_eq!(upstream_error_message(body).as_deref(), Some("No data found"));
        assert_eq!(upstream_error_message("<html>"), None);
    }

    #[test]
    fn test_status_for() {
        let err = UpstreamError::Status { status: 429, message: "Too Many Requests".to_string() };
        assert_eq!(status_for(&err), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(&UpstreamError::NoData), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&UpstreamError::InvalidResponse("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_history_range_overrides() {
        let range = HistoryRange::with_overrides(Some(100), None, Some("1wk".to_string()));
        assert_eq!(range.period1, 100);
        assert_eq!(range.interval, "1wk");
        assert!(range.period2 > range.period1);

        let default = HistoryRange::with_overrides(None, None, Some("  ".to_string()));
        assert_eq!(default.interval, "1d");
        let span_days = (default.period2 - default.period1) / 86_400;
        assert_eq!(span_days, 365 * 3);
    }

    fn midnight(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn test_covering_range_without_dates_is_trailing_default() {
        let now = Utc::now();
        let config = ChartConfig::new("SPY");
        assert_eq!(
            HistoryRange::covering_from(now, &config),
            HistoryRange::trailing_years_from(now, DEFAULT_HISTORY_YEARS)
        );
    }

    #[test]
    fn test_covering_range_reaches_back_to_start_date() {
        let now = Utc::now();
        let config = ChartConfig::new("SPY").with_range(
            NaiveDate::from_ymd_opt(2010, 1, 1),
            NaiveDate::from_ymd_opt(2010, 12, 31),
        );
        let range = HistoryRange::covering_from(now, &config);

        // One daily step of warm-up: 2 calendar days plus padding
        assert_eq!(range.period1, midnight(2009, 12, 20));
        assert_eq!(range.period2, now.timestamp());
        assert!(range.period2 >= midnight(2011, 1, 1));
        assert_eq!(range.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_covering_range_includes_rolling_warmup() {
        let now = Utc::now();
        let config = ChartConfig::new("SPY")
            .with_period(ReturnPeriod::Weekly)
            .with_sigma_mode(SigmaMode::Rolling)
            .with_window(20)
            .with_range(
                NaiveDate::from_ymd_opt(2015, 6, 1),
                NaiveDate::from_ymd_opt(2015, 9, 30),
            );
        let range = HistoryRange::covering_from(now, &config);

        // (5 + 20 * 5) rows -> 147 calendar days + 10 padding
        let expected = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap() - ChronoDuration::days(157);
        assert_eq!(
            range.period1,
            expected.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
        );
    }

    #[test]
    fn test_covering_range_recent_start_keeps_default_span() {
        let now = Utc::now();
        let recent = (now - ChronoDuration::days(30)).date_naive();
        let config = ChartConfig::new("SPY").with_range(Some(recent), Some(now.date_naive()));
        let range = HistoryRange::covering_from(now, &config);

        assert_eq!(range.period1, HistoryRange::trailing_years_from(now, DEFAULT_HISTORY_YEARS).period1);
        // End date is today, so the range runs to tomorrow's midnight
        assert!(range.period2 >= now.timestamp());
    }

    #[test]
    fn test_endpoint_encodes_ticker() {
        let client = UpstreamClient::new("https://query1.example.com/").unwrap();
        let url = client.endpoint(&["v8", "finance", "chart"], Some("BRK/B")).unwrap();
        assert_eq!(url.as_str(), "https://query1.example.com/v8/finance/chart/BRK%2FB");

        assert!(UpstreamClient::new("ftp://nope").is_err());
    }
}
