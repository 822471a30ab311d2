use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close
///
/// Points built through [`PricePoint::new`] or [`normalize_prices`] have a
/// finite, strictly positive `close`; every loader goes through one of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Calendar date, serialized as YYYY-MM-DD
    pub date: NaiveDate,

    /// Closing price in quote currency
    pub close: f64,
}

impl PricePoint {
    /// Build a point, rejecting missing-equivalent closes (NaN, inf, <= 0)
    pub fn new(date: NaiveDate, close: f64) -> Option<Self> {
        if close.is_finite() && close > 0.0 {
            Some(Self { date, close })
        } else {
            None
        }
    }
}

/// Close-price history for one ticker, as served by `/api/history/{ticker}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub name: Option<String>,
    pub prices: Vec<PricePoint>,
}

impl PriceHistory {
    /// History with no metadata
    pub fn new(ticker: impl Into<String>, prices: Vec<PricePoint>) -> Self {
        Self {
            ticker: ticker.into(),
            currency: None,
            exchange: None,
            name: None,
            prices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// First and last date covered, if any
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.prices.first(), self.prices.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

/// Turn raw (date, close) rows into a clean ascending series
///
/// Missing and invalid closes are dropped, rows are sorted by date and the
/// last row wins for a repeated date. Returns the series and the number of
/// rows discarded.
pub fn normalize_prices(raw: Vec<(NaiveDate, Option<f64>)>) -> (Vec<PricePoint>, usize) {
    let raw_len = raw.len();

    let mut points: Vec<PricePoint> = raw
        .into_iter()
        .filter_map(|(date, close)| close.and_then(|c| PricePoint::new(date, c)))
        .collect();

    // Stable sort keeps upstream order among equal dates
    points.sort_by_key(|p| p.date);

    // Keep only the last occurrence of each date
    points.reverse();
    let mut seen = std::collections::HashSet::new();
    points.retain(|p| seen.insert(p.date));
    points.reverse();

    let dropped = raw_len - points.len();
    (points, dropped)
}
