use crate::constants::{DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::error::{AppError, Result};
use crate::models::{ReturnPeriod, SigmaMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything that determines one deviation chart
///
/// A control change never mutates a live config: each `with_*` call
/// consumes the value and returns the next one, which is then handed to
/// [`crate::analysis::recompute`] in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub ticker: String,
    pub period: ReturnPeriod,
    pub threshold: f64,
    pub sigma_mode: SigmaMode,
    pub window: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ChartConfig {
    /// Config with defaults for everything but the ticker
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            period: ReturnPeriod::default(),
            threshold: DEFAULT_THRESHOLD,
            sigma_mode: SigmaMode::default(),
            window: DEFAULT_WINDOW,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_period(self, period: ReturnPeriod) -> Self {
        Self { period, ..self }
    }

    pub fn with_threshold(self, threshold: f64) -> Self {
        Self { threshold, ..self }
    }

    pub fn with_sigma_mode(self, sigma_mode: SigmaMode) -> Self {
        Self { sigma_mode, ..self }
    }

    pub fn with_window(self, window: usize) -> Self {
        Self { window, ..self }
    }

    pub fn with_range(self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            ..self
        }
    }

    /// Switching ticker keeps every other control as-is
    pub fn with_ticker(self, ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            ..self
        }
    }

    /// Reject values the engine cannot chart
    pub fn validate(&self) -> Result<()> {
        if self.ticker.is_empty() {
            return Err(AppError::InvalidInput("ticker must not be empty".to_string()));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        if self.window == 0 {
            return Err(AppError::InvalidInput("window must be at least 1".to_string()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::InvalidInput(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }
}
