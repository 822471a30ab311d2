use crate::constants::{DAILY_STEP, MONTHLY_STEP, WEEKLY_STEP};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Return period for the deviation chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnPeriod {
    /// Close-to-close over one trading day
    #[serde(alias = "1d", alias = "day")]
    Daily,
    /// Close-to-close over five trading days
    #[serde(alias = "1w", alias = "week")]
    Weekly,
    /// Close-to-close over twenty-one trading days
    #[serde(alias = "1mo", alias = "month")]
    Monthly,
}

impl Default for ReturnPeriod {
    fn default() -> Self {
        ReturnPeriod::Daily
    }
}

impl ReturnPeriod {
    /// Number of price rows between the two endpoints of one return
    pub fn step(&self) -> usize {
        match self {
            ReturnPeriod::Daily => DAILY_STEP,
            ReturnPeriod::Weekly => WEEKLY_STEP,
            ReturnPeriod::Monthly => MONTHLY_STEP,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "daily" | "day" | "1d" => Ok(ReturnPeriod::Daily),
            "weekly" | "week" | "1w" => Ok(ReturnPeriod::Weekly),
            "monthly" | "month" | "1mo" => Ok(ReturnPeriod::Monthly),
            _ => Err(format!(
                "Invalid period: '{}'. Valid values: daily, weekly, monthly",
                s
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnPeriod::Daily => "daily",
            ReturnPeriod::Weekly => "weekly",
            ReturnPeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
