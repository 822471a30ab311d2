//! Normalization mode for z-scores
//!
//! Determines which mean/std each return is measured against.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigmaMode {
    /// One mean/std over the whole return series (default)
    #[serde(alias = "full_sample", alias = "fullsample")]
    Full,

    /// Mean/std from a trailing window of prior returns
    #[serde(alias = "window")]
    Rolling,
}

impl Default for SigmaMode {
    fn default() -> Self {
        SigmaMode::Full
    }
}

impl SigmaMode {
    /// Parse from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "full" | "full_sample" | "fullsample" => Ok(SigmaMode::Full),
            "rolling" | "window" => Ok(SigmaMode::Rolling),
            _ => Err(format!("Invalid sigma mode: '{}'. Valid values: full, rolling", s)),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SigmaMode::Full => "full",
            SigmaMode::Rolling => "rolling",
        }
    }
}

impl fmt::Display for SigmaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
