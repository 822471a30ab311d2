//! Engine and proxy constants
//!
//! ## Return stepping
//!
//! Periods are trading-day approximations, not calendar arithmetic:
//!
//! | Period  | Step (rows) |
//! |---------|-------------|
//! | daily   | 1           |
//! | weekly  | 5           |
//! | monthly | 21          |

/// Rows between the endpoints of a daily return
pub const DAILY_STEP: usize = 1;

/// Rows between the endpoints of a weekly return
pub const WEEKLY_STEP: usize = 5;

/// Rows between the endpoints of a monthly return
pub const MONTHLY_STEP: usize = 21;

/// Default trailing window for rolling normalization
pub const DEFAULT_WINDOW: usize = 60;

/// Default |z| at which a return counts as a signal
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Display ceiling for deviation bars; anything beyond is drawn clipped
pub const CLIP_SCALE: f64 = 5.0;

/// Cache-Control max-age for history responses (seconds)
pub const HISTORY_CACHE_MAX_AGE: u32 = 300;

/// Cache-Control max-age for search responses (seconds)
pub const SEARCH_CACHE_MAX_AGE: u32 = 3600;

/// Maximum quotes returned by the search endpoint
pub const SEARCH_MAX_RESULTS: usize = 8;

/// Default history span when no period1/period2 is given
pub const DEFAULT_HISTORY_YEARS: i64 = 3;

/// Default upstream bar interval
pub const DEFAULT_INTERVAL: &str = "1d";

/// Quiet period before a debounced search fires (milliseconds)
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Timeout applied to every upstream request (seconds)
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Default HTTP port for `serve`
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of signals listed by `analyze` and `/api/zscore`
pub const DEFAULT_SIGNAL_LIMIT: usize = 20;
