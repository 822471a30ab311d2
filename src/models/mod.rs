mod chart_config;
mod period;
mod price;
mod sigma_mode;
mod stats;

pub use chart_config::ChartConfig;
pub use period::ReturnPeriod;
pub use price::{normalize_prices, PriceHistory, PricePoint};
pub use sigma_mode::SigmaMode;
pub use stats::{NormalizedPoint, PeriodReturn, SignalCount, StatsResult};
