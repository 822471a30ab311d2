pub mod debounce;
pub mod loader;
pub mod upstream;

pub use debounce::SearchDebouncer;
pub use loader::{
    HistorySource, LoadError, LoadOutcome, LoadedSeries, PriceSeriesLoader, ProxyClient,
    SearchSource,
};
pub use upstream::{status_for, HistoryRange, SearchQuote, UpstreamClient, UpstreamError};
