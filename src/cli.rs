use clap::{Parser, Subcommand};

use crate::commands;
use crate::commands::analyze::OutputFormat;
use crate::constants::{DEFAULT_SIGNAL_LIMIT, DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::models::{ChartConfig, ReturnPeriod, SigmaMode};
use crate::utils::{get_port, parse_date};

#[derive(Parser)]
#[command(name = "sigmascope")]
#[command(about = "Return z-score deviation charts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the history proxy and analysis API
    Serve {
        /// Port to listen on (default: $PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Compute the deviation chart for one ticker
    Analyze {
        /// Ticker symbol, e.g. SPY
        ticker: String,

        /// Return period: daily, weekly, monthly
        #[arg(long, default_value = "daily", value_parser = ReturnPeriod::from_str)]
        period: ReturnPeriod,

        /// Sigma mode: full or rolling
        #[arg(long, default_value = "full", value_parser = SigmaMode::from_str)]
        mode: SigmaMode,

        /// Rolling window length in returns
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Signal threshold in standard deviations
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Start date filter (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start_date: Option<chrono::NaiveDate>,

        /// End date filter (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end_date: Option<chrono::NaiveDate>,

        /// Fetch through a running `sigmascope serve` instead of the upstream API
        #[arg(long)]
        proxy: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Max rows in the signal table
        #[arg(short, long, default_value_t = DEFAULT_SIGNAL_LIMIT)]
        limit: usize,
    },
    /// Look up ticker symbols
    Search {
        /// Free-text query, e.g. "apple"
        query: Option<String>,

        /// Fetch through a running `sigmascope serve` instead of the upstream API
        #[arg(long)]
        proxy: Option<String>,

        /// Read queries from stdin, debounced like a search box
        #[arg(long)]
        watch: bool,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port.unwrap_or_else(get_port)).await;
        }
        Commands::Analyze {
            ticker,
            period,
            mode,
            window,
            threshold,
            start_date,
            end_date,
            proxy,
            format,
            limit,
        } => {
            let config = ChartConfig::new(ticker)
                .with_period(period)
                .with_sigma_mode(mode)
                .with_window(window)
                .with_threshold(threshold)
                .with_range(start_date, end_date);
            commands::analyze::run(config, proxy, format, limit).await;
        }
        Commands::Search { query, proxy, watch } => {
            commands::search::run(query, proxy, watch).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_args() {
        let cli = Cli::try_parse_from([
            "sigmascope", "analyze", "spy", "--period", "weekly", "--mode", "rolling",
            "-w", "20", "--start-date", "2024-01-01", "--format", "csv",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze { ticker, period, mode, window, threshold, start_date, format, .. } => {
                assert_eq!(ticker, "spy");
                assert_eq!(period, ReturnPeriod::Weekly);
                assert_eq!(mode, SigmaMode::Rolling);
                assert_eq!(window, 20);
                assert_eq!(threshold, DEFAULT_THRESHOLD);
                assert_eq!(start_date, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(format, OutputFormat::Csv);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_period() {
        assert!(Cli::try_parse_from(["sigmascope", "analyze", "SPY", "--period", "hourly"]).is_err());
    }
}
