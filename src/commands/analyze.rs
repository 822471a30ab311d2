use crate::analysis::{recompute, ChartView};
use crate::error::{AppError, Result};
use crate::models::{ChartConfig, NormalizedPoint};
use crate::services::{
    HistoryRange, HistorySource, LoadOutcome, PriceSeriesLoader, ProxyClient, UpstreamClient,
};
use crate::utils::get_upstream_base_url;
use chrono::Utc;
use std::io::Write;

/// How `analyze` prints its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub async fn run(config: ChartConfig, proxy: Option<String>, format: OutputFormat, limit: usize) {
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let result = match proxy {
        Some(url) => match ProxyClient::new(url) {
            Ok(client) => analyze(client, &config).await,
            Err(e) => Err(e),
        },
        None => match UpstreamClient::new(get_upstream_base_url()) {
            Ok(client) => analyze(client, &config).await,
            Err(e) => Err(e.into()),
        },
    };

    let view = match result {
        Ok(view) => view.truncate_signals(limit),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let printed = match format {
        OutputFormat::Table => {
            print!("{}", render_table(&view));
            Ok(())
        }
        OutputFormat::Json => serde_json::to_string_pretty(&view)
            .map(|json| println!("{}", json))
            .map_err(Into::into),
        OutputFormat::Csv => write_csv(&view, std::io::stdout().lock()),
    };

    if let Err(e) = printed {
        eprintln!("❌ Failed to write output: {}", e);
        std::process::exit(1);
    }
}

/// Load the configured ticker through `source` and compute its chart
async fn analyze<S: HistorySource>(source: S, config: &ChartConfig) -> Result<ChartView> {
    let loader = PriceSeriesLoader::new(source);
    let range = HistoryRange::covering(config);

    let series = match loader.load(&config.ticker, &range).await {
        Ok(LoadOutcome::Current(series)) => series,
        Ok(LoadOutcome::Superseded { ticker, .. }) => {
            return Err(AppError::Other(format!(
                "Load for {} was superseded",
                ticker
            )))
        }
        // Only the ticker reaches the user; the cause was logged by the loader
        Err(e) => return Err(AppError::Other(e.to_string())),
    };

    tracing::debug!(
        ticker = %config.ticker,
        points = series.history.prices.len(),
        age_ms = (Utc::now() - series.loaded_at).num_milliseconds(),
        "Series ready"
    );

    Ok(recompute(config, &series.history))
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

fn signal_row(point: &NormalizedPoint) -> String {
    format!(
        "   {}  {:>+9.2}%  {:>+7.2}σ\n",
        point.date,
        point.ret * 100.0,
        point.z
    )
}

/// Human-readable summary plus the top signal table
pub fn render_table(view: &ChartView) -> String {
    let config = &view.config;
    let mut out = String::new();

    let title = match &view.name {
        Some(name) => format!("{} ({})", config.ticker, name),
        None => config.ticker.clone(),
    };
    out.push_str(&format!("📈 {}\n", title));
    out.push_str(&format!(
        "   Period: {}  Mode: {}  Window: {}  Threshold: {}σ\n",
        config.period, config.sigma_mode, config.window, config.threshold
    ));
    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        out.push_str(&format!("   Range: {} → {}\n", start, end));
    }

    if view.empty_range {
        out.push_str("⚠️  No data in the selected range\n");
        return out;
    }

    out.push_str(&format!(
        "   Mean: {:+.4}%  Std: {:.4}%  Returns: {}\n",
        view.mean * 100.0,
        view.std * 100.0,
        view.data.len()
    ));
    out.push_str(&format!(
        "🔔 Signals: {} ({}% of points)\n",
        view.signals.count,
        view.signals.pct_label()
    ));
    if view.clipped > 0 {
        out.push_str(&format!("✂️  Clipped beyond display scale: {}\n", view.clipped));
    }

    if !view.signal_list.is_empty() {
        out.push_str("\n   Date        Return      Z\n");
        for point in &view.signal_list {
            out.push_str(&signal_row(point));
        }
    }

    out
}

/// One CSV row per in-range point
pub fn write_csv<W: Write>(view: &ChartView, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "ret", "z", "local_mean", "local_std"])?;

    for point in &view.data {
        wtr.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            format!("{:.6}", point.ret),
            format!("{:.4}", point.z),
            format_opt(point.local_mean),
            format_opt(point.local_std),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
