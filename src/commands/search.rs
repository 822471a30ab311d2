use crate::constants::SEARCH_DEBOUNCE_MS;
use crate::error::Result;
use crate::services::{ProxyClient, SearchDebouncer, SearchQuote, SearchSource, UpstreamClient};
use crate::utils::get_upstream_base_url;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::warn;

pub async fn run(query: Option<String>, proxy: Option<String>, watch: bool) {
    let result = match proxy {
        Some(url) => match ProxyClient::new(url) {
            Ok(client) => dispatch(client, query, watch).await,
            Err(e) => Err(e),
        },
        None => match UpstreamClient::new(get_upstream_base_url()) {
            Ok(client) => dispatch(client, query, watch).await,
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("❌ Search failed: {}", e);
        std::process::exit(1);
    }
}

async fn dispatch<S>(source: S, query: Option<String>, watch: bool) -> Result<()>
where
    S: SearchSource + Send + Sync + 'static,
{
    if watch {
        return watch_stdin(source).await;
    }

    let query = query.unwrap_or_default();
    if query.trim().is_empty() {
        eprintln!("❌ A query is required unless --watch is given");
        std::process::exit(1);
    }

    let quotes = source.search(query.trim()).await?;
    print!("{}", render_quotes(query.trim(), &quotes));
    Ok(())
}

/// Read queries line by line, printing only results for the latest one
async fn watch_stdin<S>(source: S) -> Result<()>
where
    S: SearchSource + Send + Sync + 'static,
{
    println!("🔎 Type a query per line (Ctrl-D to quit)");

    let debouncer = Arc::new(SearchDebouncer::new(
        source,
        Duration::from_millis(SEARCH_DEBOUNCE_MS),
    ));
    watch_queries(debouncer, BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

/// Feed each line of `reader` to the debouncer and wait for the last one
///
/// Only the newest task is kept; older ones resolve to `None` once the next
/// line supersedes them. Returns the last line's outcome.
async fn watch_queries<S, R>(
    debouncer: Arc<SearchDebouncer<S>>,
    reader: R,
) -> Result<Option<Result<Vec<SearchQuote>>>>
where
    S: SearchSource + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut latest: Option<JoinHandle<Option<Result<Vec<SearchQuote>>>>> = None;

    while let Some(line) = lines.next_line().await? {
        let debouncer = debouncer.clone();
        latest = Some(tokio::spawn(async move {
            let outcome = debouncer.search(&line).await;
            match &outcome {
                Some(Ok(quotes)) => print!("{}", render_quotes(line.trim(), quotes)),
                Some(Err(e)) => eprintln!("⚠️  Search for '{}' failed: {}", line.trim(), e),
                None => {}
            }
            outcome
        }));
    }

    let Some(task) = latest else {
        return Ok(None);
    };
    match task.await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            warn!(error = %e, "Search task failed");
            Ok(None)
        }
    }
}

pub fn render_quotes(query: &str, quotes: &[SearchQuote]) -> String {
    if quotes.is_empty() {
        return format!("🤷 No matches for '{}'\n", query);
    }

    let mut out = format!("✅ {} match(es) for '{}'\n", quotes.len(), query);
    for quote in quotes {
        out.push_str(&format!(
            "   {:<12} {:<40} {:<10} {}\n",
            quote.symbol, quote.name, quote.quote_type, quote.exchange
        ));
    }
    out
}
