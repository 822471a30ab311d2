pub mod api;
pub mod zscore;

use crate::error::{AppError, Result};
use crate::services::UpstreamClient;
use crate::utils::{get_cors_origins, get_public_dir, get_upstream_base_url};
use axum::{extract::FromRef, http::HeaderValue, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

pub type SharedUpstream = Arc<UpstreamClient>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub upstream: SharedUpstream,
}

impl FromRef<AppState> for SharedUpstream {
    fn from_ref(app_state: &AppState) -> SharedUpstream {
        app_state.upstream.clone()
    }
}

fn cors_layer() -> CorsLayer {
    cors_layer_for(&get_cors_origins())
}

/// `*` anywhere in the list allows any origin; otherwise an exact list
fn cors_layer_for(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers(Any)
}

/// Build the router with all routes, CORS and the static fallback
pub fn router(app_state: AppState) -> Router {
    let public_dir = get_public_dir();
    tracing::info!("Using public directory: {}", public_dir.display());

    Router::new()
        .route("/api/history", get(api::missing_ticker_handler))
        .route("/api/history/", get(api::missing_ticker_handler))
        .route("/api/history/{ticker}", get(api::history_handler))
        .route("/api/search/{query}", get(api::search_handler))
        .route("/api/zscore/{ticker}", get(zscore::zscore_handler))
        .route("/health", get(api::health_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors_layer())
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(port: u16) -> Result<()> {
    let base_url = get_upstream_base_url();
    tracing::info!(upstream = %base_url, "Starting sigmascope server");

    let upstream = UpstreamClient::new(base_url)?;
    let app_state = AppState {
        upstream: Arc::new(upstream),
    };

    tracing::info!("Registering routes:");
    tracing::info!("  GET /api/history/{{ticker}}?period1&period2&interval");
    tracing::info!("  GET /api/search/{{query}}");
    tracing::info!("  GET /api/zscore/{{ticker}}?period&mode&window&threshold&start_date&end_date&limit");
    tracing::info!("  GET /health");
    tracing::info!("  GET /* (static frontend)");

    let app = router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app).await?;

    Ok(())
}
