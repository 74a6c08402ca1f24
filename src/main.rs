//! SOS Beacon - an in-memory coordination engine for disaster response.
//!
//! # Overview
//!
//! Serves the `/sos` coordination API and runs the rescue simulation ticker
//! in the background. State lives only for the process lifetime; a restart
//! starts from the seeded demo zones with no signals.
//!
//! # Configuration
//!
//! - `SOS_PORT`: listen port (default 3000)
//! - `SOS_TICK_MS`: simulation tick period in milliseconds (default 1000)
//! - `RUST_LOG`: tracing filter (default `sos_beacon=info`)

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sos_beacon::api::AppState;
use sos_beacon::store::IncidentStore;
use sos_beacon::ticker::Ticker;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default simulation tick period if not specified via environment variable.
const DEFAULT_TICK_MS: u64 = 1000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("sos_beacon=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("SOS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let tick_ms: u64 = env::var("SOS_TICK_MS")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_TICK_MS);

    info!(port, tick_ms, "Starting SOS Beacon server");

    // The single shared state owner: constructed once here, injected into
    // the handlers and the ticker, torn down at process exit.
    let store = IncidentStore::new();
    store.seed_demo_zones();
    info!("Incident store initialized with demo danger zones");

    // Start the rescue simulation loop
    let ticker = Ticker::spawn(store.clone(), Duration::from_millis(tick_ms));

    let state = AppState { store };
    let app = sos_beacon::api::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "SOS Beacon is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop-and-drain: no tick runs past this point.
    ticker.shutdown().await;
    info!("Simulation ticker stopped, shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
