//! Application entry point for the `cloudwatcher-solo` service.
//!
//! This binary hosts the Cloudwatcher driver on its own, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the in-process parameter registry and its settings file
//! - Initializing and connecting the driver (both fatal on failure)
//! - Polling the station on a fixed period and publishing the status
//! - Serving `/weather` and `/health` over HTTP
//!
//! # Environment Variables
//! - `CWS_ADDRESS` (optional) – station report URL, persisted when set
//! - `CWS_CONFIG_PATH` (optional) – settings file (default: `cloudwatcher.json`)
//! - `CWS_POLL_SECS` (optional) – poll period in seconds (default: 60)
//! - `CWS_LISTEN_PORT` (optional) – status server port (default: 8080)
//! - `CWS_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `CWS_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context as _, Result};
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tokio::sync::watch;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use cloudwatcher_solo::device::{DEFAULT_NAME, DRIVER_VERSION};
use cloudwatcher_solo::{
    config, routes, CloudwatcherSolo, HttpFetcher, ParameterRegistry, PropertyState, WeatherStatus,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!(
        "Starting {} driver v{}.{}",
        DEFAULT_NAME,
        DRIVER_VERSION.0,
        DRIVER_VERSION.1
    );

    let registry = ParameterRegistry::with_config_file(DEFAULT_NAME, &cfg.config_path)?;
    let mut driver = CloudwatcherSolo::new(HttpFetcher::new(), registry);

    if let Some(address) = &cfg.address {
        driver
            .set_address(address)
            .context("failed to apply CWS_ADDRESS")?;
    }

    driver
        .initialize()
        .await
        .context("failed to initialize Cloudwatcher driver")?;
    driver
        .connect()
        .await
        .context("failed to connect to Cloudwatcher")?;

    let (status_tx, status_rx) = watch::channel(WeatherStatus::empty(DEFAULT_NAME));
    status_tx.send_replace(driver.host().status());

    let app: Router = routes::router(status_rx);
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Status server stopped: {}", e);
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(u64::from(cfg.poll_secs)));
    // First tick fires immediately; connect already polled once.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = driver.update_weather().await;
                if state == PropertyState::Alert {
                    tracing::warn!("Poll cycle failed, keeping last published values");
                }
                let status = driver.host().status();
                tracing::info!("Weather state: {:?}", status.state);
                status_tx.send_replace(status);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    driver.disconnect();
    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `CWS_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `CWS_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("CWS_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to CWS_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("CWS_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
