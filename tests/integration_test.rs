use std::net::SocketAddr;

use anyhow::Result;
use axum::{http::StatusCode, routing::get, Router};
use cloudwatcher_solo::{
    routes, CloudwatcherSolo, HttpFetcher, ParameterRegistry, PropertyState, ReportSource,
    TransportError, WeatherStatus,
};
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};

const REPORT: &str = "dataGMTTime=2023-01-01 00:00:00\n\
    cwinfo=AAG v1\n\
    clouds=-10.5\n\
    temp=5.2\n\
    lightmpsas=19.3\n\
    wind=12\n\
    safe=1\n\
    switch=0\n";

/// Serve `app` on an ephemeral local port and return its address.
async fn serve(app: Router) -> Result<SocketAddr> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(addr)
}

fn station() -> Router {
    // ---
    Router::new()
        .route("/cgi-bin/cgiLastData", get(|| async { REPORT }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
        )
}

#[tokio::test]
async fn fetcher_returns_report_body() -> Result<()> {
    // ---
    let addr = serve(station()).await?;
    let url = format!("http://{}/cgi-bin/cgiLastData", addr);

    let body = assert_ok!(HttpFetcher::new().fetch(&url).await);
    assert_eq!(body, REPORT);

    Ok(())
}

#[tokio::test]
async fn fetcher_rejects_error_status() -> Result<()> {
    // ---
    let addr = serve(station()).await?;
    let url = format!("http://{}/broken", addr);

    let err = assert_err!(HttpFetcher::new().fetch(&url).await);
    assert!(
        matches!(err, TransportError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR),
        "unexpected error: {err}"
    );

    Ok(())
}

#[tokio::test]
async fn fetcher_rejects_malformed_url() {
    // ---
    let err = assert_err!(HttpFetcher::new().fetch("not a url").await);
    assert!(matches!(err, TransportError::InvalidUrl { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn fetcher_reports_unreachable_host() -> Result<()> {
    // ---
    // Bind then drop to get a local port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let err = assert_err!(HttpFetcher::new().fetch(&format!("http://{}/", addr)).await);
    assert!(matches!(err, TransportError::Request(_)), "unexpected error: {err}");

    Ok(())
}

#[tokio::test]
async fn driver_publishes_station_report_over_http() -> Result<()> {
    // ---
    let addr = serve(station()).await?;
    let mut driver = CloudwatcherSolo::new(
        HttpFetcher::new(),
        ParameterRegistry::in_memory("Cloudwatcher Solo"),
    );
    driver.set_address(&format!("http://{}/cgi-bin/cgiLastData", addr))?;
    driver.initialize().await?;
    driver.connect().await?;

    assert_eq!(driver.update_weather().await, PropertyState::Ok);

    let (_tx, rx) = watch::channel(driver.host().status());
    let status_addr = serve(routes::router(rx)).await?;

    let client = reqwest::Client::new();
    let status: serde_json::Value = client
        .get(format!("http://{}/weather", status_addr))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(status["device"], "Cloudwatcher Solo");
    // clouds=-10.5 is above the sky temperature OK range
    assert_eq!(status["state"], "alert");

    let names: Vec<&str> = status["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "WEATHER_SAFE",
            "WEATHER_SWITCH",
            "WEATHER_SKYTEMP",
            "WEATHER_TEMP",
            "WEATHER_SKY_QUALITY",
            "WEATHER_WIND"
        ]
    );

    let health: serde_json::Value = client
        .get(format!("http://{}/health", status_addr))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn weather_route_serves_empty_status_before_first_poll() -> Result<()> {
    // ---
    let (_tx, rx) = watch::channel(WeatherStatus::empty("Cloudwatcher Solo"));
    let addr = serve(routes::router(rx)).await?;

    let status: serde_json::Value = reqwest::get(format!("http://{}/weather", addr))
        .await?
        .json()
        .await?;

    assert_eq!(status["state"], "idle");
    assert!(status["updated_at"].is_null());
    assert!(status["parameters"].as_array().unwrap().is_empty());

    Ok(())
}
