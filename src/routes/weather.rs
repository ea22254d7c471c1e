use axum::{extract::State, routing::get, Json, Router};
use tokio::sync::watch;
use tracing::debug;

use crate::WeatherStatus;

// ---

pub fn router() -> Router<watch::Receiver<WeatherStatus>> {
    // ---
    Router::new().route("/weather", get(handler))
}

/// Handle `GET /weather` with the status published by the last poll cycle.
async fn handler(State(status): State<watch::Receiver<WeatherStatus>>) -> Json<WeatherStatus> {
    // ---
    let current = status.borrow().clone();
    debug!("GET /weather - state {:?}", current.state);
    Json(current)
}
