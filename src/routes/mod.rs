use axum::Router;
use tokio::sync::watch;

use crate::WeatherStatus;

mod health;
mod weather;

// ---

pub fn router(status: watch::Receiver<WeatherStatus>) -> Router {
    // ---
    Router::new()
        .merge(weather::router())
        .merge(health::router())
        .with_state(status)
}
