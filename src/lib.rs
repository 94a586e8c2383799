//! Rate-limited gateway in front of the OpenWeather current-weather API.
//!
//! Every `/weather` call goes through admission control before anything is
//! sent upstream: a global daily quota, an optional bearer-token allow-list
//! and a per-caller sliding-window rate limit. Successful lookups are
//! appended to a sled-backed usage log that can be listed and searched.

pub mod admission;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod history;
pub mod metrics;
pub mod models;
pub mod quota;
pub mod rate_limit;
pub mod state;
pub mod upstream;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::handlers::{
    health_handler, history_handler, metrics_handler, root_handler, search_handler,
    weather_handler,
};
use crate::state::AppState;

pub use crate::config::{Args, GatewayConfig};
pub use crate::error::GatewayError;
pub use crate::gateway::{Gateway, WeatherRequest};

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/weather", get(weather_handler))
        .route("/history", get(history_handler))
        .route("/history/search", get(search_handler))
        .with_state(state)
}
