//! warmfleet-api — HTTP surface for warmfleet.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | Liveness, plain `OK` |
//! | POST | `/api/warm` | Run one warm cycle, return the summary |
//! | GET | `/*` | Static files from the public directory |
//!
//! `/api/warm` is meant to be hit by a scheduler (Cloud Scheduler every ten
//! minutes in production).

pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use warmfleet_probe::Warmer;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub warmer: Arc<Warmer>,
}

/// Build the complete router (API + health + static files).
pub fn build_router(warmer: Arc<Warmer>, public_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route("/warm", post(handlers::warm))
        .with_state(ApiState { warmer });

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
}
