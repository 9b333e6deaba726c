//! The HTTP surface (spec.md §6): three routes over shared [`AppState`].

use crate::handlers::{crawl, health, scrape};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/scrape", post(scrape::scrape))
        .route("/crawl", post(crawl::crawl))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
