//! `GET /health` handler.

use crate::dto::HealthResponse;
use axum::Json;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
