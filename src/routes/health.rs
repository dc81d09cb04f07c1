//! Health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::catalog::{BookCatalog, SqliteCatalog};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalogued_books: Option<usize>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalogued_books = match SqliteCatalog::new(state.db().clone()).count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Catalog unavailable for health check: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions().len().await,
        catalogued_books,
    })
}
