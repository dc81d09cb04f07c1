//! Route modules for the book viewer

pub mod health;
pub mod viewer;

use axum::{routing::get, Router};

use crate::state::AppState;

/// All routes, without middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .merge(viewer::entry_router())
        .nest("/api/v1/viewer", viewer::router())
        .with_state(state)
}
