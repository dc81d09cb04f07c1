//! Viewer Routes
//!
//! Endpoints:
//! - GET /book/:slug - Open a viewer session for a catalogued or derived book
//! - GET /book-viewer?file=&slug= - Open a viewer session from query parameters
//! - POST /api/v1/viewer/sessions - Open a viewer session from a JSON body
//! - GET /api/v1/viewer/sessions/:id - Session snapshot
//! - GET /api/v1/viewer/sessions/:id/pages - Rendered pages as data URIs
//! - GET /api/v1/viewer/sessions/:id/pages/:index - One page image
//! - POST /api/v1/viewer/sessions/:id/{next,prev,goto,flip} - Navigate
//! - POST /api/v1/viewer/sessions/:id/retry - Reload the book
//! - DELETE /api/v1/viewer/sessions/:id - Leave the viewer

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::resolver::BookRequest;
use crate::state::AppState;
use crate::viewer::{NavigationOutcome, SessionSnapshot, ViewerSession};

/// Create the viewer API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(close_session))
        .route("/sessions/:id/pages", get(list_pages))
        .route("/sessions/:id/pages/:index", get(get_page))
        .route("/sessions/:id/next", post(next_page))
        .route("/sessions/:id/prev", post(prev_page))
        .route("/sessions/:id/goto", post(goto_page))
        .route("/sessions/:id/flip", post(flip_completed))
        .route("/sessions/:id/retry", post(retry_session))
}

/// Viewer entry points
pub fn entry_router() -> Router<AppState> {
    Router::new()
        .route("/book/:slug", get(open_by_slug))
        .route("/book-viewer", get(open_by_query))
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenParams {
    pub slug: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    page: usize,
    placeholder: bool,
    width: u32,
    height: u32,
    content_type: &'static str,
    data_uri: String,
}

#[derive(Serialize)]
pub struct NavigationResponse {
    outcome: NavigationOutcome,
    session: SessionSnapshot,
}

async fn open(state: &AppState, params: OpenParams) -> Result<(StatusCode, Json<SessionSnapshot>)> {
    let request = BookRequest::from_params(params.slug, params.file)?;
    let session = state.sessions().open(request).await;
    Ok((StatusCode::CREATED, Json(session.snapshot())))
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<ViewerSession>> {
    state
        .sessions()
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Viewer session {} not found", id)))
}

/// GET /book/:slug
async fn open_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<SessionSnapshot>)> {
    open(
        &state,
        OpenParams {
            slug: Some(slug),
            file: None,
        },
    )
    .await
}

/// GET /book-viewer?file=<url>&slug=<slug>
async fn open_by_query(
    State(state): State<AppState>,
    Query(params): Query<OpenParams>,
) -> Result<(StatusCode, Json<SessionSnapshot>)> {
    open(&state, params).await
}

/// POST /api/v1/viewer/sessions
async fn create_session(
    State(state): State<AppState>,
    Json(params): Json<OpenParams>,
) -> Result<(StatusCode, Json<SessionSnapshot>)> {
    open(&state, params).await
}

/// GET /api/v1/viewer/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.snapshot()))
}

/// GET /api/v1/viewer/sessions/:id/pages
async fn list_pages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PageSummary>>> {
    let session = find_session(&state, id).await?;

    let pages = session
        .pages()
        .iter()
        .map(|page| PageSummary {
            page: page.page_number,
            placeholder: page.placeholder,
            width: page.width,
            height: page.height,
            content_type: page.content_type(),
            data_uri: page.data_uri(),
        })
        .collect();

    Ok(Json(pages))
}

/// GET /api/v1/viewer/sessions/:id/pages/:index
///
/// `index` is 0-based.
async fn get_page(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<impl IntoResponse> {
    let session = find_session(&state, id).await?;
    let page = session
        .page(index)
        .ok_or_else(|| AppError::NotFound(format!("Page {} not available", index)))?;

    Ok((
        [
            (header::CONTENT_TYPE, page.content_type()),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        page.data.as_ref().clone(),
    ))
}

async fn navigate<F>(state: &AppState, id: Uuid, f: F) -> Result<Json<NavigationResponse>>
where
    F: FnOnce(&ViewerSession) -> NavigationOutcome,
{
    let session = find_session(state, id).await?;
    let outcome = f(session.as_ref());
    Ok(Json(NavigationResponse {
        outcome,
        session: session.snapshot(),
    }))
}

/// POST /api/v1/viewer/sessions/:id/next
async fn next_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NavigationResponse>> {
    navigate(&state, id, ViewerSession::next).await
}

/// POST /api/v1/viewer/sessions/:id/prev
async fn prev_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NavigationResponse>> {
    navigate(&state, id, ViewerSession::prev).await
}

/// POST /api/v1/viewer/sessions/:id/goto
async fn goto_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(params): Json<PageParams>,
) -> Result<Json<NavigationResponse>> {
    navigate(&state, id, |session| session.goto(params.page)).await
}

/// POST /api/v1/viewer/sessions/:id/flip
///
/// Flip widget finished turning; `page` is where it landed.
async fn flip_completed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(params): Json<PageParams>,
) -> Result<Json<NavigationResponse>> {
    navigate(&state, id, |session| session.flip_completed(params.page)).await
}

/// POST /api/v1/viewer/sessions/:id/retry
async fn retry_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionSnapshot>)> {
    let session = find_session(&state, id).await?;
    if !session.retry().await {
        return Err(AppError::BadRequest(format!(
            "Viewer session {} has nothing to reload",
            id
        )));
    }
    Ok((StatusCode::ACCEPTED, Json(session.snapshot())))
}

/// DELETE /api/v1/viewer/sessions/:id
async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.sessions().close(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Viewer session {} not found", id)))
    }
}
