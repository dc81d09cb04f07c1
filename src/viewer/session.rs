//! Viewer sessions
//!
//! A session is one open viewer. It runs the resolve-then-rasterize
//! pipeline as a background task and exposes the navigator over the
//! rendered pages. Only one pipeline runs per session at a time; every
//! state update from the pipeline goes through [`SessionShared::update`],
//! which drops it once the session is unmounted or the run is cancelled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::DocumentReference;
use crate::raster::{DecodeProgress, PageImage, RasterOutcome, Rasterizer};
use crate::resolver::{AssetResolver, BookRequest};

use super::lifecycle::{CancellationToken, PipelineHandle};
use super::navigation::{ErrorView, NavigationMode, NavigationOutcome, Navigator, ViewerState};

/// Everything a pipeline run needs
#[derive(Clone)]
pub struct ViewerPipeline {
    pub resolver: AssetResolver,
    pub rasterizer: Rasterizer,
}

impl ViewerPipeline {
    pub fn new(resolver: AssetResolver, rasterizer: Rasterizer) -> Self {
        Self {
            resolver,
            rasterizer,
        }
    }
}

struct SessionShared {
    alive: bool,
    request: Option<BookRequest>,
    document: Option<DocumentReference>,
    pages: Vec<PageImage>,
    navigator: Navigator,
    updated_at: DateTime<Utc>,
}

impl SessionShared {
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a pipeline update unless the session is gone or the run was cancelled
    fn update<F>(state: &Mutex<SessionShared>, token: &CancellationToken, f: F) -> bool
    where
        F: FnOnce(&mut SessionShared),
    {
        let mut state = state.lock();
        if !state.alive || token.is_cancelled() {
            return false;
        }
        f(&mut state);
        state.touch();
        true
    }
}

/// Progress as shown in the loading state
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub completed_pages: usize,
    pub total_pages: usize,
    pub percent: u8,
}

impl From<DecodeProgress> for ProgressView {
    fn from(progress: DecodeProgress) -> Self {
        Self {
            completed_pages: progress.completed_pages,
            total_pages: progress.total_pages,
            percent: progress.percent(),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub status: &'static str,
    pub mode: NavigationMode,
    pub document: Option<DocumentReference>,
    pub progress: Option<ProgressView>,
    pub current_page: Option<usize>,
    pub total_pages: Option<usize>,
    pub page_label: Option<String>,
    pub error: Option<ErrorView>,
    pub updated_at: DateTime<Utc>,
}

pub struct ViewerSession {
    id: Uuid,
    pipeline: ViewerPipeline,
    state: Arc<Mutex<SessionShared>>,
    task: tokio::sync::Mutex<Option<PipelineHandle>>,
    /// Last time a client looked this session up
    last_seen: Mutex<Instant>,
}

impl ViewerSession {
    pub fn new(pipeline: ViewerPipeline, mode: NavigationMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline,
            state: Arc::new(Mutex::new(SessionShared {
                alive: true,
                request: None,
                document: None,
                pages: Vec::new(),
                navigator: Navigator::new(mode),
                updated_at: Utc::now(),
            })),
            task: tokio::sync::Mutex::new(None),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mark_seen(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Time since a client last used this session
    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    pub fn is_alive(&self) -> bool {
        self.state.lock().alive
    }

    /// Start loading `request`, tearing down any run already in flight
    ///
    /// Returns `false` when the session has been unmounted.
    pub async fn start(&self, request: BookRequest) -> bool {
        let mut task = self.task.lock().await;

        if let Some(previous) = task.take() {
            tracing::debug!(session_id = %self.id, "Cancelling previous pipeline run");
            previous.shutdown().await;
        }

        {
            let mut state = self.state.lock();
            if !state.alive {
                return false;
            }
            state.request = Some(request.clone());
            state.document = None;
            state.pages.clear();
            state.navigator.restart();
            state.touch();
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_pipeline(
            self.id,
            self.pipeline.clone(),
            self.state.clone(),
            request,
            token.clone(),
        ));
        *task = Some(PipelineHandle::new(token, handle));

        true
    }

    /// Reload the last request
    pub async fn retry(&self) -> bool {
        let request = self.state.lock().request.clone();
        match request {
            Some(request) => {
                tracing::info!(session_id = %self.id, "Retrying viewer session");
                self.start(request).await
            }
            None => false,
        }
    }

    /// Leave the viewer: no state changes are applied after this returns
    pub async fn unmount(&self) {
        {
            let mut state = self.state.lock();
            if !state.alive {
                return;
            }
            state.alive = false;
            state.navigator.unmount();
            state.pages.clear();
            state.touch();
        }

        if let Some(handle) = self.task.lock().await.take() {
            handle.shutdown().await;
        }

        tracing::debug!(session_id = %self.id, "Viewer session unmounted");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        let navigator = &state.navigator;

        let (progress, error) = match navigator.state() {
            ViewerState::Loading { progress } => (Some(ProgressView::from(*progress)), None),
            ViewerState::Ready { total_pages, .. } => (
                Some(ProgressView::from(DecodeProgress::new(*total_pages, *total_pages))),
                None,
            ),
            ViewerState::Failed(view) => (None, Some(view.clone())),
            ViewerState::Unmounted => (None, None),
        };

        SessionSnapshot {
            id: self.id,
            status: navigator.state().status(),
            mode: navigator.mode(),
            document: state.document.clone(),
            progress,
            current_page: navigator.current_page(),
            total_pages: navigator.total_pages(),
            page_label: navigator.page_label(),
            error,
            updated_at: state.updated_at,
        }
    }

    /// Rendered pages, empty until ready
    pub fn pages(&self) -> Vec<PageImage> {
        self.state.lock().pages.clone()
    }

    /// One page (0-based)
    pub fn page(&self, index: usize) -> Option<PageImage> {
        self.state.lock().pages.get(index).cloned()
    }

    pub fn next(&self) -> NavigationOutcome {
        self.navigate(Navigator::next)
    }

    pub fn prev(&self) -> NavigationOutcome {
        self.navigate(Navigator::prev)
    }

    pub fn goto(&self, page: usize) -> NavigationOutcome {
        self.navigate(|nav| nav.goto(page))
    }

    pub fn flip_completed(&self, page: usize) -> NavigationOutcome {
        self.navigate(|nav| nav.flip_completed(page))
    }

    fn navigate<F>(&self, f: F) -> NavigationOutcome
    where
        F: FnOnce(&mut Navigator) -> NavigationOutcome,
    {
        let mut state = self.state.lock();
        let outcome = f(&mut state.navigator);
        if outcome != NavigationOutcome::Ignored {
            state.touch();
        }
        outcome
    }
}

async fn run_pipeline(
    session_id: Uuid,
    pipeline: ViewerPipeline,
    state: Arc<Mutex<SessionShared>>,
    request: BookRequest,
    token: CancellationToken,
) {
    let resolved = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        resolved = pipeline.resolver.resolve(&request) => resolved,
    };

    let reference = match resolved {
        Ok(reference) => reference,
        Err(e) => {
            tracing::warn!(session_id = %session_id, "Could not resolve book: {}", e);
            SessionShared::update(&state, &token, |s| {
                s.navigator.fail(&e);
            });
            return;
        }
    };

    let applied = SessionShared::update(&state, &token, |s| {
        s.document = Some(reference.clone());
    });
    if !applied {
        return;
    }

    tracing::info!(
        session_id = %session_id,
        slug = %reference.slug,
        url = %reference.source_url,
        "Rasterizing book"
    );

    let outcome = pipeline
        .rasterizer
        .rasterize(
            &reference.source_url,
            |progress| {
                SessionShared::update(&state, &token, |s| {
                    s.navigator.progress(progress);
                });
            },
            &token,
        )
        .await;

    match outcome {
        Ok(RasterOutcome::Complete(pages)) => {
            let total_pages = pages.len();
            let placeholders = pages.iter().filter(|p| p.placeholder).count();
            let applied = SessionShared::update(&state, &token, |s| {
                s.pages = pages;
                s.navigator.ready(total_pages);
            });
            if applied {
                tracing::info!(session_id = %session_id, total_pages, placeholders, "Book ready");
            }
        }
        Ok(RasterOutcome::Cancelled { partial }) => {
            tracing::debug!(
                session_id = %session_id,
                discarded = partial.len(),
                "Rasterization cancelled"
            );
        }
        Err(e) => {
            tracing::warn!(session_id = %session_id, "Could not load book: {}", e);
            SessionShared::update(&state, &token, |s| {
                s.navigator.fail(&e);
            });
        }
    }
}
