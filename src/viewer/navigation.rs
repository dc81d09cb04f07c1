//! Viewer state machine
//!
//! `Loading -> Ready(current page) -> Unmounted`, with `Failed` as the
//! full-screen error state. Out-of-range page turns are ignored, never
//! wrapped. In page-flip mode a turn is only a request: the index moves
//! when the flip widget reports which page it landed on.

use serde::Serialize;

use crate::error::{ErrorKind, ViewerError};
use crate::raster::DecodeProgress;

/// How page turns take effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    #[default]
    Direct,
    PageFlip,
}

/// What the error screen shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub title: &'static str,
    pub message: String,
    pub details: String,
}

impl From<&ViewerError> for ErrorView {
    fn from(error: &ViewerError) -> Self {
        let kind = error.kind();
        let title = match kind {
            ErrorKind::NotFound => "Book Not Found",
            _ => "Unable to Load Book",
        };

        Self {
            kind,
            title,
            message: error.user_message().to_string(),
            details: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    Loading {
        progress: DecodeProgress,
    },
    Ready {
        current_page: usize,
        total_pages: usize,
        /// Flip requested but not yet confirmed
        pending_flip: Option<usize>,
    },
    Failed(ErrorView),
    Unmounted,
}

impl ViewerState {
    pub fn status(&self) -> &'static str {
        match self {
            ViewerState::Loading { .. } => "loading",
            ViewerState::Ready { .. } => "ready",
            ViewerState::Failed(_) => "failed",
            ViewerState::Unmounted => "unmounted",
        }
    }
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "page", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Moved(usize),
    FlipRequested(usize),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    state: ViewerState,
    mode: NavigationMode,
}

impl Navigator {
    pub fn new(mode: NavigationMode) -> Self {
        Self {
            state: ViewerState::Loading {
                progress: DecodeProgress::default(),
            },
            mode,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn current_page(&self) -> Option<usize> {
        match self.state {
            ViewerState::Ready { current_page, .. } => Some(current_page),
            _ => None,
        }
    }

    pub fn total_pages(&self) -> Option<usize> {
        match self.state {
            ViewerState::Ready { total_pages, .. } => Some(total_pages),
            ViewerState::Loading { progress } if progress.total_pages > 0 => Some(progress.total_pages),
            _ => None,
        }
    }

    pub fn is_unmounted(&self) -> bool {
        self.state == ViewerState::Unmounted
    }

    /// "Page 3 of 12" while ready
    pub fn page_label(&self) -> Option<String> {
        match self.state {
            ViewerState::Ready {
                current_page,
                total_pages,
                ..
            } if total_pages > 0 => Some(format!("Page {} of {}", current_page + 1, total_pages)),
            _ => None,
        }
    }

    /// Record decode progress; only meaningful while loading
    pub fn progress(&mut self, update: DecodeProgress) -> bool {
        match &mut self.state {
            ViewerState::Loading { progress } => {
                *progress = update;
                true
            }
            _ => false,
        }
    }

    /// Loading finished; show the first page
    pub fn ready(&mut self, total_pages: usize) -> bool {
        match self.state {
            ViewerState::Loading { .. } => {
                self.state = ViewerState::Ready {
                    current_page: 0,
                    total_pages,
                    pending_flip: None,
                };
                true
            }
            _ => false,
        }
    }

    pub fn fail(&mut self, error: &ViewerError) -> bool {
        match self.state {
            ViewerState::Loading { .. } => {
                self.state = ViewerState::Failed(ErrorView::from(error));
                true
            }
            _ => false,
        }
    }

    /// Back to loading for a new pipeline run
    pub fn restart(&mut self) -> bool {
        if self.is_unmounted() {
            return false;
        }
        self.state = ViewerState::Loading {
            progress: DecodeProgress::default(),
        };
        true
    }

    /// Terminal; every later transition is ignored
    pub fn unmount(&mut self) {
        self.state = ViewerState::Unmounted;
    }

    pub fn next(&mut self) -> NavigationOutcome {
        match self.state {
            ViewerState::Ready {
                current_page,
                total_pages,
                ..
            } if current_page + 1 < total_pages => self.turn_to(current_page + 1),
            _ => NavigationOutcome::Ignored,
        }
    }

    pub fn prev(&mut self) -> NavigationOutcome {
        match self.state {
            ViewerState::Ready { current_page, .. } if current_page > 0 => {
                self.turn_to(current_page - 1)
            }
            _ => NavigationOutcome::Ignored,
        }
    }

    /// Jump to a 0-based page
    pub fn goto(&mut self, page: usize) -> NavigationOutcome {
        match self.state {
            ViewerState::Ready {
                current_page,
                total_pages,
                ..
            } if page < total_pages && page != current_page => self.turn_to(page),
            _ => NavigationOutcome::Ignored,
        }
    }

    /// The flip widget landed on `page`; adopt it as the current page
    pub fn flip_completed(&mut self, page: usize) -> NavigationOutcome {
        match &mut self.state {
            ViewerState::Ready {
                current_page,
                total_pages,
                pending_flip,
            } if page < *total_pages => {
                *pending_flip = None;
                if *current_page == page {
                    NavigationOutcome::Ignored
                } else {
                    *current_page = page;
                    NavigationOutcome::Moved(page)
                }
            }
            _ => NavigationOutcome::Ignored,
        }
    }

    fn turn_to(&mut self, target: usize) -> NavigationOutcome {
        let mode = self.mode;
        let ViewerState::Ready {
            current_page,
            pending_flip,
            ..
        } = &mut self.state
        else {
            return NavigationOutcome::Ignored;
        };

        match mode {
            NavigationMode::Direct => {
                *current_page = target;
                NavigationOutcome::Moved(target)
            }
            NavigationMode::PageFlip => {
                *pending_flip = Some(target);
                NavigationOutcome::FlipRequested(target)
            }
        }
    }
}
