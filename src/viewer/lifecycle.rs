//! Cancellation for the resolve-then-rasterize pipeline
//!
//! One token per pipeline run. The session cancels it on unmount or
//! restart and then awaits the task before touching shared state again.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cooperative cancellation signal shared by a pipeline and its owner
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A running pipeline task and the token that stops it
pub struct PipelineHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PipelineHandle {
    pub fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { token, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the task to wind down
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!("Viewer pipeline panicked: {}", e);
            }
        }
    }
}
