//! Dedicated decode thread
//!
//! The thread opens the document once and owns it until the command
//! channel closes. Callers talk to it through [`DecodeWorker`], which
//! turns every request into a message and awaits the reply.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::oneshot;

use crate::decode::{DecodeError, RenderOptions, RenderedPage};

use super::render::{open_pdf, render_page};

enum Command {
    Render {
        page_index: usize,
        options: RenderOptions,
        reply: oneshot::Sender<Result<RenderedPage, DecodeError>>,
    },
}

/// Handle to a running decode thread
pub struct DecodeWorker {
    name: String,
    page_count: usize,
    commands: mpsc::Sender<Command>,
    _handle: JoinHandle<()>,
}

impl DecodeWorker {
    /// Start the thread and wait until it has opened the document
    pub async fn spawn(
        name: &str,
        stack_size: Option<usize>,
        data: Arc<Vec<u8>>,
    ) -> Result<Self, DecodeError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (commands, command_rx) = mpsc::channel();

        let mut builder = std::thread::Builder::new().name(name.to_string());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }

        let handle = builder
            .spawn(move || run(data, ready_tx, command_rx))
            .map_err(|e| {
                DecodeError::RuntimeLoad(format!("failed to spawn worker thread '{}': {}", name, e))
            })?;

        let page_count = match ready_rx.await {
            Ok(Ok(page_count)) => page_count,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(DecodeError::RuntimeLoad(format!(
                    "worker thread '{}' exited before it was ready",
                    name
                )))
            }
        };

        tracing::debug!(worker = name, page_count, "Decode worker ready");

        Ok(Self {
            name: name.to_string(),
            page_count,
            commands,
            _handle: handle,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub async fn render(
        &self,
        page_index: usize,
        options: RenderOptions,
    ) -> Result<RenderedPage, DecodeError> {
        let (reply, response) = oneshot::channel();

        self.commands
            .send(Command::Render {
                page_index,
                options,
                reply,
            })
            .map_err(|_| {
                DecodeError::RuntimeLoad(format!("worker thread '{}' is gone", self.name))
            })?;

        response.await.map_err(|_| {
            DecodeError::RuntimeLoad(format!(
                "worker thread '{}' dropped the request",
                self.name
            ))
        })?
    }
}

fn run(
    data: Arc<Vec<u8>>,
    ready: oneshot::Sender<Result<usize, DecodeError>>,
    commands: mpsc::Receiver<Command>,
) {
    let doc = match open_pdf(&data) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let page_count = match doc.page_count() {
        Ok(count) => count.max(0) as usize,
        Err(e) => {
            let _ = ready.send(Err(DecodeError::InvalidDocument(e.to_string())));
            return;
        }
    };

    if ready.send(Ok(page_count)).is_err() {
        return;
    }

    // Exits when the handle is dropped
    while let Ok(command) = commands.recv() {
        match command {
            Command::Render {
                page_index,
                options,
                reply,
            } => {
                let result = if page_index >= page_count {
                    Err(DecodeError::PageNotFound(page_index + 1, page_count))
                } else {
                    render_page(&doc, page_index, &options)
                };
                let _ = reply.send(result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mupdf::test_support::pdf_with_pages;

    #[tokio::test]
    async fn test_worker_renders_pages() {
        let worker = DecodeWorker::spawn("test-decode", None, Arc::new(pdf_with_pages(3)))
            .await
            .unwrap();
        assert_eq!(worker.page_count(), 3);

        let page = worker.render(2, RenderOptions::default()).await.unwrap();
        assert!(page.width > 0);

        let missing = worker.render(3, RenderOptions::default()).await;
        assert!(matches!(missing, Err(DecodeError::PageNotFound(4, 3))));
    }

    #[tokio::test]
    async fn test_worker_reports_invalid_document() {
        let result = DecodeWorker::spawn("test-decode", None, Arc::new(b"not a pdf".to_vec())).await;
        assert!(matches!(result, Err(DecodeError::InvalidDocument(_))));
    }
}
