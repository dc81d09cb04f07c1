//! Decode worker bridge
//!
//! One bridge per process. It owns the engine and the worker source list;
//! the active pointer is read at the start of every open and only moved by
//! [`DecodeBridge::advance_from`] after a runtime-loading failure on the
//! source that is still active.

use std::sync::Arc;

use parking_lot::Mutex;

use super::error::DecodeError;
use super::source::{WorkerSource, WorkerSourceList};
use super::traits::{DecodeEngine, OpenedDocument};

pub struct DecodeBridge {
    engine: Arc<dyn DecodeEngine>,
    sources: Mutex<WorkerSourceList>,
}

impl DecodeBridge {
    pub fn new(engine: Arc<dyn DecodeEngine>, sources: Vec<WorkerSource>) -> Self {
        Self {
            engine,
            sources: Mutex::new(WorkerSourceList::new(sources)),
        }
    }

    /// Activate the first source if none is active yet
    pub fn configure_initial(&self) -> WorkerSource {
        self.sources.lock().configure_initial().clone()
    }

    /// Switch to the next source; `false` when none is left
    pub fn advance_source(&self) -> bool {
        let mut sources = self.sources.lock();
        let previous = sources.active().cloned();
        let advanced = sources.advance();
        self.log_advance(&sources, previous, advanced);
        advanced
    }

    /// Switch away from `failed` only if it is still the active source
    ///
    /// Concurrent opens that failed on the same source must move the
    /// pointer once. Returns `true` when the caller should retry on the
    /// now active source.
    pub fn advance_from(&self, failed: &WorkerSource) -> bool {
        let mut sources = self.sources.lock();
        let previous = sources.active().cloned();
        let retry = sources.advance_from(failed);

        if previous.as_ref() == Some(failed) {
            self.log_advance(&sources, previous, retry);
        } else {
            tracing::debug!(
                engine = self.engine.name(),
                failed = %failed,
                "Decode worker source already switched"
            );
        }
        retry
    }

    fn log_advance(&self, sources: &WorkerSourceList, previous: Option<WorkerSource>, advanced: bool) {
        match (advanced, previous) {
            (true, Some(previous)) => {
                let next = sources
                    .active()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                tracing::warn!(
                    engine = self.engine.name(),
                    from = %previous,
                    to = %next,
                    "Switching decode worker source"
                );
            }
            (false, _) => {
                tracing::error!(engine = self.engine.name(), "All decode worker sources exhausted");
            }
            _ => {}
        }
    }

    /// Currently active source (activating the first one if needed)
    pub fn active_source(&self) -> WorkerSource {
        self.configure_initial()
    }

    pub fn sources(&self) -> Vec<WorkerSource> {
        self.sources.lock().sources().to_vec()
    }

    /// Open a document on the active source
    pub async fn open(
        &self,
        data: Arc<Vec<u8>>,
    ) -> Result<(WorkerSource, Box<dyn OpenedDocument>), DecodeError> {
        let source = self.active_source();
        let document = self.open_on(data, &source).await?;
        Ok((source, document))
    }

    /// Open a document on a source the caller already picked
    pub async fn open_on(
        &self,
        data: Arc<Vec<u8>>,
        source: &WorkerSource,
    ) -> Result<Box<dyn OpenedDocument>, DecodeError> {
        tracing::debug!(engine = self.engine.name(), source = %source, "Opening document");
        self.engine.open(data, source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct RefusingEngine;

    #[async_trait]
    impl DecodeEngine for RefusingEngine {
        fn name(&self) -> &'static str {
            "refusing"
        }

        async fn open(
            &self,
            _data: Arc<Vec<u8>>,
            source: &WorkerSource,
        ) -> Result<Box<dyn OpenedDocument>, DecodeError> {
            Err(DecodeError::RuntimeLoad(format!("{} unavailable", source)))
        }
    }

    #[tokio::test]
    async fn test_open_uses_active_source() {
        let bridge = DecodeBridge::new(
            Arc::new(RefusingEngine),
            vec![WorkerSource::dedicated("a"), WorkerSource::BlockingPool],
        );

        let err = bridge.open(Arc::new(Vec::new())).await.err().unwrap();
        assert_eq!(err.to_string(), "Decode runtime unavailable: thread:a unavailable");

        assert!(bridge.advance_source());
        let err = bridge.open(Arc::new(Vec::new())).await.err().unwrap();
        assert_eq!(err.to_string(), "Decode runtime unavailable: blocking unavailable");
    }

    #[test]
    fn test_advance_stops_at_sentinel() {
        let bridge = DecodeBridge::new(Arc::new(RefusingEngine), vec![WorkerSource::BlockingPool]);
        assert_eq!(bridge.configure_initial(), WorkerSource::BlockingPool);
        assert!(bridge.advance_source());
        assert_eq!(bridge.active_source(), WorkerSource::CallingThread);
        assert!(!bridge.advance_source());
        assert_eq!(bridge.sources().len(), 2);
    }

    #[test]
    fn test_advance_from_moves_once_per_failed_source() {
        let bridge = DecodeBridge::new(
            Arc::new(RefusingEngine),
            vec![WorkerSource::dedicated("a"), WorkerSource::BlockingPool],
        );
        let failed = bridge.active_source();

        assert!(bridge.advance_from(&failed));
        assert!(bridge.advance_from(&failed));
        assert_eq!(bridge.active_source(), WorkerSource::BlockingPool);

        assert!(bridge.advance_from(&WorkerSource::BlockingPool));
        assert!(!bridge.advance_from(&WorkerSource::CallingThread));
        assert_eq!(bridge.active_source(), WorkerSource::CallingThread);
    }
}
