//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::catalog::SqliteCatalog;
use crate::config::Config;
use crate::decode::DecodeBridge;
use crate::mupdf::MupdfEngine;
use crate::raster::{RasterOptions, Rasterizer};
use crate::resolver::AssetResolver;
use crate::storage::{HttpAssetProbe, HttpDocumentFetcher, StorageError, StorageNamespace};
use crate::viewer::{NavigationMode, SessionRegistry, ViewerPipeline};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize storage client: {0}")]
    StorageInit(#[from] StorageError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    sessions: SessionRegistry,
}

impl AppState {
    /// Wire the catalog, storage clients and the process-wide decode bridge
    pub fn new(config: Config, db: SqlitePool) -> Result<Self, StateError> {
        let catalog = Arc::new(SqliteCatalog::new(db.clone()));
        let probe = Arc::new(HttpAssetProbe::new(config.viewer.probe_timeout())?);
        let resolver = AssetResolver::new(
            catalog,
            probe,
            StorageNamespace::from_config(&config.storage),
        );

        let bridge = Arc::new(DecodeBridge::new(
            Arc::new(MupdfEngine::new()),
            config.viewer.worker_sources.clone(),
        ));
        tracing::info!(
            sources = ?bridge.sources().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Decode worker sources configured"
        );

        let rasterizer = Rasterizer::new(
            Arc::new(HttpDocumentFetcher::new()),
            bridge,
            RasterOptions::from_config(&config.viewer),
        );

        let mode = if config.viewer.page_flip {
            NavigationMode::PageFlip
        } else {
            NavigationMode::Direct
        };
        let sessions = SessionRegistry::new(
            ViewerPipeline::new(resolver, rasterizer),
            mode,
            config.viewer.max_sessions,
        );

        Ok(Self::with_sessions(config, db, sessions))
    }

    /// Build state around an existing session registry
    pub fn with_sessions(config: Config, db: SqlitePool, sessions: SessionRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                sessions,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }

    /// Unmount every open viewer session
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.inner.sessions.close_all().await;
    }
}
