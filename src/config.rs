//! Configuration management for the book viewer

use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::decode::WorkerSource;
use crate::raster::ImageFormat;

/// Smallest and largest accepted render scale
pub const MIN_RENDER_SCALE: f32 = 0.5;
pub const MAX_RENDER_SCALE: f32 = 4.0;

const DEFAULT_WORKER_SOURCES: &str = "thread:pdf-decode,blocking,inline";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Public object storage the book PDFs live in
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage host, e.g. `https://xyz.supabase.co`
    pub public_url: String,
    pub bucket: String,
}

/// Rendering and fallback policy for viewer sessions
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub render_scale: f32,
    pub image_format: ImageFormat,
    pub open_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// How many times a runtime-loading failure may move on to the next worker source
    pub max_runtime_retries: u32,
    pub worker_sources: Vec<WorkerSource>,
    /// Page turns are confirmed by a flip-completed event instead of applied directly
    pub page_flip: bool,
    /// Sessions not looked up for this long are unmounted
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
}

impl ViewerConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// How often the idle-session reaper runs
    pub fn session_reap_interval(&self) -> Duration {
        Duration::from_secs((self.session_ttl_secs / 4).clamp(1, 60))
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            render_scale: 2.0,
            image_format: ImageFormat::Png,
            open_timeout_secs: 30,
            page_timeout_secs: 30,
            probe_timeout_secs: 10,
            max_runtime_retries: 2,
            worker_sources: WorkerSource::parse_list(DEFAULT_WORKER_SOURCES)
                .unwrap_or_else(|_| vec![WorkerSource::BlockingPool, WorkerSource::CallingThread]),
            page_flip: false,
            session_ttl_secs: 1800,
            max_sessions: 256,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./books.db".to_string(),
            },
            storage: StorageConfig {
                public_url: "http://localhost:54321".to_string(),
                bucket: "books".to_string(),
            },
            viewer: ViewerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker_sources = env::var("VIEWER_WORKER_SOURCES")
            .unwrap_or_else(|_| DEFAULT_WORKER_SOURCES.to_string());
        let worker_sources =
            WorkerSource::parse_list(&worker_sources).map_err(|message| ConfigError::InvalidValue {
                key: "VIEWER_WORKER_SOURCES",
                message,
            })?;

        let image_format = env::var("VIEWER_IMAGE_FORMAT").unwrap_or_else(|_| "png".to_string());
        let image_format =
            ImageFormat::from_str_opt(&image_format).ok_or_else(|| ConfigError::InvalidValue {
                key: "VIEWER_IMAGE_FORMAT",
                message: format!("unsupported format '{}'", image_format),
            })?;

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3000)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./books.db".to_string()),
            },
            storage: StorageConfig {
                public_url: env::var("STORAGE_PUBLIC_URL")
                    .unwrap_or_else(|_| "http://localhost:54321".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "books".to_string()),
            },
            viewer: ViewerConfig {
                render_scale: parse_var::<f32>("VIEWER_RENDER_SCALE", 2.0)?
                    .clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE),
                image_format,
                open_timeout_secs: parse_var("VIEWER_OPEN_TIMEOUT_SECS", 30)?,
                page_timeout_secs: parse_var("VIEWER_PAGE_TIMEOUT_SECS", 30)?,
                probe_timeout_secs: parse_var("VIEWER_PROBE_TIMEOUT_SECS", 10)?,
                max_runtime_retries: parse_var("VIEWER_MAX_RUNTIME_RETRIES", 2)?,
                worker_sources,
                page_flip: parse_var("VIEWER_PAGE_FLIP", false)?,
                session_ttl_secs: parse_var("VIEWER_SESSION_TTL_SECS", 1800)?,
                max_sessions: parse_var("VIEWER_MAX_SESSIONS", 256)?,
            },
        })
    }
}

/// Read an optional environment variable, falling back to `default` when unset
fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
