//! Decode worker bridge
//!
//! A decode engine runs on one of an ordered list of worker sources. When
//! the active source fails to load, the bridge moves to the next one; the
//! list always ends with the in-process fallback.

mod bridge;
mod error;
mod source;
mod traits;
mod types;

pub use bridge::DecodeBridge;
pub use error::{classify_message, DecodeError, FailureKind};
pub use source::{WorkerSource, WorkerSourceList, DEFAULT_WORKER_NAME, DEFAULT_WORKER_STACK_SIZE};
pub use traits::{DecodeEngine, OpenedDocument};
pub use types::{encode_image, ImageFormat, RenderOptions, RenderedPage};
