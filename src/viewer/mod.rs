//! Viewer sessions
//!
//! Navigation state, cancellation, and the per-session pipeline that ties
//! the resolver and the rasterizer together.

mod lifecycle;
mod navigation;
mod registry;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use lifecycle::{CancellationToken, PipelineHandle};
pub use navigation::{ErrorView, NavigationMode, NavigationOutcome, Navigator, ViewerState};
pub use registry::SessionRegistry;
pub use session::{ProgressView, SessionSnapshot, ViewerPipeline, ViewerSession};
