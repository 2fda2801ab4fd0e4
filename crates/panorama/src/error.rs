use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the renderer from mounting or drawing.
#[derive(Debug, Error)]
pub enum PanoramaError {
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("failed to create {resource}: {message}")]
    Resource {
        resource: &'static str,
        message: String,
    },
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceFault),
    #[error("viewport {width}x{height} has no drawable area")]
    EmptyViewport { width: f32, height: f32 },
}

impl PanoramaError {
    pub fn resource(resource: &'static str, message: impl Into<String>) -> Self {
        PanoramaError::Resource {
            resource,
            message: message.into(),
        }
    }
}

/// Per-frame surface acquisition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceFault {
    #[error("surface lost")]
    Lost,
    #[error("surface outdated")]
    Outdated,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("out of memory")]
    OutOfMemory,
    #[error("unrecoverable surface error")]
    Other,
}

impl SurfaceFault {
    /// Lost and outdated surfaces recover by reconfiguring at the current size.
    pub fn needs_reconfigure(self) -> bool {
        matches!(self, SurfaceFault::Lost | SurfaceFault::Outdated)
    }
}

/// Failures while fetching or decoding the panorama image.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("no panorama asset configured")]
    Missing,
    #[error("texture loader stopped before returning a result")]
    Abandoned,
    #[error("failed to start texture loader: {0}")]
    Spawn(String),
}
