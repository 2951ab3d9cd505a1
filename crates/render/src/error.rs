use std::path::PathBuf;

use crate::device::DeviceError;

/// Errors from renderer setup and resource creation.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("renderer has been shut down")]
    ShutDown,
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Errors from loading atlas and animation descriptors.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid descriptor: {0}")]
    Invalid(String),
    #[error("descriptor defines no usable {0}")]
    Empty(&'static str),
    #[error("texture load failed: {0}")]
    Texture(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}
