//! Viewer error types.
//!
//! Domain failures the caller can match on live in [`Error`]. IO-bound work
//! (GPU setup, texture fetching and decoding) reports through `anyhow` instead,
//! since nothing downstream branches on those causes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The host document has no element to attach the render target to.
    /// Fatal at startup.
    #[error("output container `{0}` not found")]
    ContainerNotFound(String),

    /// The render target could not be attached to the container. Fatal at
    /// startup.
    #[error("cannot attach render target: {0}")]
    AttachFailed(String),

    #[error("invalid camera parameters: {0}")]
    InvalidCamera(String),

    /// A mesh was requested before its geometry or material existed.
    #[error("cannot create mesh before its {0} is initialized")]
    MissingMeshPart(&'static str),

    #[error("render surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type Result<T> = std::result::Result<T, Error>;
