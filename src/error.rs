//! Error types of the viewer pipeline.

use std::fmt;

/// Which pluggable sub-decoder an asset needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderKind {
    /// Mesh geometry decompression (`KHR_draco_mesh_compression`).
    Geometry,
    /// Compressed texture transcoding (`KHR_texture_basisu`).
    Texture,
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderKind::Geometry => f.write_str("geometry"),
            DecoderKind::Texture => f.write_str("texture"),
        }
    }
}

/// A failed load attempt. Terminal for that load, never fatal to the host.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {uri}: {reason}")]
    Network { uri: String, reason: String },
    #[error("failed to decode {uri}: {reason}")]
    Decode { uri: String, reason: String },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("{extension} requires a {kind} decoder, but none is configured")]
    MissingDecoder {
        extension: String,
        kind: DecoderKind,
    },
}

/// Failure reported by a sub-decoder.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Failure while drawing a single frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The surface must be reconfigured before the next frame.
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("surface error: {0}")]
    Surface(String),
}
