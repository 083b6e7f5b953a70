//! Pluggable sub-decoders for compressed glTF payloads.
//!
//! The loader itself only understands plain accessors and the image formats
//! the `image` crate decodes. Draco-compressed geometry and KTX2 textures are
//! handed to a registered [`GeometryDecoder`] / [`TextureTranscoder`].
//!
//! Native builds ship a KTX2 transcoder (see [`DecoderSet::bundled`]). No
//! Draco decoder ships; callers register their own.

use std::rc::Rc;

use crate::{
    config::DecoderConfig,
    data_structures::scene_graph::Geometry,
    error::DecodeError,
};

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";
pub const BASISU_EXTENSION: &str = "KHR_texture_basisu";
pub const KTX2_MIME_TYPE: &str = "image/ktx2";

/// Decompresses the geometry of a primitive that carries `KHR_draco_mesh_compression`.
pub trait GeometryDecoder {
    /// `buffers` holds the resolved data of every buffer of the document, by index.
    fn decode(&self, primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Result<Geometry, DecodeError>;
}

/// Transcodes a KTX2 container into RGBA8 pixels.
pub trait TextureTranscoder {
    fn transcode(&self, bytes: &[u8]) -> Result<image::RgbaImage, DecodeError>;
}

/// The sub-decoders registered on a loader, plus the resource paths they were configured with.
#[derive(Clone, Default)]
pub struct DecoderSet {
    pub config: DecoderConfig,
    pub geometry: Option<Rc<dyn GeometryDecoder>>,
    pub texture: Option<Rc<dyn TextureTranscoder>>,
}

impl DecoderSet {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            geometry: None,
            texture: None,
        }
    }

    /// The decoders this build ships with, registered as far as `config` enables them.
    pub fn bundled(config: DecoderConfig) -> Self {
        let decoders = Self::new(config);
        #[cfg(all(feature = "ktx2", not(target_arch = "wasm32")))]
        let decoders = if decoders.config.ktx2_transcoder_path.is_some() {
            decoders.with_texture_transcoder(Rc::new(
                crate::resources::ktx2_transcoder::Ktx2Transcoder::new(),
            ))
        } else {
            decoders
        };
        decoders
    }

    pub fn with_geometry_decoder(mut self, decoder: Rc<dyn GeometryDecoder>) -> Self {
        self.geometry = Some(decoder);
        self
    }

    pub fn with_texture_transcoder(mut self, transcoder: Rc<dyn TextureTranscoder>) -> Self {
        self.texture = Some(transcoder);
        self
    }

    /// A geometry decoder is usable only when one is registered and Draco is enabled in the config.
    pub fn geometry_decoder(&self) -> Option<&dyn GeometryDecoder> {
        self.config.draco_decoder_path.as_ref()?;
        self.geometry.as_deref()
    }

    pub fn texture_transcoder(&self) -> Option<&dyn TextureTranscoder> {
        self.config.ktx2_transcoder_path.as_ref()?;
        self.texture.as_deref()
    }
}

impl std::fmt::Debug for DecoderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderSet")
            .field("config", &self.config)
            .field("geometry", &self.geometry.is_some())
            .field("texture", &self.texture.is_some())
            .finish()
    }
}
