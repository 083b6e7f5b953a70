//! KTX2 texture transcoding for native builds.

use std::{io::Read, sync::Once};

use basis_universal::{
    DecodeFlags, LowLevelUastcTranscoder, SliceParametersUastc, TranscoderBlockFormat,
};
use ktx2::{Format, Reader, SupercompressionScheme};

use crate::{error::DecodeError, resources::decoders::TextureTranscoder};

static TRANSCODER_INIT: Once = Once::new();

/// Decodes the base level of a KTX2 container to RGBA8.
///
/// Uncompressed `R8G8B8A8` levels are copied as they are, UASTC levels are
/// transcoded with Basis Universal. Levels may be Zstandard supercompressed.
/// ETC1S (BasisLZ) payloads are rejected.
#[derive(Debug)]
pub struct Ktx2Transcoder;

impl Ktx2Transcoder {
    pub fn new() -> Self {
        TRANSCODER_INIT.call_once(basis_universal::transcoder_init);
        Self
    }
}

impl Default for Ktx2Transcoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureTranscoder for Ktx2Transcoder {
    fn transcode(&self, bytes: &[u8]) -> Result<image::RgbaImage, DecodeError> {
        let reader = Reader::new(bytes)
            .map_err(|e| DecodeError::new(format!("invalid KTX2 container: {:?}", e)))?;
        let header = reader.header();
        let width = header.pixel_width;
        let height = header.pixel_height.max(1);
        let level = base_level(&reader)?;

        let pixels = match header.format {
            Some(format) if format == Format::R8G8B8A8_UNORM || format == Format::R8G8B8A8_SRGB => level,
            // Basis Universal payloads leave the format undefined
            None => transcode_uastc(&level, width, height)?,
            Some(format) => {
                return Err(DecodeError::new(format!("unsupported KTX2 format {:?}", format)));
            }
        };
        log::debug!("Transcoded a {}x{} KTX2 texture", width, height);
        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| DecodeError::new(format!("KTX2 level is too small for {}x{}", width, height)))
    }
}

fn base_level(reader: &Reader<&[u8]>) -> Result<Vec<u8>, DecodeError> {
    let level = reader
        .levels()
        .next()
        .ok_or_else(|| DecodeError::new("KTX2 container has no levels"))?;
    match reader.header().supercompression_scheme {
        None => Ok(level.to_vec()),
        Some(SupercompressionScheme::Zstandard) => {
            let mut cursor = std::io::Cursor::new(level);
            let mut decoder = ruzstd::StreamingDecoder::new(&mut cursor)
                .map_err(|e| DecodeError::new(format!("corrupt zstd level: {}", e)))?;
            let mut data = Vec::new();
            decoder
                .read_to_end(&mut data)
                .map_err(|e| DecodeError::new(format!("corrupt zstd level: {}", e)))?;
            Ok(data)
        }
        Some(scheme) => Err(DecodeError::new(format!(
            "unsupported KTX2 supercompression {:?}",
            scheme
        ))),
    }
}

fn transcode_uastc(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DecodeError> {
    let parameters = SliceParametersUastc {
        num_blocks_x: width.div_ceil(4),
        num_blocks_y: height.div_ceil(4),
        has_alpha: true,
        original_width: width,
        original_height: height,
    };
    LowLevelUastcTranscoder::new()
        .transcode_slice(
            data,
            parameters,
            DecodeFlags::HIGH_QUALITY,
            TranscoderBlockFormat::RGBA32,
        )
        .map_err(|e| DecodeError::new(format!("UASTC transcoding failed: {:?}", e)))
}
