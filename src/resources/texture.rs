use crate::{
    error::LoadError,
    resources::decoders::{KTX2_MIME_TYPE, TextureTranscoder},
};

/// Resolve `uri` relative to the document it was referenced from.
///
/// Absolute URIs (leading `/` or a scheme) are returned as-is.
pub fn resolve_relative(base: &str, uri: &str) -> String {
    if uri.starts_with('/') || uri.contains("://") {
        return uri.to_string();
    }
    match base.rfind('/') {
        Some(idx) => format!("{}{}", &base[..=idx], uri),
        None => uri.to_string(),
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url, LoadError> {
    let network = |reason: String| LoadError::Network {
        uri: file_name.to_string(),
        reason,
    };
    let origin = web_sys::window()
        .ok_or_else(|| network("no window".to_string()))?
        .location()
        .origin()
        .map_err(|_| network("page origin unavailable".to_string()))?;
    let base = reqwest::Url::parse(&format!("{}/", origin)).map_err(|e| network(e.to_string()))?;
    base.join(file_name).map_err(|e| network(e.to_string()))
}

/// Fetch the raw bytes behind `file_name`.
///
/// WASM builds resolve it against the page origin, native builds against `asset_root`.
pub async fn load_binary(file_name: &str, #[allow(unused)] asset_root: &str) -> Result<Vec<u8>, LoadError> {
    if file_name.starts_with("data:") {
        return Err(LoadError::UnsupportedFormat(
            "data URIs are not supported".to_string(),
        ));
    }
    let network = |e: &dyn std::fmt::Display| LoadError::Network {
        uri: file_name.to_string(),
        reason: e.to_string(),
    };

    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await.map_err(|e| network(&e))?;
        let response = response.error_for_status().map_err(|e| network(&e))?;
        response.bytes().await.map_err(|e| network(&e))?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(asset_root).join(file_name.trim_start_matches('/'));
        tokio::fs::read(&path).await.map_err(|e| network(&e))?
    };

    Ok(data)
}

/// Decode an encoded image to RGBA8.
///
/// KTX2 payloads go through `transcoder`, everything else through the `image` crate.
/// A failure is logged and yields `None`, never an error.
pub fn decode_image(
    label: &str,
    bytes: &[u8],
    mime_type: Option<&str>,
    transcoder: Option<&dyn TextureTranscoder>,
) -> Option<image::RgbaImage> {
    if mime_type == Some(KTX2_MIME_TYPE) {
        let Some(transcoder) = transcoder else {
            log::warn!("{} is a KTX2 texture but no transcoder is registered", label);
            return None;
        };
        return transcoder
            .transcode(bytes)
            .inspect_err(|e| log::warn!("Could not transcode {}: {}", label, e))
            .ok();
    }
    let decoded = match mime_type.and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    };
    decoded
        .map(|img| img.to_rgba8())
        .inspect_err(|e| log::warn!("Could not decode {}: {}", label, e))
        .ok()
}

/// Mime type of an external image, from the declared type or the file extension.
pub fn guess_mime_type<'a>(uri: &str, declared: Option<&'a str>) -> Option<&'a str> {
    declared.or_else(|| {
        let lower = uri.to_ascii_lowercase();
        if lower.ends_with(".ktx2") {
            Some(KTX2_MIME_TYPE)
        } else if lower.ends_with(".png") {
            Some("image/png")
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            Some("image/jpeg")
        } else {
            None
        }
    })
}
