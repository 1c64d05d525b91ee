//! Image byte decoding: raster formats via the `image` crate, SVG via
//! usvg + resvg, `data:` URL payloads via base64.

use base64::Engine;
use lumo_common::image::LoadedImage;

/// Detected image format. Raster sub-formats (PNG/JPEG/GIF/WebP/…) are
/// distinguished inside the `image` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// SVG vector image.
    Svg,
    /// Anything raster.
    Raster,
}

/// Image decode failures, surfaced to scripts as a bare `onerror`.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The bytes did not decode as the detected format.
    #[error("could not decode image: {0}")]
    Decode(String),
    /// The decoded image has a zero dimension.
    #[error("image has zero-size dimensions")]
    ZeroSize,
    /// A `data:` URL payload was malformed.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
}

/// Detect whether `bytes` are SVG or raster: URL extension first, then
/// `data:` MIME, then magic-byte sniffing of the first 256 bytes.
#[must_use]
pub fn detect_format(url: &str, bytes: &[u8]) -> ImageFormat {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
    {
        return ImageFormat::Svg;
    }
    if url.starts_with("data:image/svg") {
        return ImageFormat::Svg;
    }

    let head: Vec<u8> = bytes
        .iter()
        .skip_while(|&&b| b.is_ascii_whitespace())
        .take(256)
        .copied()
        .collect();
    if head.starts_with(b"<?xml") || head.starts_with(b"<svg") {
        return ImageFormat::Svg;
    }
    ImageFormat::Raster
}

/// Decode image bytes fetched from `url` into a [`LoadedImage`].
///
/// # Errors
///
/// [`ImageError::Decode`]/[`ImageError::ZeroSize`] when the bytes cannot
/// become a usable bitmap.
pub fn decode_image(bytes: &[u8], url: &str) -> Result<LoadedImage, ImageError> {
    match detect_format(url, bytes) {
        ImageFormat::Svg => decode_svg(bytes),
        ImageFormat::Raster => decode_raster(bytes),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decode_svg(bytes: &[u8]) -> Result<LoadedImage, ImageError> {
    let options = usvg::Options::default();
    let tree =
        usvg::Tree::from_data(bytes, &options).map_err(|e| ImageError::Decode(e.to_string()))?;

    let size = tree.size();
    let (w, h) = (size.width() as u32, size.height() as u32);
    if w == 0 || h == 0 {
        return Err(ImageError::ZeroSize);
    }

    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| ImageError::Decode("failed to allocate pixmap".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(LoadedImage::new(w, h, pixmap.take()))
}

fn decode_raster(bytes: &[u8]) -> Result<LoadedImage, ImageError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Err(ImageError::ZeroSize);
    }
    Ok(LoadedImage::new(w, h, rgba.into_raw()))
}

/// Decode the payload of a `data:` URL. Only base64 payloads are
/// supported.
///
/// # Errors
///
/// [`ImageError::DataUrl`] when the URL is not a base64 `data:` URL or
/// the payload does not decode.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::DataUrl("missing data: scheme".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::DataUrl("missing comma".to_string()))?;
    if !metadata.ends_with(";base64") {
        return Err(ImageError::DataUrl(format!(
            "unsupported encoding '{metadata}'"
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ImageError::DataUrl(e.to_string()))
}
