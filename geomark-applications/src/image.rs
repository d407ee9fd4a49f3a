//! Inline image attachments
//!
//! Images are stored on the marker itself as `data:` URLs, so a marker blob
//! stays self-contained.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use geomark_core::{validation_error, ErrorContext, GeomarkError, GeomarkResult};
use std::path::Path;
use tracing::debug;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// MIME type for a recognised image file extension
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

/// Read an image file into a `data:<mime>;base64,<payload>` URL.
///
/// Files with an unknown extension, or larger than `max_bytes`, are refused.
pub fn encode_image_file<P: AsRef<Path>>(path: P, max_bytes: u64) -> GeomarkResult<String> {
    let path = path.as_ref();

    let mime = mime_for_path(path).ok_or_else(|| GeomarkError::Validation {
        message: format!("'{}' is not a supported image file", path.display()),
        field: Some("image".to_string()),
        context: ErrorContext::new("image")
            .with_operation("encode_image_file")
            .with_suggestion("Use a png, jpg, gif, webp, bmp or svg file"),
    })?;

    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(GeomarkError::Validation {
            message: format!(
                "Image is {} bytes, larger than the {} byte limit",
                size, max_bytes
            ),
            field: Some("image".to_string()),
            context: ErrorContext::new("image")
                .with_operation("encode_image_file")
                .with_metadata("path", &path.display().to_string())
                .with_suggestion("Pick a smaller image or raise markers.max_image_bytes"),
        });
    }

    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), mime = mime, "Encoded image");

    Ok(format!(
        "{}{}{}{}",
        DATA_URL_PREFIX,
        mime,
        BASE64_MARKER,
        STANDARD.encode(bytes)
    ))
}

/// Short human-readable summary of a data URL, e.g. `image/png, 1234 bytes`
pub fn describe_data_url(url: &str) -> GeomarkResult<String> {
    let (mime, payload) = url
        .strip_prefix(DATA_URL_PREFIX)
        .and_then(|rest| rest.split_once(BASE64_MARKER))
        .ok_or_else(|| validation_error!("Image is not a base64 data URL", "image", "image"))?;

    let decoded = STANDARD
        .decode(payload)
        .map_err(|e| validation_error!(format!("Image payload is not valid base64: {}", e), "image", "image"))?;

    Ok(format!("{}, {} bytes", mime, decoded.len()))
}
