//! Image encoding: [`ImageInput`] → base64 `ImageData` for the model request.
//!
//! Images are forwarded exactly as read; no re-encoding or resizing. The
//! provider receives the original media type so JPEG scans stay JPEG.

use crate::error::Scan2TableError;
use crate::pipeline::input::ImageInput;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Encode an image as a base64 attachment ready for the VLM API.
pub fn encode_image(img: &ImageInput) -> ImageData {
    let b64 = STANDARD.encode(&img.bytes);
    debug!("Encoded {} → {} bytes base64", img.name, b64.len());

    ImageData::new(b64, img.media_type.as_str()).with_detail("high")
}

/// Strip a `data:<mime>;base64,` prefix, returning the payload part.
///
/// Text without a comma is returned unchanged.
pub fn strip_data_uri(data: &str) -> &str {
    match data.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => payload,
        _ => data,
    }
}

/// Decode a base64 data URI (or bare base64 text) into an [`ImageInput`].
///
/// The media type comes from the URI header when present, otherwise it is
/// sniffed from the decoded bytes.
pub fn decode_data_uri(name: &str, data: &str) -> Result<ImageInput, Scan2TableError> {
    let bytes = STANDARD
        .decode(strip_data_uri(data).trim())
        .map_err(|e| Scan2TableError::FileReadFailed {
            name: name.to_string(),
            reason: format!("invalid base64: {e}"),
        })?;

    let header_type = data
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(';'))
        .map(|(mime, _)| mime)
        .filter(|mime| mime.starts_with("image/"));

    match header_type {
        Some(mime) => Ok(ImageInput::with_media_type(name, mime, bytes)),
        None => ImageInput::from_bytes(name, bytes),
    }
}
