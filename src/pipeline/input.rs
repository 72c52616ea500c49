//! Input resolution: turn user-supplied paths, URLs or data URIs into
//! in-memory images.
//!
//! Every selected image is read concurrently and awaited as one batch. The
//! batch fails as soon as any single read fails, and the error names that
//! file: partial uploads are never sent to the model.

use crate::error::Scan2TableError;
use crate::pipeline::encode::decode_data_uri;
use crate::progress::ProgressCallback;
use futures::future::try_join_all;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An image payload held in memory for exactly one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// File name or URL, used in messages only.
    pub name: String,
    /// Media type, e.g. `image/png`.
    pub media_type: String,
    /// Raw encoded image bytes (PNG, JPEG, …), not pixels.
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// Wrap raw bytes, detecting the media type from the magic bytes and
    /// falling back to the file extension of `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, Scan2TableError> {
        let name = name.into();
        let media_type = sniff_media_type(&bytes, &name)
            .ok_or_else(|| Scan2TableError::NotAnImage { name: name.clone() })?;
        Ok(Self {
            name,
            media_type: media_type.to_string(),
            bytes,
        })
    }

    /// Wrap raw bytes with a caller-supplied media type.
    pub fn with_media_type(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// Detect an image media type from content, then from the extension.
fn sniff_media_type(bytes: &[u8], name: &str) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(name).ok())
        .map(|f| f.to_mime_type())
}

/// A queued image: either a path/URL still to be read, or bytes in hand.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Location(String),
    Loaded(ImageInput),
}

impl ImageSource {
    pub fn name(&self) -> &str {
        match self {
            ImageSource::Location(loc) => loc,
            ImageSource::Loaded(img) => &img.name,
        }
    }

    /// Read the image if it is not in memory yet.
    pub async fn resolve(&self, timeout_secs: u64) -> Result<ImageInput, Scan2TableError> {
        match self {
            ImageSource::Loaded(img) => Ok(img.clone()),
            ImageSource::Location(loc) => resolve_image(loc, timeout_secs).await,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the input string is an inline `data:` URI.
pub fn is_data_uri(input: &str) -> bool {
    input.starts_with("data:")
}

/// Read every path or URL concurrently, preserving the caller's order.
pub async fn load_images(
    inputs: &[String],
    timeout_secs: u64,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<ImageInput>, Scan2TableError> {
    let sources: Vec<ImageSource> = inputs.iter().cloned().map(ImageSource::Location).collect();
    load_sources(&sources, timeout_secs, progress).await
}

/// Resolve every source concurrently, preserving the caller's order.
///
/// Fails with the first error encountered; no image is returned unless all
/// of them were read.
pub async fn load_sources(
    sources: &[ImageSource],
    timeout_secs: u64,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<ImageInput>, Scan2TableError> {
    if let Some(cb) = progress {
        cb.on_load_start(sources.len());
    }

    let reads = sources.iter().map(|source| async move {
        let image = source.resolve(timeout_secs).await?;
        if let Some(cb) = progress {
            cb.on_image_loaded(&image.name, image.bytes.len());
        }
        Ok::<_, Scan2TableError>(image)
    });

    let images = try_join_all(reads).await?;
    info!("Loaded {} images", images.len());
    Ok(images)
}

/// Resolve a single path, URL or data URI to an [`ImageInput`].
pub async fn resolve_image(input: &str, timeout_secs: u64) -> Result<ImageInput, Scan2TableError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if is_data_uri(input) {
        decode_data_uri(INLINE_IMAGE_NAME, input)
    } else {
        read_local(Path::new(input)).await
    }
}

/// Name reported for images passed inline as data URIs.
pub const INLINE_IMAGE_NAME: &str = "inline image";

async fn read_local(path: &Path) -> Result<ImageInput, Scan2TableError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Scan2TableError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Scan2TableError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Scan2TableError::FileReadFailed {
            name: display_name(path),
            reason: e.to_string(),
        },
    })?;

    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    ImageInput::from_bytes(display_name(path), bytes)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ImageInput, Scan2TableError> {
    info!("Downloading image from: {}", url);

    let failed = |reason: String| Scan2TableError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let header_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("image/"))
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(e.to_string()))?
        .to_vec();

    match sniff_media_type(&bytes, url) {
        Some(mime) => Ok(ImageInput::with_media_type(url, mime, bytes)),
        None => match header_type {
            Some(mime) => Ok(ImageInput::with_media_type(url, mime, bytes)),
            None => Err(Scan2TableError::NotAnImage {
                name: url.to_string(),
            }),
        },
    }
}
