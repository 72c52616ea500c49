//! Error types for the scan2table library.
//!
//! Every failure is fatal for the run that raised it: one extraction either
//! yields usable text or the whole operation fails. The variants are grouped
//! by the kind of message the user should see:
//!
//! * **Input**: a selected image could not be read; the message names it.
//! * **Service**: the model call itself failed (network, auth, quota,
//!   timeout). The provider's own message is passed through unchanged.
//! * **Empty result**: the call succeeded but returned no usable text.
//!   Kept separate from service errors because the remedy differs: check
//!   image clarity rather than the API key or network.
//!
//! Malformed tables (ragged rows, separator false-positives) are *not*
//! errors. See [`crate::pipeline::validate`] for an advisory report.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the scan2table library.
#[derive(Debug, Error)]
pub enum Scan2TableError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The extraction was triggered without any image.
    #[error("No images selected")]
    NoImages,

    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read image '{name}': {reason}")]
    FileReadFailed { name: String, reason: String },

    /// The bytes were read but are not a recognisable image.
    #[error("'{name}' is not a supported image (png, jpeg, webp, gif, bmp, tiff)")]
    NotAnImage { name: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── Service errors ────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error. `message` is the provider's own text.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The optional client-side timeout elapsed before the model answered.
    #[error("API call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Result errors ─────────────────────────────────────────────────────
    /// The model answered with empty or whitespace-only text.
    #[error("Could not extract a table from the images.\nMake sure the text in the images is clear and legible.")]
    EmptyResult,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Scan2TableError {
    /// True for errors raised by the model service rather than by local input
    /// or by an empty answer.
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            Scan2TableError::ProviderNotConfigured { .. }
                | Scan2TableError::LlmApiError { .. }
                | Scan2TableError::ApiTimeout { .. }
        )
    }
}
