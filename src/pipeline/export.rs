//! Export files: raw markdown and BOM-prefixed CSV.
//!
//! File names follow `table-export-<epoch-milliseconds>.<ext>`. Writes are
//! atomic (temp file + rename) so a crash never leaves half a CSV behind.

use crate::error::Scan2TableError;
use crate::pipeline::table::markdown_to_csv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// File-name prefix shared by every export.
pub const FILE_PREFIX: &str = "table-export";

/// Which export to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Raw response text, unmodified.
    Markdown,
    /// Quote-escaped, BOM-prefixed CSV.
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Csv => "text/csv;charset=utf-8",
        }
    }

    /// Render the export body from the raw model answer.
    pub fn render(self, markdown: &str) -> Result<String, Scan2TableError> {
        match self {
            ExportFormat::Markdown => Ok(markdown.to_string()),
            ExportFormat::Csv => markdown_to_csv(markdown),
        }
    }
}

/// A file written by [`export`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub media_type: String,
    pub bytes: usize,
}

/// `table-export-<millis>.<ext>`
pub fn export_file_name(format: ExportFormat, epoch_millis: i64) -> String {
    format!("{}-{}.{}", FILE_PREFIX, epoch_millis, format.extension())
}

/// Write `markdown` in the given format into `dir`, named with the current time.
pub async fn export(
    markdown: &str,
    format: ExportFormat,
    dir: impl AsRef<Path>,
) -> Result<ExportedFile, Scan2TableError> {
    let millis = chrono::Utc::now().timestamp_millis();
    let path = dir.as_ref().join(export_file_name(format, millis));
    let body = format.render(markdown)?;

    write_atomic(&path, body.as_bytes()).await?;
    info!("Exported {} ({} bytes)", path.display(), body.len());

    Ok(ExportedFile {
        path,
        format,
        media_type: format.media_type().to_string(),
        bytes: body.len(),
    })
}

/// Write to a sibling temp file, then rename over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Scan2TableError> {
    let write_failed = |source: std::io::Error| Scan2TableError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    Ok(())
}
