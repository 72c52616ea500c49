//! Interactive session: a queue of selected images and a status machine.
//!
//! ```text
//!            analyze()             ok
//!   Idle ───────────────▶ Loading ─────▶ Success
//!    ▲                        │
//!    │   add / remove / reset │ err
//!    └──────────────────── Error
//! ```
//!
//! `analyze` with an empty queue is a no-op: no read, no request, no state
//! change. Any failure is turned into a single message string, available
//! through [`Session::error_message`]. Because `analyze` takes `&mut self`,
//! a second run cannot start while one is in flight.

use crate::config::ExtractionConfig;
use crate::error::Scan2TableError;
use crate::extract::extract;
use crate::output::ExtractionOutput;
use crate::pipeline::export::{export, ExportFormat, ExportedFile};
use crate::pipeline::input::load_sources;
pub use crate::pipeline::input::ImageSource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Transient state for one user working through one batch of images.
#[derive(Debug)]
pub struct Session {
    config: ExtractionConfig,
    queue: Vec<ImageSource>,
    status: SessionStatus,
    output: Option<ExtractionOutput>,
    error_message: Option<String>,
}

impl Session {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            queue: Vec::new(),
            status: SessionStatus::Idle,
            output: None,
            error_message: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn queue(&self) -> &[ImageSource] {
        &self.queue
    }

    pub fn output(&self) -> Option<&ExtractionOutput> {
        self.output.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Queue more images. Clears any previous result and returns to Idle.
    pub fn add<I: IntoIterator<Item = ImageSource>>(&mut self, sources: I) {
        let before = self.queue.len();
        self.queue.extend(sources);
        if self.queue.len() > before {
            self.status = SessionStatus::Idle;
            self.output = None;
            self.error_message = None;
        }
    }

    /// Queue paths or URLs to be read when the run starts.
    pub fn add_locations<I, S>(&mut self, locations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(locations.into_iter().map(|s| ImageSource::Location(s.into())));
    }

    /// Remove one queued image. Removing the last one clears the result.
    pub fn remove(&mut self, index: usize) -> Option<ImageSource> {
        if index >= self.queue.len() {
            return None;
        }
        let was_last = self.queue.len() <= 1;
        let removed = self.queue.remove(index);
        if was_last {
            self.output = None;
        }
        Some(removed)
    }

    /// Drop the queue and any result; back to Idle.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.status = SessionStatus::Idle;
        self.output = None;
        self.error_message = None;
    }

    /// Read every queued image and run the extraction.
    ///
    /// Returns the resulting status. With an empty queue nothing happens and
    /// the current status is returned unchanged.
    pub async fn analyze(&mut self) -> SessionStatus {
        if self.queue.is_empty() {
            debug!("analyze() with an empty queue: nothing to do");
            return self.status;
        }

        self.status = SessionStatus::Loading;
        self.error_message = None;

        let result = self.run().await;
        match result {
            Ok(output) => {
                self.output = Some(output);
                self.status = SessionStatus::Success;
            }
            Err(e) => {
                warn!("Extraction failed: {}", e);
                self.error_message = Some(e.to_string());
                self.status = SessionStatus::Error;
            }
        }
        self.status
    }

    async fn run(&self) -> Result<ExtractionOutput, Scan2TableError> {
        let progress = self.config.progress_callback.as_ref();
        let timeout = self.config.download_timeout_secs;
        let images = match load_sources(&self.queue, timeout, progress).await {
            Ok(images) => images,
            Err(e) => {
                if let Some(cb) = progress {
                    cb.on_error(&e.to_string());
                }
                return Err(e);
            }
        };
        extract(&images, &self.config).await
    }

    /// Write the current result in each format. Empty when there is no result.
    pub async fn export(
        &self,
        formats: &[ExportFormat],
        dir: impl AsRef<Path>,
    ) -> Result<Vec<ExportedFile>, Scan2TableError> {
        let Some(ref output) = self.output else {
            return Ok(Vec::new());
        };
        let mut files = Vec::with_capacity(formats.len());
        for &format in formats {
            files.push(export(&output.markdown, format, dir.as_ref()).await?);
        }
        Ok(files)
    }
}
