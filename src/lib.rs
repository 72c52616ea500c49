//! # scan2table
//!
//! Extract a sixteen-column project table from scanned document images using
//! a Vision Language Model, and export it as CSV or markdown.
//!
//! The model does the reading. This crate builds the one request (every
//! image plus a fixed instruction that pins column order, constant values
//! and date format), passes the answer through untouched, and turns the
//! pipe-table text into rows, previews and a spreadsheet-friendly CSV.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images (paths / URLs / bytes)
//!  │
//!  ├─ 1. Input    read all images concurrently; one failure fails the run
//!  ├─ 2. Encode   bytes → base64 ImageData
//!  ├─ 3. VLM      one call with every image + instruction (gemini by default)
//!  ├─ 4. Table    pipe-table text → rows → CSV (BOM) / HTML preview
//!  └─ 5. Export   table-export-<ms>.md / table-export-<ms>.csv
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scan2table::{extract_files, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY (or another provider's key)
//!     let config = ExtractionConfig::default();
//!     let output = extract_files(&["page-1.jpg", "page-2.jpg"], &config).await?;
//!     println!("{}", output.markdown);
//!     std::fs::write("table.csv", output.to_csv()?)?;
//!     Ok(())
//! }
//! ```
//!
//! The table transform needs no API key:
//!
//! ```rust
//! use scan2table::Table;
//!
//! let table = Table::parse("| 編號 | 名稱 |\n|---|---|\n| IM250001 | 測試案, A |");
//! assert_eq!(table.len(), 2);
//! assert!(table.to_csv().unwrap().starts_with('\u{FEFF}'));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scan2table` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::Scan2TableError;
pub use extract::{extract, extract_files, extract_sync, extract_to_dir};
pub use output::{ExtractionOutput, ExtractionStats};
pub use pipeline::export::{ExportFormat, ExportedFile};
pub use pipeline::input::ImageInput;
pub use pipeline::table::{markdown_to_csv, markdown_to_html, Table, TableRow};
pub use pipeline::validate::{validate, Issue, ValidationReport};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{ImageSource, Session, SessionStatus};
