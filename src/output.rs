//! Result types returned by the extraction entry points.

use crate::error::Scan2TableError;
use crate::pipeline::table::Table;
use crate::pipeline::validate::{validate, ValidationReport};
use serde::{Deserialize, Serialize};

/// Everything produced by one successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The model's answer, unmodified. Exported as-is to `.md`.
    pub markdown: String,
    /// Date substituted into the instruction (`YYYY-MM-DD`).
    pub context_date: String,
    /// Image names in the order they were sent.
    pub images: Vec<String>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Parse the answer into rows.
    pub fn table(&self) -> Table {
        Table::parse(&self.markdown)
    }

    /// BOM-prefixed CSV of the answer.
    pub fn to_csv(&self) -> Result<String, Scan2TableError> {
        self.table().to_csv()
    }

    /// Check the answer against the sixteen-column contract.
    pub fn validate(&self) -> ValidationReport {
        validate(&self.table())
    }
}

/// Size, token and timing figures for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub image_count: usize,
    /// Sum of raw image sizes before base64.
    pub image_bytes: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
