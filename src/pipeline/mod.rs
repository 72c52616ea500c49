//! Pipeline stages for image-to-table extraction.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ table ──▶ export
//! (path/URL) (base64)  (VLM)   (rows)    (.md / .csv)
//!                                 └──▶ validate (advisory)
//! ```
//!
//! 1. [`input`]: read every selected image concurrently; one failure fails all
//! 2. [`encode`]: base64-wrap each image for the multimodal request body
//! 3. [`llm`]: the single model call; the only stage with network I/O
//!    besides URL downloads
//! 4. [`table`]: parse pipe-table text into rows; CSV and HTML previews
//! 5. [`export`]: write `table-export-<ms>.md` / `.csv`
//! 6. [`validate`]: report rows that break the sixteen-column contract

pub mod encode;
pub mod export;
pub mod input;
pub mod llm;
pub mod table;
pub mod validate;
