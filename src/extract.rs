//! Extraction entry points.
//!
//! [`extract`] sends images already in memory; [`extract_files`] reads paths
//! or URLs first; [`extract_to_dir`] additionally writes the export files.
//! All of them issue exactly one model call per run and never retry.

use crate::config::{ExtractionConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::Scan2TableError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::export::{export, ExportFormat, ExportedFile};
use crate::pipeline::input::{load_images, ImageInput};
use crate::pipeline::llm;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the sixteen-column table from images held in memory.
///
/// # Errors
/// - [`Scan2TableError::NoImages`] when `images` is empty; no provider is
///   resolved and no request is sent.
/// - [`Scan2TableError::LlmApiError`] / [`Scan2TableError::ApiTimeout`] /
///   [`Scan2TableError::ProviderNotConfigured`] for service failures.
/// - [`Scan2TableError::EmptyResult`] when the model answered with no text.
pub async fn extract(
    images: &[ImageInput],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Scan2TableError> {
    let result = run_extraction(images, config).await;
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_error(&e.to_string());
    }
    result
}

async fn run_extraction(
    images: &[ImageInput],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Scan2TableError> {
    let total_start = Instant::now();
    if images.is_empty() {
        return Err(Scan2TableError::NoImages);
    }

    let provider = resolve_provider(config)?;
    let context_date = config.effective_context_date();
    info!(
        "Extracting table from {} images (context date {})",
        images.len(),
        context_date
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(images.len());
    }

    let reply = llm::request_table(&provider, images, &context_date, config).await?;

    let stats = ExtractionStats {
        image_count: images.len(),
        image_bytes: images.iter().map(|i| i.bytes.len()).sum(),
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        llm_duration_ms: reply.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} chars in {}ms",
        reply.markdown.len(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(reply.markdown.len(), stats.total_duration_ms);
    }

    Ok(ExtractionOutput {
        markdown: reply.markdown,
        context_date,
        images: images.iter().map(|i| i.name.clone()).collect(),
        stats,
    })
}

/// Read local paths or HTTP/HTTPS URLs, then extract.
///
/// Reads run concurrently; if any one fails the whole run fails with an
/// error naming that file, before any request is sent.
pub async fn extract_files<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Scan2TableError> {
    let start = Instant::now();
    if inputs.is_empty() {
        return Err(Scan2TableError::NoImages);
    }

    let inputs: Vec<String> = inputs.iter().map(|s| s.as_ref().to_string()).collect();
    let images = match load_images(
        &inputs,
        config.download_timeout_secs,
        config.progress_callback.as_ref(),
    )
    .await
    {
        Ok(images) => images,
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_error(&e.to_string());
            }
            return Err(e);
        }
    };

    let mut output = extract(&images, config).await?;
    output.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Extract and write one export file per requested format into `dir`.
pub async fn extract_to_dir<S: AsRef<str>>(
    inputs: &[S],
    dir: impl AsRef<Path>,
    formats: &[ExportFormat],
    config: &ExtractionConfig,
) -> Result<(ExtractionOutput, Vec<ExportedFile>), Scan2TableError> {
    let output = extract_files(inputs, config).await?;

    let mut files = Vec::with_capacity(formats.len());
    for &format in formats {
        files.push(export(&output.markdown, format, dir.as_ref()).await?);
    }
    Ok((output, files))
}

/// Synchronous wrapper around [`extract_files`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Scan2TableError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Scan2TableError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_files(inputs, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Scan2TableError> {
    debug!("Creating provider {} / {}", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Scan2TableError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`].
/// 3. **Environment pair** `SCAN2TABLE_PROVIDER` + `SCAN2TABLE_MODEL`.
/// 4. **Gemini key present** (`GEMINI_API_KEY`): the default provider.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, Scan2TableError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("SCAN2TABLE_PROVIDER"),
        std::env::var("SCAN2TABLE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return create_vision_provider(DEFAULT_PROVIDER, model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Scan2TableError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (or another provider's key) and try again.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
