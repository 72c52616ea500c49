//! VLM interaction: build the single extraction request and call the provider.
//!
//! One user message carries every image, in selection order, followed by the
//! instruction text. There is no retry: the call either returns usable text
//! or the run fails. An empty answer is reported as
//! [`Scan2TableError::EmptyResult`] so callers can tell "the model saw
//! nothing" apart from "the service failed".

use crate::config::ExtractionConfig;
use crate::error::Scan2TableError;
use crate::pipeline::encode::encode_image;
use crate::pipeline::input::ImageInput;
use crate::prompts::{render_instruction, DEFAULT_INSTRUCTION};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Raw answer from the model plus accounting.
#[derive(Debug, Clone)]
pub struct ModelReply {
    /// The response text, unmodified.
    pub markdown: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Send all images and the instruction in one request.
pub async fn request_table(
    provider: &Arc<dyn LLMProvider>,
    images: &[ImageInput],
    context_date: &str,
    config: &ExtractionConfig,
) -> Result<ModelReply, Scan2TableError> {
    let start = Instant::now();
    let template = config.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION);
    let instruction = render_instruction(template, context_date);

    let messages = build_messages(images, &instruction);
    let options = build_options(config);

    let response = bounded_call(
        provider.chat(&messages, Some(&options)),
        config.api_timeout_secs,
    )
    .await?;

    let duration = start.elapsed();
    debug!(
        "{} input tokens, {} output tokens, {:?}",
        response.prompt_tokens, response.completion_tokens, duration
    );

    Ok(ModelReply {
        markdown: table_text(response.content)?,
        input_tokens: response.prompt_tokens as u64,
        output_tokens: response.completion_tokens as u64,
        duration_ms: duration.as_millis() as u64,
    })
}

/// Await one provider call, bounded by the optional timeout.
///
/// Provider failures become [`Scan2TableError::LlmApiError`] carrying the
/// provider's message unchanged; an elapsed timeout becomes
/// [`Scan2TableError::ApiTimeout`].
pub async fn bounded_call<F, T, E>(
    call: F,
    api_timeout_secs: Option<u64>,
) -> Result<T, Scan2TableError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let result = match api_timeout_secs {
        Some(secs) => timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| Scan2TableError::ApiTimeout { secs })?,
        None => call.await,
    };

    result.map_err(|e| {
        let message = format!("{}", e);
        warn!("Extraction call failed: {}", message);
        Scan2TableError::LlmApiError { message }
    })
}

/// Build the request: one user turn with every image and the instruction.
pub fn build_messages(images: &[ImageInput], instruction: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user_with_images(instruction, attachments(images))]
}

/// Encoded images in selection order.
pub fn attachments(images: &[ImageInput]) -> Vec<ImageData> {
    images.iter().map(encode_image).collect()
}

/// Accept the model's text unless it is empty.
pub fn table_text(content: String) -> Result<String, Scan2TableError> {
    if content.trim().is_empty() {
        return Err(Scan2TableError::EmptyResult);
    }
    Ok(content)
}

fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
