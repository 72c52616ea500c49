//! Configuration types for image-to-table extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The knobs are deliberately few: the
//! request is a single call with a fixed instruction, so most of the config
//! is about *which* model answers it.

use crate::error::Scan2TableError;
use crate::progress::ProgressCallback;
use chrono::NaiveDate;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Provider used when neither the config nor the environment names one.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used when the config does not name one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Configuration for one extraction run.
///
/// # Example
/// ```rust
/// use scan2table::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-2.5-flash")
///     .context_date("2026-01-31")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gemini-2.5-pro". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is resolved from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Transcription wants the model to copy what it sees, not to be creative.
    pub temperature: f32,

    /// Maximum tokens the model may generate for the whole table. Default: 8192.
    ///
    /// Multi-page uploads merge into one table, so the budget covers every
    /// row of every image.
    pub max_tokens: usize,

    /// Date substituted into the instruction (`YYYY-MM-DD`). If None, today's
    /// local date is used at extraction time.
    pub context_date: Option<String>,

    /// Custom instruction template. If None, uses
    /// [`crate::prompts::DEFAULT_INSTRUCTION`].
    pub instruction: Option<String>,

    /// Optional client-side timeout for the model call, in seconds.
    /// Default: None (bounded only by the provider's own timeout).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for image URLs in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 8192,
            context_date: None,
            instruction: None,
            api_timeout_secs: None,
            download_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("context_date", &self.context_date)
            .field("instruction", &self.instruction.as_ref().map(|s| s.len()))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured context date, or today's date in UTC.
    pub fn effective_context_date(&self) -> String {
        self.context_date
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn context_date(mut self, date: impl Into<String>) -> Self {
        self.config.context_date = Some(date.into());
        self
    }

    pub fn instruction(mut self, template: impl Into<String>) -> Self {
        self.config.instruction = Some(template.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Attach a progress callback.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Scan2TableError> {
        let c = &self.config;
        if let Some(ref date) = c.context_date {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(Scan2TableError::InvalidConfig(format!(
                    "Context date must be YYYY-MM-DD, got '{}'",
                    date
                )));
            }
        }
        if c.max_tokens == 0 {
            return Err(Scan2TableError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(Scan2TableError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 8192);
        assert!(c.api_timeout_secs.is_none());
        assert!(c.provider.is_none());
    }

    #[test]
    fn rejects_malformed_context_date() {
        let err = ExtractionConfig::builder()
            .context_date("2026/10/15")
            .build()
            .unwrap_err();
        assert!(matches!(err, Scan2TableError::InvalidConfig(_)));
    }

    #[test]
    fn default_context_date_is_the_utc_day() {
        let before = chrono::Utc::now().date_naive();
        let date = ExtractionConfig::default().effective_context_date();
        let after = chrono::Utc::now().date_naive();

        let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap();
        assert!(parsed == before || parsed == after, "{date}");
    }

    #[test]
    fn explicit_context_date_wins_over_today() {
        let c = ExtractionConfig::builder()
            .context_date("2025-09-01")
            .build()
            .unwrap();
        assert_eq!(c.effective_context_date(), "2025-09-01");
    }

    #[test]
    fn today_is_formatted_as_iso_date() {
        let today = ExtractionConfig::default().effective_context_date();
        assert!(NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok(), "got {today}");
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ExtractionConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_is_invalid() {
        assert!(ExtractionConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_hides_instruction_text() {
        let c = ExtractionConfig::builder()
            .instruction("secret template {upload_date}")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret template"));
    }
}
