//! CLI binary for scan2table.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one session and writes the exports.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scan2table::pipeline::export::write_atomic;
use scan2table::{
    ExportFormat, ExtractionConfig, ExtractionProgressCallback, ProgressCallback, Session,
    SessionStatus,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while images are read and the model is working.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self::with_bar(ProgressBar::new_spinner()))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_load_start(&self, image_count: usize) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(format!("{image_count} images…"));
    }

    fn on_image_loaded(&self, name: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            name,
            dim(&format!("{:.1} KB", bytes as f64 / 1024.0))
        ));
    }

    fn on_request_start(&self, image_count: usize) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("sending {image_count} images to the model…"));
    }

    fn on_complete(&self, markdown_len: usize, duration_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} table extracted  {}",
            green("✔"),
            dim(&format!(
                "{markdown_len} chars, {:.1}s",
                duration_ms as f64 / 1000.0
            )),
        );
    }

    // The failure itself is reported once, by `main`.
    fn on_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract, print markdown, write table-export-<ms>.md and .csv here
  scan2table scan-1.jpg scan-2.jpg

  # CSV only, into ./exports
  scan2table --format csv --out-dir exports contract.png

  # Fix the fallback signing date instead of using today
  scan2table --date 2025-09-01 scan.jpg

  # Show a row preview and check the 16-column contract
  scan2table --preview --validate scan.jpg

  # Images from URLs, JSON output
  scan2table --json https://example.com/scan.png > result.json

OUTPUT COLUMNS:
  專案編號 | 專案名稱 | 統一編號 | 客戶名稱 | 案源 | 部門 | 9/1新部門 | 專案類型 |
  預估工時 | 專案簽立 | 起 | 迄 | 期數 | 收款條件 | 委刊總金額(未稅) | 委刊總金額含稅

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  SCAN2TABLE_PROVIDER     Override provider (gemini, openai, anthropic, ollama)
  SCAN2TABLE_MODEL        Override model ID
"#;

/// Extract a 16-column project table from scanned document images.
#[derive(Parser, Debug)]
#[command(
    name = "scan2table",
    version,
    about = "Extract a 16-column project table from scanned document images using Vision LLMs",
    long_about = "Send one or more scanned document images to a Vision Language Model in a \
single request, receive a 16-column markdown table, and export it as markdown and \
BOM-prefixed CSV that spreadsheet software opens correctly in any locale.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file paths or HTTP/HTTPS URLs, in page order.
    #[arg(required = true)]
    images: Vec<String>,

    /// Directory for table-export-<ms>.{md,csv}.
    #[arg(short, long, env = "SCAN2TABLE_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Export files to write: md, csv, both, none.
    #[arg(long, env = "SCAN2TABLE_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// Date used when a document omits the signing date (YYYY-MM-DD). Default: today.
    #[arg(long, env = "SCAN2TABLE_DATE")]
    date: Option<String>,

    /// LLM model ID (e.g. gemini-2.5-pro, gemini-2.5-flash, gpt-4.1).
    #[arg(long, env = "SCAN2TABLE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "SCAN2TABLE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file replacing the built-in instruction ({upload_date} is substituted).
    #[arg(long, env = "SCAN2TABLE_INSTRUCTION")]
    instruction: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "SCAN2TABLE_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SCAN2TABLE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Client-side timeout for the model call in seconds. Default: none.
    #[arg(long, env = "SCAN2TABLE_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout for image URLs in seconds.
    #[arg(long, env = "SCAN2TABLE_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Print a row preview to stderr.
    #[arg(long)]
    preview: bool,

    /// Write an HTML table preview to this file.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Check rows against the 16-column contract and print warnings.
    #[arg(long, env = "SCAN2TABLE_VALIDATE")]
    validate: bool,

    /// Output structured JSON (ExtractionOutput) instead of markdown.
    #[arg(long, env = "SCAN2TABLE_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SCAN2TABLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCAN2TABLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCAN2TABLE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Md,
    Csv,
    Both,
    None,
}

impl FormatArg {
    fn formats(self) -> Vec<ExportFormat> {
        match self {
            FormatArg::Md => vec![ExportFormat::Markdown],
            FormatArg::Csv => vec![ExportFormat::Csv],
            FormatArg::Both => vec![ExportFormat::Markdown, ExportFormat::Csv],
            FormatArg::None => Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let mut session = Session::new(config);
    session.add_locations(cli.images.iter().cloned());

    if session.analyze().await == SessionStatus::Error {
        let msg = session
            .error_message()
            .unwrap_or("Extraction failed")
            .to_string();
        anyhow::bail!("{} {}", red("✘"), msg);
    }
    let output = session
        .output()
        .context("Extraction finished without a result")?;

    // ── Primary output ───────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
    }

    let table = output.table();

    if cli.preview && !cli.quiet {
        eprintln!("{}", bold(&format!("Preview ({} rows)", table.len())));
        for (i, line) in table.to_text_preview().lines().enumerate() {
            if i == 0 {
                eprintln!("  {}", bold(line));
            } else {
                eprintln!("  {line}");
            }
        }
    }

    if cli.validate {
        let report = output.validate();
        if report.is_clean() {
            if !cli.quiet {
                eprintln!("{} {} rows match the 16-column contract", green("✔"), report.rows_checked);
            }
        } else {
            for issue in &report.issues {
                eprintln!("{} {}", yellow("⚠"), issue);
            }
        }
    }

    if let Some(ref path) = cli.html {
        write_atomic(path, table.to_html().as_bytes())
            .await
            .with_context(|| format!("Failed to write HTML preview to {:?}", path))?;
    }

    // ── Exports ──────────────────────────────────────────────────────────
    let files = session
        .export(&cli.format.formats(), &cli.out_dir)
        .await
        .context("Export failed")?;

    if !cli.quiet {
        for file in &files {
            eprintln!(
                "   {}  {}",
                bold(&file.path.display().to_string()),
                dim(&file.media_type)
            );
        }
        eprintln!(
            "   {} images  {} tokens in  /  {} tokens out  ·  {}ms total",
            output.stats.image_count,
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.instruction {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction from {:?}", path))?;
        builder = builder.instruction(text);
    }
    if let Some(ref date) = cli.date {
        builder = builder.context_date(date.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_only_stops_the_spinner() {
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden());
        cb.on_load_start(2);
        cb.on_error("File not found: /scans/page-3.jpg");
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn format_flag_maps_to_exports() {
        assert_eq!(
            FormatArg::Both.formats(),
            vec![ExportFormat::Markdown, ExportFormat::Csv]
        );
        assert_eq!(FormatArg::Csv.formats(), vec![ExportFormat::Csv]);
        assert!(FormatArg::None.formats().is_empty());
    }

    #[test]
    fn cli_flags_reach_the_config() {
        let cli = Cli::parse_from([
            "scan2table",
            "--date",
            "2025-09-01",
            "--api-timeout",
            "30",
            "--format",
            "csv",
            "scan.jpg",
        ]);
        assert_eq!(cli.images, ["scan.jpg"]);
        assert_eq!(cli.api_timeout, Some(30));
        assert_eq!(cli.date.as_deref(), Some("2025-09-01"));
    }
}
