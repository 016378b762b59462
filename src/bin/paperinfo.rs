//! CLI binary for edgequake-paperinfo.
//!
//! A thin shim over the library crate: `extract` maps flags onto
//! `ExtractionConfig` and prints the record, `serve` runs the upload server.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_paperinfo::extract::read_document;
use edgequake_paperinfo::present::render_record_text;
use edgequake_paperinfo::server::{self, AppState};
use edgequake_paperinfo::{
    preview_text, ExtractionConfig, Extractor, ParseMode, PipelineObserver, PipelineState,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner that follows the pipeline state machine.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineObserver for SpinnerObserver {
    fn on_transition(&self, state: &PipelineState) {
        match state {
            PipelineState::Idle => {}
            PipelineState::TextExtracted { pages_read, chars } => {
                self.bar
                    .set_message(format!("read {chars} chars from {pages_read} page(s)"));
            }
            PipelineState::PromptBuilt { .. } => {
                self.bar.set_message("waiting for the language model…");
            }
            PipelineState::ReplyReceived { chars } => {
                self.bar.set_message(format!("parsing {chars}-char reply"));
            }
            PipelineState::RecordReady { available_fields } => {
                self.bar.finish_and_clear();
                eprintln!(
                    "{} {}/5 fields extracted",
                    green("✔"),
                    bold(&available_fields.to_string())
                );
            }
            PipelineState::Failed { reason } => {
                self.bar.finish_and_clear();
                eprintln!("{} extraction failed ({})", red("✘"), reason);
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract the five fields from a paper
  paperinfo extract paper.pdf

  # JSON output, a different model
  paperinfo extract --json --model gpt-4.1-mini paper.pdf

  # Show the text the model would see (no API key needed)
  paperinfo extract --text-only paper.pdf

  # Run the upload form on port 8000
  paperinfo serve --addr 0.0.0.0:8000

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory or file of libpdfium
  RUST_LOG                Log filter (overrides -v / -q)

A .env file in the working directory is loaded at startup.
"#;

/// Extract title, abstract, authors, emails and a conclusion summary from
/// research-paper PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "paperinfo",
    version,
    about = "Extract key information from research-paper PDFs using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPERINFO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAPERINFO_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the five fields from a local PDF.
    Extract {
        /// Path to the PDF file.
        file: PathBuf,

        /// Print the record as JSON.
        #[arg(long, env = "PAPERINFO_JSON")]
        json: bool,

        /// Print the extracted text only; the language model is not called.
        #[arg(long)]
        text_only: bool,

        #[command(flatten)]
        options: ConfigArgs,
    },

    /// Serve the upload form and the JSON API over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, env = "PAPERINFO_ADDR", default_value = "0.0.0.0:8000")]
        addr: SocketAddr,

        #[command(flatten)]
        options: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Pages read from the front of the document.
    #[arg(long, env = "PAPERINFO_MAX_PAGES", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: u32,

    /// Largest accepted document in bytes.
    #[arg(long, env = "PAPERINFO_MAX_BYTES", default_value_t = 5 * 1024 * 1024)]
    max_bytes: usize,

    /// LLM model ID (e.g. gpt-4, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PAPERINFO_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PAPERINFO_MAX_TOKENS", default_value_t = 1000)]
    max_tokens: usize,

    /// Keep only exact `Label: value` lines; drop continuation lines.
    #[arg(long, env = "PAPERINFO_STRICT")]
    strict: bool,

    /// Directory or file of the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

fn build_config(args: &ConfigArgs) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_pages(args.max_pages as usize)
        .max_document_bytes(args.max_bytes)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .parse_mode(if args.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        });

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }

    builder.build().context("Invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers the interactive case; INFO logs would tear it.
    let interactive = matches!(
        cli.command,
        Command::Extract {
            json: false,
            text_only: false,
            ..
        }
    );
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || interactive {
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

    match cli.command {
        Command::Extract {
            file,
            json,
            text_only,
            options,
        } => {
            let config = build_config(&options)?;

            if text_only {
                let text = preview_text(&file, &config)
                    .await
                    .with_context(|| format!("Failed to read text from {}", file.display()))?;
                println!("{}", text.text);
                if !cli.quiet {
                    eprintln!(
                        "{} {} chars from {}/{} page(s)",
                        green("✔"),
                        text.char_count(),
                        text.pages_read,
                        text.page_count
                    );
                }
                return Ok(());
            }

            let document = read_document(&file, &config)
                .await
                .with_context(|| format!("Cannot extract from {}", file.display()))?;

            let mut extractor = Extractor::from_config(config)?;
            if interactive && !cli.quiet {
                extractor = extractor.with_observer(SpinnerObserver::new());
            }

            let record = extractor.run(document).await.context("Extraction failed")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&record).context("Failed to serialize record")?
                );
            } else {
                print!("{}", render_record_text(&record));
            }
        }

        Command::Serve { addr, options } => {
            let config = build_config(&options)?;
            let extractor = Extractor::from_config(config)?;
            server::serve(addr, AppState::new(extractor))
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
        }
    }

    Ok(())
}
