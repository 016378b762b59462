//! # edgequake-paperinfo
//!
//! Extract five fields from a research paper PDF with a language model:
//! title, abstract, authors, author emails and a summary of the conclusion.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document (PDF bytes + declared media type)
//!  │
//!  ├─ 1. Admit    media type and size checked at the upload boundary
//!  ├─ 2. Text     first `max_pages` pages via pdfium (spawn_blocking)
//!  ├─ 3. Prompt   fixed five-field instruction template
//!  ├─ 4. LLM      one call to gpt-4 / claude / gemini / ollama / …
//!  └─ 5. Parse    `Label: value` lines → FieldRecord ("Not available" fallback)
//! ```
//!
//! Every step that can fail returns a typed [`ExtractError`]; parsing never
//! fails. A document without extractable text stops before the paid call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_paperinfo::{extract_file, ExtractionConfig, FieldName};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let record = extract_file("paper.pdf", &config).await?;
//!     println!("{}", record.get(FieldName::Title));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum upload boundary ([`server::router`]) |
//! | `cli`    | on      | The `paperinfo` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-paperinfo = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod present;
pub mod progress;
pub mod prompts;
pub mod record;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use document::{admit_upload, Document};
pub use error::{ExtractError, UpstreamError};
pub use extract::{extract_bytes, extract_file, extract_file_sync, preview_text, Extractor};
pub use pipeline::llm::{ExtractionClient, RawReply};
pub use pipeline::parse::{parse_reply, ParseMode};
pub use pipeline::text::{ExtractedText, TextExtractor};
pub use progress::{FailureReason, PipelineObserver, PipelineState};
pub use prompts::{build_prompt, Prompt};
pub use record::{FieldName, FieldRecord, NOT_AVAILABLE};
