//! The extraction pipeline orchestrator and its convenience entry points.
//!
//! [`Extractor::run`] is the single entry point every transport calls:
//! it takes ownership of a [`Document`], walks the pipeline states of
//! [`crate::progress::PipelineState`] and returns either a complete
//! [`FieldRecord`] or a typed [`ExtractError`]. The document bytes are
//! dropped by the time `run` returns, whatever the outcome.
//!
//! An `Extractor` holds no per-invocation state. Clone it (all parts are
//! behind `Arc`) and call `run` from as many tasks as you like; the only
//! suspension point is the language-model call.

use crate::config::ExtractionConfig;
use crate::document::{admit_upload, sniff_media_type, Document};
use crate::error::ExtractError;
use crate::pipeline::llm::{ExtractionClient, LlmExtractionClient};
use crate::pipeline::parse::parse_reply;
use crate::pipeline::text::{ExtractedText, PdfiumTextExtractor, TextExtractor};
use crate::progress::{Observer, PipelineState};
use crate::prompts::{build_prompt, preview, LOG_PREVIEW_CHARS};
use crate::record::FieldRecord;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs documents through text extraction, prompting, the LLM call and
/// reply parsing.
#[derive(Clone)]
pub struct Extractor {
    config: Arc<ExtractionConfig>,
    text: Arc<dyn TextExtractor>,
    client: Arc<dyn ExtractionClient>,
    observer: Option<Observer>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl Extractor {
    /// Build the production pipeline: pdfium for text, the configured (or
    /// auto-detected) `edgequake-llm` provider for the call.
    ///
    /// Provider credentials are read here, once.
    pub fn from_config(config: ExtractionConfig) -> Result<Self, ExtractError> {
        let (provider, label) = resolve_provider(&config)?;
        info!(
            "Using provider '{}' with model '{}'",
            label,
            config.model_or_default()
        );
        let client = LlmExtractionClient::new(provider, label, &config);
        let text = PdfiumTextExtractor::new(config.pdfium_lib_path.clone());
        Ok(Self::with_components(
            config,
            Arc::new(text),
            Arc::new(client),
        ))
    }

    /// Assemble a pipeline from explicit parts.
    pub fn with_components(
        config: ExtractionConfig,
        text: Arc<dyn TextExtractor>,
        client: Arc<dyn ExtractionClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            text,
            client,
            observer: None,
        }
    }

    /// Report every state transition to `observer`.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run one document through the pipeline.
    ///
    /// # Errors
    /// - [`ExtractError::InvalidDocument`]: not a PDF (declared type or bytes)
    /// - [`ExtractError::OversizeDocument`]: larger than `max_document_bytes`
    /// - [`ExtractError::EmptyDocument`]: no text in the first `max_pages`
    ///   pages; the service is not called
    /// - [`ExtractError::Upstream`]: the service call failed; no partial
    ///   record is produced
    pub async fn run(&self, document: Document) -> Result<FieldRecord, ExtractError> {
        let start = Instant::now();
        info!("Starting extraction: {} bytes", document.len());
        self.observe(&PipelineState::Idle);

        match self.run_stages(document).await {
            Ok(record) => {
                info!(
                    "Extraction complete: {}/5 fields in {}ms",
                    record.available_count(),
                    start.elapsed().as_millis()
                );
                Ok(record)
            }
            Err(e) => {
                warn!("Extraction failed ({}): {}", e.reason(), e);
                self.observe(&PipelineState::Failed { reason: e.reason() });
                Err(e)
            }
        }
    }

    async fn run_stages(&self, document: Document) -> Result<FieldRecord, ExtractError> {
        // ── Step 1: Admit ────────────────────────────────────────────────────
        if !document.is_pdf_media_type() {
            return Err(ExtractError::invalid_document(format!(
                "only PDF files are allowed (got '{}')",
                document.media_type()
            )));
        }
        if document.len() > self.config.max_document_bytes {
            return Err(ExtractError::OversizeDocument {
                size: document.len(),
                limit: self.config.max_document_bytes,
            });
        }

        // ── Step 2: Extract text ─────────────────────────────────────────────
        let extracted = self
            .text
            .extract(document.into_bytes(), self.config.max_pages)
            .await?;
        self.observe(&PipelineState::TextExtracted {
            pages_read: extracted.pages_read,
            chars: extracted.char_count(),
        });
        if extracted.is_blank() {
            return Err(ExtractError::EmptyDocument {
                pages_read: extracted.pages_read,
            });
        }

        // ── Step 3: Build prompt ─────────────────────────────────────────────
        let prompt = build_prompt(extracted.as_str());
        drop(extracted);
        info!(
            "Prompt prepared for extraction: {}...",
            preview(prompt.as_str(), LOG_PREVIEW_CHARS)
        );
        self.observe(&PipelineState::PromptBuilt {
            chars: prompt.as_str().chars().count(),
        });

        // ── Step 4: Call the service ─────────────────────────────────────────
        let reply = self.client.call(&prompt).await?;
        debug!("Extracted information: {}", reply.content);
        self.observe(&PipelineState::ReplyReceived {
            chars: reply.content.chars().count(),
        });

        // ── Step 5: Parse ────────────────────────────────────────────────────
        let record = parse_reply(&reply.content, self.config.parse_mode);
        self.observe(&PipelineState::RecordReady {
            available_fields: record.available_count(),
        });
        Ok(record)
    }

    fn observe(&self, state: &PipelineState) {
        debug!("Pipeline state: {}", state);
        if let Some(ref obs) = self.observer {
            obs.on_transition(state);
        }
    }
}

/// Extract the five fields from a local PDF file.
///
/// Applies the same admission rules as the HTTP upload boundary (PDF only,
/// `max_document_bytes`), then builds a production [`Extractor`].
pub async fn extract_file(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<FieldRecord, ExtractError> {
    let document = read_document(path.as_ref(), config).await?;
    Extractor::from_config(config.clone())?.run(document).await
}

/// Extract the five fields from PDF bytes in memory.
pub async fn extract_bytes(
    bytes: Vec<u8>,
    config: &ExtractionConfig,
) -> Result<FieldRecord, ExtractError> {
    admit_upload(Some(crate::document::PDF_MEDIA_TYPE), bytes.len(), config)?;
    Extractor::from_config(config.clone())?
        .run(Document::pdf(bytes))
        .await
}

/// Synchronous wrapper around [`extract_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_file_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<FieldRecord, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_file(path, config))
}

/// Return the bounded text the service would see, without calling it.
///
/// Does not require an LLM provider or API key.
pub async fn preview_text(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractedText, ExtractError> {
    let document = read_document(path.as_ref(), config).await?;
    PdfiumTextExtractor::new(config.pdfium_lib_path.clone())
        .extract(document.into_bytes(), config.max_pages)
        .await
}

/// Read a local file into an admitted [`Document`].
pub async fn read_document(path: &Path, config: &ExtractionConfig) -> Result<Document, ExtractError> {
    let io_err = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    };

    // Refuse oversize files before reading them into memory.
    let meta = tokio::fs::metadata(path).await.map_err(io_err)?;
    let len = usize::try_from(meta.len()).unwrap_or(usize::MAX);
    if len > config.max_document_bytes {
        return Err(ExtractError::OversizeDocument {
            size: len,
            limit: config.max_document_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(io_err)?;
    let media_type = sniff_media_type(path, &bytes);
    admit_upload(Some(media_type), bytes.len(), config)?;
    debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), media_type);

    Ok(Document::new(bytes, media_type))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider + model** (`config.provider_name`): the factory
///    reads the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present**: OpenAI with the configured model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// Returns the provider and the label used for it in logs and errors.
fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<(Arc<dyn LLMProvider>, String), ExtractError> {
    if let Some(ref provider) = config.provider {
        let label = config.provider_name.clone().unwrap_or_else(|| "custom".to_string());
        return Ok((Arc::clone(provider), label));
    }

    let model = config.model_or_default();

    if let Some(ref name) = config.provider_name {
        return Ok((create_provider(name, model)?, name.clone()));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let model = config.model.as_deref().unwrap_or(&env_model);
            return Ok((create_provider(&prov, model)?, prov));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return Ok((create_provider("openai", model)?, "openai".to_string()));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn read_document_missing_file() {
        let config = ExtractionConfig::default();
        let err = read_document(Path::new("/definitely/not/here.pdf"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn read_document_rejects_non_pdf() {
        let mut tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        tmp.write_all(b"just some notes").unwrap();
        let config = ExtractionConfig::default();
        let err = read_document(tmp.path(), &config).await.unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDocument { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn read_document_rejects_oversize_before_reading() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        tmp.write_all(&[b' '; 64]).unwrap();
        let config = ExtractionConfig::builder()
            .max_document_bytes(16)
            .build()
            .unwrap();
        let err = read_document(tmp.path(), &config).await.unwrap_err();
        assert!(matches!(err, ExtractError::OversizeDocument { limit: 16, .. }));
    }

    #[tokio::test]
    async fn read_document_accepts_pdf_by_magic() {
        let mut tmp = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4\n%fake").unwrap();
        let config = ExtractionConfig::default();
        let doc = tokio_test::assert_ok!(read_document(tmp.path(), &config).await);
        assert!(doc.is_pdf_media_type());
        assert_eq!(doc.len(), 14);
    }
}
