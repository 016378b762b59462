//! Configuration for research-paper field extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The config is constructed once at
//! process start and handed to [`crate::extract::Extractor`]; no component
//! reads ambient global state after that, so concurrent invocations share
//! it read-only.

use crate::error::ExtractError;
use crate::pipeline::parse::ParseMode;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default upload limit: 5 MiB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Configuration for one extraction service.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_paperinfo::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_pages(3)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 3);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Pages read from the front of the document. Default: 5.
    ///
    /// Title, authors and abstract sit on page one; the conclusion of a short
    /// paper is usually within five pages. Pages past the limit are never
    /// read, which bounds the cost of arbitrarily long uploads.
    pub max_pages: usize,

    /// Largest accepted document in bytes. Default: 5 MiB.
    pub max_document_bytes: usize,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 1000.
    ///
    /// A full abstract plus a conclusion summary fits comfortably; lower
    /// values risk cutting the last field off mid-sentence.
    pub max_tokens: usize,

    /// Nucleus sampling. Default: 1.0.
    pub top_p: f32,

    /// Default: 0.0.
    pub frequency_penalty: f32,

    /// Default: 0.0.
    pub presence_penalty: f32,

    /// Custom system message. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// How tolerant the reply parser is. Default: [`ParseMode::Lenient`].
    pub parse_mode: ParseMode,

    /// Directory (or full path) of the pdfium shared library.
    /// If None, the working directory and then the system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            system_prompt: None,
            parse_mode: ParseMode::default(),
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_pages", &self.max_pages)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .field("system_prompt", &self.system_prompt)
            .field("parse_mode", &self.parse_mode)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
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

    /// The model that will be requested.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn max_document_bytes(mut self, n: usize) -> Self {
        self.config.max_document_bytes = n;
        self
    }

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

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn frequency_penalty(mut self, v: f32) -> Self {
        self.config.frequency_penalty = v.clamp(-2.0, 2.0);
        self
    }

    pub fn presence_penalty(mut self, v: f32) -> Self {
        self.config.presence_penalty = v.clamp(-2.0, 2.0);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.config.parse_mode = mode;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if c.max_document_bytes == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}
