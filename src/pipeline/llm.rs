//! LLM interaction: send the extraction prompt and return the raw reply.
//!
//! This module is intentionally thin: prompt wording lives in
//! [`crate::prompts`] and reply interpretation in [`crate::pipeline::parse`].
//! What lives here is the call itself and the classification of its failure.
//!
//! ## No retries
//!
//! A failed call is terminal for the invocation. The client makes exactly
//! one request and turns every failure into an [`UpstreamError`]; callers
//! that want retries wrap the whole pipeline.

use crate::config::ExtractionConfig;
use crate::error::UpstreamError;
use crate::prompts::{Prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Unparsed output of the language-model service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// Reply text, trimmed.
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl RawReply {
    /// A reply with no token accounting.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// Sends a prompt to the language-model service.
///
/// Implementations must never panic on a service failure; every failure is
/// returned as a classified [`UpstreamError`].
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    async fn call(&self, prompt: &Prompt) -> Result<RawReply, UpstreamError>;
}

/// [`ExtractionClient`] over any `edgequake-llm` provider.
#[derive(Clone)]
pub struct LlmExtractionClient {
    provider: Arc<dyn LLMProvider>,
    provider_label: String,
    system_prompt: String,
    options: CompletionOptions,
}

impl LlmExtractionClient {
    /// `provider_label` names the provider in errors and logs.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        provider_label: impl Into<String>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            provider,
            provider_label: provider_label.into(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
        }
    }

    pub fn provider_label(&self) -> &str {
        &self.provider_label
    }
}

#[async_trait]
impl ExtractionClient for LlmExtractionClient {
    async fn call(&self, prompt: &Prompt) -> Result<RawReply, UpstreamError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(prompt.as_str()),
        ];

        match self.provider.chat(&messages, Some(&self.options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    self.provider_label,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );

                let content = response.content.trim().to_string();
                if content.is_empty() {
                    warn!("{}: empty reply", self.provider_label);
                    return Err(UpstreamError::EmptyReply {
                        provider: self.provider_label.clone(),
                    });
                }

                Ok(RawReply {
                    content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                })
            }
            Err(e) => {
                let detail = format!("{}", e);
                warn!("{}: call failed: {}", self.provider_label, detail);
                Err(classify_failure(&self.provider_label, detail))
            }
        }
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        top_p: Some(config.top_p),
        frequency_penalty: Some(config.frequency_penalty),
        presence_penalty: Some(config.presence_penalty),
        ..Default::default()
    }
}

/// Sort a provider error message into an [`UpstreamError`] class.
///
/// Providers surface status codes and transport faults only through their
/// error text, so classification goes by well-known markers in it.
pub fn classify_failure(provider: &str, detail: String) -> UpstreamError {
    let lower = detail.to_lowercase();
    let provider = provider.to_string();

    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["401", "403", "unauthorized", "forbidden", "authentication", "invalid api key", "incorrect api key"]) {
        UpstreamError::Auth { provider, detail }
    } else if has(&["429", "rate limit", "rate_limit", "too many requests", "quota"]) {
        UpstreamError::RateLimited { provider, detail }
    } else if has(&["timed out", "timeout", "connection", "connect", "dns", "network", "unreachable"]) {
        UpstreamError::Transport { provider, detail }
    } else {
        UpstreamError::Api { provider, detail }
    }
}
