//! Error types for the edgequake-paperinfo library.
//!
//! Two types reflect two layers of failure:
//!
//! * [`ExtractError`]: every way a pipeline invocation (or its setup) can
//!   end without a [`crate::record::FieldRecord`]. All variants are terminal
//!   for the invocation; nothing is retried internally.
//!
//! * [`UpstreamError`]: the classified cause of a failed call to the
//!   language-model service. It travels inside [`ExtractError::Upstream`]
//!   so callers can tell an expired key from a rate limit or a network blip.

use crate::progress::FailureReason;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-paperinfo library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Document errors ───────────────────────────────────────────────────
    /// Wrong media type, or bytes that cannot be parsed as a PDF.
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// No extractable text within the page limit (scanned or blank PDF).
    #[error("No extractable text found in the first {pages_read} page(s)")]
    EmptyDocument { pages_read: usize },

    /// Rejected at the upload boundary; never reaches the pipeline.
    #[error("Document is {size} bytes, which exceeds the {limit}-byte limit")]
    OversizeDocument { size: usize, limit: usize },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The language-model call failed or returned nothing usable.
    #[error("Upstream service error: {0}")]
    Upstream(#[from] UpstreamError),

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH (or --pdfium-lib) to the directory holding libpdfium,\n\
or install pdfium system-wide. Pre-built libraries are available from\n\
https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Build an [`ExtractError::InvalidDocument`] from anything printable.
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        ExtractError::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// The pipeline-level failure class this error belongs to.
    pub fn reason(&self) -> FailureReason {
        match self {
            ExtractError::InvalidDocument { .. }
            | ExtractError::FileNotFound { .. }
            | ExtractError::PermissionDenied { .. } => FailureReason::InvalidDocument,
            ExtractError::OversizeDocument { .. } => FailureReason::OversizeDocument,
            ExtractError::EmptyDocument { .. } => FailureReason::EmptyDocument,
            ExtractError::Upstream(_) => FailureReason::UpstreamError,
            ExtractError::ProviderNotConfigured { .. }
            | ExtractError::InvalidConfig(_)
            | ExtractError::PdfiumBindingFailed(_)
            | ExtractError::Internal(_) => FailureReason::Internal,
        }
    }

    /// `true` when the caller sent something unusable (as opposed to a
    /// service or environment fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidDocument { .. }
                | ExtractError::OversizeDocument { .. }
                | ExtractError::EmptyDocument { .. }
                | ExtractError::FileNotFound { .. }
                | ExtractError::PermissionDenied { .. }
        )
    }
}

/// Classified failure of a single language-model call.
///
/// Every variant keeps the provider label and the underlying detail so the
/// cause survives all the way to the presentation layer.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum UpstreamError {
    /// 401/403, missing or revoked key.
    #[error("authentication rejected by '{provider}': {detail}")]
    Auth { provider: String, detail: String },

    /// HTTP 429 or quota exhaustion.
    #[error("rate limit exceeded for '{provider}': {detail}")]
    RateLimited { provider: String, detail: String },

    /// Connection refused, DNS failure, transport timeout.
    #[error("network fault reaching '{provider}': {detail}")]
    Transport { provider: String, detail: String },

    /// The call succeeded but produced no text.
    #[error("'{provider}' returned an empty reply")]
    EmptyReply { provider: String },

    /// Any other error reported by the provider.
    #[error("LLM API error from '{provider}': {detail}")]
    Api { provider: String, detail: String },
}

impl UpstreamError {
    /// Label of the provider that produced the failure.
    pub fn provider(&self) -> &str {
        match self {
            UpstreamError::Auth { provider, .. }
            | UpstreamError::RateLimited { provider, .. }
            | UpstreamError::Transport { provider, .. }
            | UpstreamError::EmptyReply { provider }
            | UpstreamError::Api { provider, .. } => provider,
        }
    }
}
