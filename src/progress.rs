//! Pipeline state machine and the observer trait that reports it.
//!
//! Every invocation of [`crate::extract::Extractor::run`] walks the states
//!
//! ```text
//! Idle ─▶ TextExtracted ─▶ PromptBuilt ─▶ ReplyReceived ─▶ RecordReady
//!   └──────────┴───────────────┴───────────────┴──▶ Failed{reason}
//! ```
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::extract::Extractor::with_observer`] to receive each transition.
//! Callers can forward events to a spinner, a log line or a metrics counter
//! without the library knowing how the host reports progress.
//!
//! # Example
//!
//! ```rust
//! use edgequake_paperinfo::{PipelineObserver, PipelineState};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     transitions: AtomicUsize,
//! }
//!
//! impl PipelineObserver for CountingObserver {
//!     fn on_transition(&self, state: &PipelineState) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("pipeline: {state}");
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Why an invocation ended in [`PipelineState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Wrong media type or bytes that are not a parsable PDF.
    InvalidDocument,
    /// Larger than the configured document size limit.
    OversizeDocument,
    /// No text within the page limit; the service was never called.
    EmptyDocument,
    /// The language-model call failed or returned an unusable reply.
    UpstreamError,
    /// Environment fault (pdfium missing, worker task died).
    Internal,
}

impl FailureReason {
    /// Stable machine-readable name, also used as the JSON `error` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidDocument => "invalid_document",
            FailureReason::OversizeDocument => "oversize_document",
            FailureReason::EmptyDocument => "empty_document",
            FailureReason::UpstreamError => "upstream_error",
            FailureReason::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state of a single pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Text of the first `pages_read` pages is in memory.
    TextExtracted { pages_read: usize, chars: usize },
    PromptBuilt { chars: usize },
    ReplyReceived { chars: usize },
    /// Terminal success.
    RecordReady { available_fields: usize },
    /// Terminal failure.
    Failed { reason: FailureReason },
}

impl PipelineState {
    /// `true` for `RecordReady` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::RecordReady { .. } | PipelineState::Failed { .. }
        )
    }

    /// Short name without payload, handy for assertions and spinners.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::TextExtracted { .. } => "text_extracted",
            PipelineState::PromptBuilt { .. } => "prompt_built",
            PipelineState::ReplyReceived { .. } => "reply_received",
            PipelineState::RecordReady { .. } => "record_ready",
            PipelineState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::TextExtracted { pages_read, chars } => {
                write!(f, "extracted {chars} chars from {pages_read} page(s)")
            }
            PipelineState::PromptBuilt { chars } => write!(f, "prompt ready ({chars} chars)"),
            PipelineState::ReplyReceived { chars } => write!(f, "reply received ({chars} chars)"),
            PipelineState::RecordReady { available_fields } => {
                write!(f, "record ready ({available_fields}/5 fields found)")
            }
            PipelineState::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Called by the pipeline on every state transition.
///
/// Implementations must be `Send + Sync`: one `Extractor` serves many
/// concurrent invocations, each of which reports through the same observer.
pub trait PipelineObserver: Send + Sync {
    /// Called once per transition, including the initial `Idle`.
    fn on_transition(&self, state: &PipelineState) {
        let _ = state;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::extract::Extractor`].
pub type Observer = Arc<dyn PipelineObserver>;
