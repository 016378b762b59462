//! In-memory stand-ins for pdfium and the language model.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_paperinfo::pipeline::text::{collect_text, PageSource};
use edgequake_paperinfo::{
    ExtractError, ExtractedText, ExtractionClient, ExtractionConfig, Extractor, PipelineObserver,
    PipelineState, Prompt, RawReply, TextExtractor, UpstreamError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SCENARIO_A: &str = "Title: Foo\nAbstract: Bar\nAuthors: A, B\nAuthor Emails: Not available\nSummary of the Conclusion: Works well";

// ── Text extraction ──────────────────────────────────────────────────────────

enum Pages {
    Fixed(Vec<String>),
    /// Each document's bytes, read as UTF-8, form its only page.
    FromBytes,
    Invalid,
}

/// [`TextExtractor`] over fixed page texts.
pub struct FakeText {
    pages: Pages,
    calls: AtomicUsize,
}

struct VecPages<'a>(&'a [String]);

impl PageSource for VecPages<'_> {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page_text(&self, index: usize) -> Option<String> {
        self.0.get(index).cloned()
    }
}

impl FakeText {
    pub fn pages(pages: &[&str]) -> Arc<Self> {
        Self::with(Pages::Fixed(pages.iter().map(|p| p.to_string()).collect()))
    }

    pub fn from_bytes() -> Arc<Self> {
        Self::with(Pages::FromBytes)
    }

    /// Rejects every document as unparsable.
    pub fn invalid() -> Arc<Self> {
        Self::with(Pages::Invalid)
    }

    fn with(pages: Pages) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for FakeText {
    async fn extract(
        &self,
        bytes: Vec<u8>,
        max_pages: usize,
    ) -> Result<ExtractedText, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.pages {
            Pages::Fixed(pages) => Ok(collect_text(&VecPages(pages), max_pages)),
            Pages::FromBytes => {
                let page = vec![String::from_utf8_lossy(&bytes).into_owned()];
                Ok(collect_text(&VecPages(&page), max_pages))
            }
            Pages::Invalid => Err(ExtractError::invalid_document("PDF is corrupt: bad xref")),
        }
    }
}

// ── Language model ───────────────────────────────────────────────────────────

enum Reply {
    Fixed(Result<String, UpstreamError>),
    /// `Title: <document text>`.
    EchoTitle,
}

/// [`ExtractionClient`] that records its prompts.
pub struct FakeClient {
    reply: Reply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn replying(reply: &str) -> Arc<Self> {
        Self::with(Reply::Fixed(Ok(reply.to_string())))
    }

    pub fn failing(err: UpstreamError) -> Arc<Self> {
        Self::with(Reply::Fixed(Err(err)))
    }

    pub fn echo_title() -> Arc<Self> {
        Self::with(Reply::EchoTitle)
    }

    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ExtractionClient for FakeClient {
    async fn call(&self, prompt: &Prompt) -> Result<RawReply, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        // Let concurrent invocations interleave.
        tokio::task::yield_now().await;

        match &self.reply {
            Reply::Fixed(Ok(text)) => Ok(RawReply::new(text.clone())),
            Reply::Fixed(Err(e)) => Err(e.clone()),
            Reply::EchoTitle => {
                let text = prompt
                    .as_str()
                    .rsplit_once("\nText:\n")
                    .map(|(_, t)| t.trim())
                    .unwrap_or_default();
                Ok(RawReply::new(format!("Title: {text}")))
            }
        }
    }
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<PipelineState>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<PipelineState> {
        self.states.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.states().iter().map(PipelineState::name).collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_transition(&self, state: &PipelineState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Route library logs to the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn extractor(text: Arc<FakeText>, client: Arc<FakeClient>) -> Extractor {
    extractor_with(ExtractionConfig::default(), text, client)
}

pub fn extractor_with(
    config: ExtractionConfig,
    text: Arc<FakeText>,
    client: Arc<FakeClient>,
) -> Extractor {
    Extractor::with_components(config, text, client)
}

pub fn transport_fault() -> UpstreamError {
    UpstreamError::Transport {
        provider: "openai".into(),
        detail: "error sending request: connection refused".into(),
    }
}
