//! Bounded text extraction: the first `max_pages` pages of a PDF as one string.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! Tokio workers keep serving other uploads while a document is parsed.
//!
//! ## Page bound
//!
//! [`collect_text`] asks its [`PageSource`] for the page count and then for
//! at most `max_pages` page texts. Pages beyond the limit are never loaded,
//! so a 900-page upload costs the same as a five-page one.

use crate::document::PDF_MAGIC;
use crate::error::ExtractError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How far into the file the `%PDF` header may appear.
const MAGIC_SEARCH_WINDOW: usize = 1024;

/// Text of the leading pages of a document.
///
/// An empty `text` is a valid value (scanned or blank pages); the
/// orchestrator must check [`ExtractedText::is_blank`] before spending an
/// LLM call on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedText {
    /// Concatenated page texts, in document order.
    pub text: String,
    /// Pages actually read: `min(page_count, max_pages)`.
    pub pages_read: usize,
    /// Pages in the whole document.
    pub page_count: usize,
}

impl ExtractedText {
    /// `true` when there is nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Random access to the pages of an opened document.
pub trait PageSource {
    /// Total pages in the document.
    fn page_count(&self) -> usize;

    /// Text of the page at 0-based `index`, or `None` when it cannot be
    /// decoded. Only called for `index < page_count()`.
    fn page_text(&self, index: usize) -> Option<String>;
}

/// Concatenate the text of the first `max_pages` pages of `source`.
///
/// Undecodable pages contribute an empty string; they never abort the
/// extraction. Pages at or beyond `max_pages` are not requested.
pub fn collect_text<S: PageSource + ?Sized>(source: &S, max_pages: usize) -> ExtractedText {
    let page_count = source.page_count();
    let pages_read = page_count.min(max_pages);
    let mut text = String::new();

    for index in 0..pages_read {
        match source.page_text(index) {
            Some(page) => text.push_str(&page),
            None => warn!("Page {}: text could not be decoded, using empty string", index + 1),
        }
    }

    debug!(
        "Collected {} bytes of text from {}/{} pages",
        text.len(),
        pages_read,
        page_count
    );

    ExtractedText {
        text,
        pages_read,
        page_count,
    }
}

/// Fail fast on bytes that cannot be a PDF at all.
///
/// The header may be preceded by a little junk, so the first kilobyte is
/// searched rather than only offset zero.
pub fn ensure_pdf_magic(bytes: &[u8]) -> Result<(), ExtractError> {
    let window = &bytes[..bytes.len().min(MAGIC_SEARCH_WINDOW)];
    if window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Ok(());
    }
    let head: Vec<u8> = bytes.iter().take(4).copied().collect();
    Err(ExtractError::invalid_document(format!(
        "not a PDF (first bytes: {head:?})"
    )))
}

/// Turns raw document bytes into [`ExtractedText`].
///
/// The production implementation is [`PdfiumTextExtractor`]; tests plug in
/// in-memory fakes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the first `max_pages` pages. Takes the bytes by value so they
    /// are released as soon as extraction finishes.
    ///
    /// Fails with [`ExtractError::InvalidDocument`] when the bytes are not a
    /// parsable PDF.
    async fn extract(&self, bytes: Vec<u8>, max_pages: usize)
        -> Result<ExtractedText, ExtractError>;
}

/// [`TextExtractor`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    lib_path: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    /// `lib_path` may name the library file itself or the directory holding it.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }
}

#[async_trait]
impl TextExtractor for PdfiumTextExtractor {
    async fn extract(
        &self,
        bytes: Vec<u8>,
        max_pages: usize,
    ) -> Result<ExtractedText, ExtractError> {
        ensure_pdf_magic(&bytes)?;
        let lib_path = self.lib_path.clone();

        tokio::task::spawn_blocking(move || {
            extract_blocking(&bytes, max_pages, lib_path.as_deref())
        })
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

/// Bind to pdfium: explicit path first, then the working directory, then
/// the system library.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ExtractError> {
    let bindings = match lib_path {
        Some(path) if path.is_file() => Pdfium::bind_to_library(path),
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of text extraction.
fn extract_blocking(
    bytes: &[u8],
    max_pages: usize,
    lib_path: Option<&Path>,
) -> Result<ExtractedText, ExtractError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ExtractError::invalid_document("PDF is encrypted and requires a password")
        } else {
            ExtractError::invalid_document(format!("PDF is corrupt: {err_str}"))
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    Ok(collect_text(pages, max_pages))
}

impl PageSource for PdfPages<'_> {
    fn page_count(&self) -> usize {
        self.len() as usize
    }

    fn page_text(&self, index: usize) -> Option<String> {
        let idx = u16::try_from(index).ok()?;
        let page = self
            .get(idx)
            .map_err(|e| warn!("Page {}: could not be loaded: {:?}", index + 1, e))
            .ok()?;
        page.text()
            .map(|text| text.all())
            .map_err(|e| warn!("Page {}: text layer unreadable: {:?}", index + 1, e))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory document that records which pages were read.
    struct FakePages {
        pages: Vec<Option<&'static str>>,
        reads: RefCell<Vec<usize>>,
    }

    impl FakePages {
        fn new(pages: Vec<Option<&'static str>>) -> Self {
            Self {
                pages,
                reads: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> Option<String> {
            self.reads.borrow_mut().push(index);
            self.pages[index].map(str::to_string)
        }
    }

    #[test]
    fn short_document_is_fully_concatenated() {
        let doc = FakePages::new(vec![Some("one "), Some("two "), Some("three")]);
        let out = collect_text(&doc, 5);
        assert_eq!(out.text, "one two three");
        assert_eq!(out.pages_read, 3);
        assert_eq!(out.page_count, 3);
    }

    #[test]
    fn long_document_stops_at_limit() {
        let doc = FakePages::new(vec![
            Some("a"),
            Some("b"),
            Some("c"),
            Some("d"),
            Some("e"),
            Some("f"),
            Some("g"),
        ]);
        let out = collect_text(&doc, 5);
        assert_eq!(out.text, "abcde");
        assert_eq!(out.pages_read, 5);
        assert_eq!(out.page_count, 7);
        assert_eq!(*doc.reads.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn undecodable_page_contributes_nothing() {
        let doc = FakePages::new(vec![Some("first "), None, Some("third")]);
        let out = collect_text(&doc, 5);
        assert_eq!(out.text, "first third");
        assert_eq!(out.pages_read, 3);
    }

    #[test]
    fn zero_pages_yield_blank_text() {
        let doc = FakePages::new(vec![]);
        let out = collect_text(&doc, 5);
        assert!(out.is_blank());
        assert_eq!(out.pages_read, 0);
        assert!(doc.reads.borrow().is_empty());
    }

    #[test]
    fn whitespace_only_pages_are_blank() {
        let doc = FakePages::new(vec![Some("  \n"), Some("\t")]);
        assert!(collect_text(&doc, 5).is_blank());
    }

    #[test]
    fn magic_check() {
        assert!(ensure_pdf_magic(b"%PDF-1.7\n...").is_ok());
        assert!(ensure_pdf_magic(b"\xEF\xBB\xBF%PDF-1.4").is_ok());
        let err = ensure_pdf_magic(b"PK\x03\x04zip").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDocument { .. }));
        assert!(ensure_pdf_magic(b"").is_err());
    }

    #[tokio::test]
    async fn pdfium_extractor_rejects_non_pdf_before_binding() {
        let extractor = PdfiumTextExtractor::new(Some(PathBuf::from("/nonexistent")));
        let err = extractor
            .extract(b"<html>not a pdf</html>".to_vec(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDocument { .. }), "got {err:?}");
    }
}
