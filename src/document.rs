//! The uploaded document and the upload-boundary admission rules.
//!
//! A [`Document`] is owned by exactly one invocation: [`crate::extract::Extractor::run`]
//! takes it by value and the bytes are dropped when the run reaches a
//! terminal state. [`admit_upload`] is what every transport (HTTP, CLI)
//! calls before building one, so oversized or non-PDF uploads never reach
//! the pipeline.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use std::path::Path;

/// The only media type the pipeline accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Raw document bytes plus the media type the sender declared.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: String,
}

impl Document {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Shorthand for a document declared as `application/pdf`.
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self::new(bytes, PDF_MEDIA_TYPE)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Give up ownership of the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `true` when the declared media type is the supported one.
    pub fn is_pdf_media_type(&self) -> bool {
        is_pdf_media_type(&self.media_type)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Compare a declared media type against `application/pdf`, ignoring case
/// and parameters such as `; charset=binary`.
pub fn is_pdf_media_type(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE))
}

/// Upload-boundary check, run before any pipeline work.
///
/// Rejects a submission whose declared media type is not PDF
/// ([`ExtractError::InvalidDocument`]) or whose length exceeds
/// `config.max_document_bytes` ([`ExtractError::OversizeDocument`]).
pub fn admit_upload(
    media_type: Option<&str>,
    len: usize,
    config: &ExtractionConfig,
) -> Result<(), ExtractError> {
    match media_type {
        Some(mt) if is_pdf_media_type(mt) => {}
        Some(mt) => {
            return Err(ExtractError::invalid_document(format!(
                "only PDF files are allowed (got '{mt}')"
            )))
        }
        None => {
            return Err(ExtractError::invalid_document(
                "only PDF files are allowed (no content type declared)",
            ))
        }
    }

    if len > config.max_document_bytes {
        return Err(ExtractError::OversizeDocument {
            size: len,
            limit: config.max_document_bytes,
        });
    }

    Ok(())
}

/// Guess the media type of a local file from its magic bytes, falling back
/// to the extension. Used by transports that have no declared type.
pub fn sniff_media_type(path: &Path, head: &[u8]) -> &'static str {
    if head.starts_with(PDF_MAGIC) {
        return PDF_MEDIA_TYPE;
    }
    let is_pdf_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf_ext {
        PDF_MEDIA_TYPE
    } else {
        "application/octet-stream"
    }
}
