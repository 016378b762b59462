//! Pipeline stages for research-paper field extraction.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the PDF backend or the LLM provider can be
//! swapped without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ text ──▶ prompt ──▶ llm ──▶ normalize ──▶ parse
//!         (pdfium)  (template)  (call)   (cleanup)    (record)
//! ```
//!
//! 1. [`text`]     : concatenate the first `max_pages` page texts; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`crate::prompts`]: render the fixed instruction template
//! 3. [`llm`]      : one call to the language-model service, failures
//!    classified; the only stage with network I/O
//! 4. [`normalize`]: deterministic cleanup of reply quirks (fences, CRLF,
//!    invisible characters)
//! 5. [`parse`]    : tolerant `Label: value` parsing into a record

pub mod llm;
pub mod normalize;
pub mod parse;
pub mod text;
