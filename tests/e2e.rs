//! End-to-end tests against a real PDF, a real pdfium library and a live
//! LLM provider.
//!
//! They are gated behind the `E2E_ENABLED` environment variable so they do
//! not run in CI unless explicitly requested; `E2E_PDF` names the paper.
//!
//! Run with:
//!   E2E_ENABLED=1 E2E_PDF=paper.pdf LD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture

use edgequake_paperinfo::{
    extract_file, preview_text, ExtractError, ExtractionConfig, FieldName, ParseMode,
};
use std::path::PathBuf;

/// Skip this test if E2E_ENABLED is not set *or* E2E_PDF does not exist.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let Ok(path) = std::env::var("E2E_PDF") else {
            println!("SKIP: set E2E_PDF to a research paper PDF");
            return;
        };
        let p = PathBuf::from(path);
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

#[tokio::test]
async fn e2e_preview_reads_leading_pages() {
    let pdf = e2e_skip_unless_ready!();
    let config = ExtractionConfig::builder().max_pages(2).build().unwrap();

    let text = preview_text(&pdf, &config).await.expect("text extraction failed");
    println!(
        "{} chars from {}/{} pages",
        text.char_count(),
        text.pages_read,
        text.page_count
    );
    assert!(text.pages_read <= 2);
    assert!(!text.is_blank(), "expected a text-bearing PDF");
}

#[tokio::test]
async fn e2e_extracts_title_and_authors() {
    let pdf = e2e_skip_unless_ready!();
    let config = ExtractionConfig::default();

    let record = extract_file(&pdf, &config).await.expect("extraction failed");
    for (field, value) in record.iter() {
        println!("{field}: {value}");
    }
    assert!(record.is_available(FieldName::Title), "no title extracted");
    assert!(record.is_available(FieldName::Authors), "no authors extracted");
    assert!(
        !record.get(FieldName::Authors).contains('†'),
        "dagger markers should be removed"
    );
}

#[tokio::test]
async fn e2e_strict_mode_still_finds_title() {
    let pdf = e2e_skip_unless_ready!();
    let config = ExtractionConfig::builder()
        .parse_mode(ParseMode::Strict)
        .build()
        .unwrap();

    let record = extract_file(&pdf, &config).await.expect("extraction failed");
    assert!(record.is_available(FieldName::Title));
}

#[tokio::test]
async fn e2e_missing_file_is_reported() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let err = extract_file("/nonexistent/paper.pdf", &ExtractionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::FileNotFound { .. }), "{err:?}");
}
