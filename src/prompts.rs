//! Prompts for LLM-based research-paper field extraction.
//!
//! The user prompt is a fixed contract with the reply parser in
//! [`crate::pipeline::parse`]: it names the five fields of
//! [`FieldName::ALL`] in order, demands one `Label: value` line per field,
//! asks for the [`NOT_AVAILABLE`] sentinel on missing sections and asks for
//! footnote markers to be dropped from names and emails. The parser has no
//! other way of finding field boundaries, so the template is deliberately
//! not configurable. Only the system message can be overridden through
//! [`crate::config::ExtractionConfig::system_prompt`].

use crate::record::{FieldName, NOT_AVAILABLE};
use std::fmt;

/// Default system message sent ahead of the extraction prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Extract key information from the text as instructed.";

/// How many characters of the prompt are echoed to the log.
pub const LOG_PREVIEW_CHARS: usize = 500;

const PREAMBLE: &str =
    "You are an AI assistant designed to extract the following specific information from a research paper:";

/// An immutable, fully rendered extraction prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-field instruction line of the numbered list.
fn field_instruction(field: FieldName) -> &'static str {
    match field {
        FieldName::Title => "**Title of the Paper**: Only the full title of the paper.",
        FieldName::Abstract => "**Abstract**: The full abstract section, if available.",
        FieldName::Authors => {
            "**Authors**: The full names of the authors. Remove any extraneous symbols or characters like \"†\" or similar unwanted marks from the author names."
        }
        FieldName::AuthorEmails => {
            "**Author Emails**: If available, provide the email addresses of the authors, without any unwanted characters or symbols (such as \"†\")."
        }
        FieldName::ConclusionSummary => {
            "**Summary of the Conclusion**: Provide a concise summary of the conclusion section."
        }
    }
}

/// Placeholder shown after the label in the output-format block.
fn field_placeholder(field: FieldName) -> &'static str {
    match field {
        FieldName::Title => "[Title]",
        FieldName::Abstract => "[Abstract]",
        FieldName::Authors => "[Author Names]",
        FieldName::AuthorEmails => "[Author Emails]",
        FieldName::ConclusionSummary => "[Conclusion]",
    }
}

/// Render the extraction prompt for `text`.
///
/// Pure and deterministic: identical input yields a byte-identical prompt.
pub fn build_prompt(text: &str) -> Prompt {
    let mut out = String::with_capacity(text.len() + 1536);
    out.push_str(PREAMBLE);
    out.push_str("\n\n");

    for (i, field) in FieldName::ALL.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, field_instruction(*field)));
    }

    out.push_str(&format!(
        "\nPlease **do not include extra text or words** that are not part of the above sections. \
If any section is not available, respond with \"{NOT_AVAILABLE}\" for that section.\n\n"
    ));

    out.push_str("The extracted information should be in this exact format (no extra text):\n");
    for field in FieldName::ALL {
        out.push_str(&format!("{}: {}\n", field.label(), field_placeholder(field)));
    }

    out.push_str("\nText:\n");
    out.push_str(text);
    out.push('\n');

    Prompt(out)
}

/// First `max_chars` characters of `s`, cut on a char boundary.
pub fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic() {
        let text = "Attention Is All You Need\nAshish Vaswani∗ Google Brain";
        assert_eq!(build_prompt(text), build_prompt(text));
        assert_eq!(
            build_prompt(text).as_str().as_bytes(),
            build_prompt(text).as_str().as_bytes()
        );
    }

    #[test]
    fn prompt_lists_format_lines_in_order() {
        let p = build_prompt("body");
        let s = p.as_str();
        let positions: Vec<usize> = FieldName::ALL
            .iter()
            .map(|f| {
                s.find(&format!("\n{}: [", f.label()))
                    .unwrap_or_else(|| panic!("missing format line for {f}"))
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "format lines out of order");
    }

    #[test]
    fn prompt_carries_sentinel_and_marker_rules() {
        let s = build_prompt("x").to_string();
        assert!(s.contains("respond with \"Not available\""));
        assert!(s.contains("\"†\""));
        assert!(s.contains("no extra text"));
    }

    #[test]
    fn prompt_ends_with_document_text() {
        let s = build_prompt("THE PAPER BODY").to_string();
        assert!(s.ends_with("Text:\nTHE PAPER BODY\n"));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("abc", 10), "abc");
        assert_eq!(preview("", 5), "");
    }
}
