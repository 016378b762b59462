//! Reply parsing: free text from the service → [`FieldRecord`].
//!
//! The prompt asks for one `Label: value` line per field, but nothing
//! guarantees the model complies. The parser is therefore total: unknown
//! labels are dropped, missing labels become [`crate::record::NOT_AVAILABLE`],
//! and a reply in the wrong shape altogether yields an all-sentinel record.
//!
//! ## Modes
//!
//! * [`ParseMode::Strict`] keeps only lines that carry a separator and whose
//!   trimmed label matches a field name exactly. Lines without a separator
//!   are discarded, which truncates values that span several lines.
//! * [`ParseMode::Lenient`] (default) first runs
//!   [`crate::pipeline::normalize::clean_reply`], strips Markdown decoration
//!   from labels (`**Title**:`, `- Title:`, `1. Title:`) and appends every
//!   line without a separator to the field seen last, so a multi-paragraph
//!   abstract survives intact. A line whose label is unknown (`Keywords:`)
//!   is still dropped.
//!
//! In both modes a repeated label overwrites the earlier value.

use crate::pipeline::normalize::clean_reply;
use crate::record::{FieldName, FieldRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Separates a label from its value.
pub const SEPARATOR: char = ':';

/// How tolerant [`parse_reply`] is of replies that bend the line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParseMode {
    /// Exact labels, single-line values.
    Strict,
    /// Decorated labels and continuation lines. (default)
    #[default]
    Lenient,
}

/// Parse a raw reply into a complete [`FieldRecord`]. Never fails.
pub fn parse_reply(raw: &str, mode: ParseMode) -> FieldRecord {
    let found = match mode {
        ParseMode::Strict => parse_strict(raw),
        ParseMode::Lenient => parse_lenient(&clean_reply(raw)),
    };
    debug!("Parsed {} of 5 fields ({:?} mode)", found.len(), mode);
    FieldRecord::from_parsed(found)
}

fn parse_strict(raw: &str) -> HashMap<FieldName, String> {
    let mut found = HashMap::new();
    for line in raw.split('\n') {
        let Some((label, value)) = line.split_once(SEPARATOR) else {
            continue;
        };
        if let Some(field) = FieldName::from_label(label.trim()) {
            found.insert(field, value.trim().to_string());
        }
    }
    found
}

/// Optional list marker or heading hashes, optional emphasis, the label
/// itself, optional closing emphasis.
static RE_DECORATED_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*+•]\s+|\d{1,2}[.)]\s+|#{1,6}\s*)?(\*\*|__|\*|_)?\s*(.*?)\s*(\*\*|__|\*|_)?$")
        .unwrap()
});

/// Match a possibly decorated label. Returns the field and whether an
/// emphasis marker was opened but not closed before the separator
/// (`**Title:** Foo`), in which case the value starts with the closer.
fn match_label(raw_label: &str) -> Option<(FieldName, Option<&'static str>)> {
    let trimmed = raw_label.trim();
    if let Some(field) = FieldName::from_label(trimmed) {
        return Some((field, None));
    }

    let caps = RE_DECORATED_LABEL.captures(trimmed)?;
    let field = FieldName::from_label(caps.get(2)?.as_str())?;
    let dangling = match (caps.get(1).map(|m| m.as_str()), caps.get(3)) {
        (Some("**"), None) => Some("**"),
        (Some("__"), None) => Some("__"),
        (Some("*"), None) => Some("*"),
        (Some("_"), None) => Some("_"),
        _ => None,
    };
    Some((field, dangling))
}

fn parse_lenient(cleaned: &str) -> HashMap<FieldName, String> {
    let mut found: HashMap<FieldName, String> = HashMap::new();
    let mut current: Option<FieldName> = None;

    for line in cleaned.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let labelled = trimmed
            .split_once(SEPARATOR)
            .and_then(|(label, value)| match_label(label).map(|m| (m, value)));

        match labelled {
            Some(((field, dangling), value)) => {
                let mut value = value.trim();
                if let Some(closer) = dangling {
                    value = value.strip_prefix(closer).unwrap_or(value).trim();
                }
                found.insert(field, value.to_string());
                current = Some(field);
            }
            None if trimmed.contains(SEPARATOR) => {
                // Unknown label.
                debug!("Dropping unrecognised line: {}", trimmed);
            }
            None => {
                // Continuation of the field seen last; stray preamble is dropped.
                if let Some(field) = current {
                    let entry = found.entry(field).or_default();
                    if !entry.is_empty() {
                        entry.push('\n');
                    }
                    entry.push_str(trimmed);
                }
            }
        }
    }

    found
}
