//! Deterministic cleanup of a raw service reply before lenient parsing.
//!
//! Even a well-prompted model occasionally wraps its answer in a code fence,
//! answers with Windows line endings, or leaks a byte-order mark in front of
//! the first label. None of that changes the content, but each of them
//! defeats exact label matching. The rules here are pure `&str → String`
//! passes applied in a fixed order:
//!
//! 1. Strip an outer code fence (```` ``` ````, ```` ```text ````, …)
//! 2. Normalise line endings (CRLF / CR → LF)
//! 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 4. Trim trailing whitespace per line
//!
//! Fences go first because the regex anchors on the very first and last
//! lines; invisible characters go before trimming so a line holding only a
//! zero-width space ends up empty.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw reply.
pub fn clean_reply(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    trim_trailing_whitespace(&s)
}

// ── Rule 1: Strip outer code fence ───────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap()
});

fn strip_outer_fence(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCE.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

// ZWNJ and ZWJ are left alone: Persian and Indic names need them.
fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{2060}'], "")
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plain_fence() {
        let raw = "```\nTitle: Foo\nAbstract: Bar\n```";
        assert_eq!(clean_reply(raw), "Title: Foo\nAbstract: Bar");
    }

    #[test]
    fn strips_tagged_fence() {
        let raw = "```text\nTitle: Foo\n```\n";
        assert_eq!(clean_reply(raw), "Title: Foo");
    }

    #[test]
    fn leaves_inner_fences_alone() {
        let raw = "Title: Foo\n```\ncode\n```\nAbstract: Bar";
        assert_eq!(clean_reply(raw), raw);
    }

    #[test]
    fn normalises_crlf() {
        assert_eq!(clean_reply("Title: A\r\nAuthors: B\r\n"), "Title: A\nAuthors: B");
    }

    #[test]
    fn removes_bom_before_first_label() {
        assert_eq!(clean_reply("\u{FEFF}Title: A"), "Title: A");
        assert_eq!(clean_reply("Ti\u{200B}tle: A"), "Title: A");
    }

    #[test]
    fn keeps_joiners_inside_names() {
        let raw = "Authors: \u{645}\u{6cc}\u{200C}\u{62f}\u{627}\u{646}, \u{0915}\u{094D}\u{200D}\u{0937}";
        assert_eq!(clean_reply(raw), raw);
    }

    #[test]
    fn clean_is_idempotent() {
        let raw = "```\r\nTitle: A  \r\nAbstract: B\r\n```";
        let once = clean_reply(raw);
        assert_eq!(clean_reply(&once), once);
    }
}
