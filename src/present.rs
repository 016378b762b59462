//! Rendering of records and failures for people.
//!
//! Everything here is a pure function of a [`FieldRecord`] or an
//! [`ExtractError`]; transports decide where the output goes. Values coming
//! back from the language model are untrusted and always HTML-escaped.

use crate::error::ExtractError;
use crate::record::FieldRecord;
use std::fmt::Write;

const INDEX_HTML: &str = include_str!("../templates/index.html");

const RESULT_STYLE: &str = "\
<style>
    body {font-family: Arial, sans-serif; background-color: #ffffff; color: #333333;}
    table {width: 80%; margin: 50px auto; border-collapse: collapse; box-shadow: 0 0 20px rgba(0,0,0,0.15); border: 1px solid #ccc;}
    th, td {padding: 10px; background-color: #f2f2f2; color: #333; border: 1px solid #ccc; text-align: left; vertical-align: top;}
    th {background-color: #005f73; color: #ffffff; text-align: center;}
    tr:nth-child(even) td {background-color: #e9e9e9;}
    td.missing {color: #999999; font-style: italic;}
    .header {background-color: #005f73; padding: 20px; text-align: center; border-radius: 6px; color: white; font-size: 24px;}
    .error {width: 60%; margin: 50px auto; padding: 20px; border: 1px solid #e0b4b4; background-color: #fff6f6; color: #9f3a38; border-radius: 6px;}
    a.back {display: block; text-align: center; margin-top: 20px; color: #005f73;}
</style>
";

/// Escape the five characters that matter inside HTML text and attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The upload form, with the size limit filled in.
pub fn render_index_html(max_document_bytes: usize) -> String {
    INDEX_HTML.replace("{{ max_size }}", &human_size(max_document_bytes))
}

/// A styled two-column table: one row per field, in display order.
pub fn render_record_html(record: &FieldRecord) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(RESULT_STYLE);
    out.push_str("<div class='header'>\n    <h1>Extracted Information</h1>\n</div>\n");
    out.push_str("<table>\n    <tr><th>Section</th><th>Details</th></tr>\n");
    for (field, value) in record.iter() {
        let class = if record.is_available(field) {
            ""
        } else {
            " class='missing'"
        };
        let _ = writeln!(
            out,
            "    <tr><td>{}</td><td{}>{}</td></tr>",
            html_escape(field.label()),
            class,
            html_escape(value).replace('\n', "<br>")
        );
    }
    out.push_str("</table>\n<a class='back' href='/'>Extract another paper</a>\n");
    out
}

/// An error page carrying [`error_message`].
pub fn render_error_html(err: &ExtractError) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(RESULT_STYLE);
    let _ = writeln!(
        out,
        "<div class='error'><p>{}</p></div>",
        html_escape(&error_message(err)).replace('\n', "<br>")
    );
    out.push_str("<a class='back' href='/'>Try another file</a>\n");
    out
}

/// One `Label: value` block per field. Continuation lines of multi-line
/// values are indented under their label.
pub fn render_record_text(record: &FieldRecord) -> String {
    let mut out = String::new();
    for (field, value) in record.iter() {
        let mut lines = value.lines();
        let _ = writeln!(out, "{}: {}", field.label(), lines.next().unwrap_or(""));
        for line in lines {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

/// The human-readable text for a failure, worded for the person who
/// uploaded the document.
pub fn error_message(err: &ExtractError) -> String {
    match err {
        ExtractError::InvalidDocument { reason } if reason.starts_with("only PDF") => {
            "Only PDF files are allowed.".to_string()
        }
        ExtractError::InvalidDocument { reason } => {
            format!("The file could not be read as a PDF: {reason}")
        }
        ExtractError::OversizeDocument { limit, .. } => {
            format!("File size exceeds the {} limit.", human_size(*limit))
        }
        ExtractError::EmptyDocument { pages_read } => format!(
            "No text could be extracted from the first {pages_read} page(s). \
             Scanned documents are not supported."
        ),
        ExtractError::Upstream(cause) => {
            format!("The extraction service failed: {cause}")
        }
        other => format!("Error processing file: {other}"),
    }
}

/// `5242880` → `"5MB"`, `65536` → `"64KB"`, anything else in bytes.
pub fn human_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}
