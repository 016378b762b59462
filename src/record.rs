//! The five-field record produced by a successful pipeline run.
//!
//! [`FieldName`] is the single source of truth for the field set and its
//! order: the prompt template, the reply parser and every renderer iterate
//! [`FieldName::ALL`], so the three can never drift apart.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Sentinel stored for any field the service could not determine.
pub const NOT_AVAILABLE: &str = "Not available";

/// One of the five fields extracted from a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    Title,
    Abstract,
    Authors,
    AuthorEmails,
    ConclusionSummary,
}

impl FieldName {
    /// All fields, in prompt and display order.
    pub const ALL: [FieldName; 5] = [
        FieldName::Title,
        FieldName::Abstract,
        FieldName::Authors,
        FieldName::AuthorEmails,
        FieldName::ConclusionSummary,
    ];

    /// The label the service writes before the colon.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Title => "Title",
            FieldName::Abstract => "Abstract",
            FieldName::Authors => "Authors",
            FieldName::AuthorEmails => "Author Emails",
            FieldName::ConclusionSummary => "Summary of the Conclusion",
        }
    }

    /// snake_case key used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Abstract => "abstract",
            FieldName::Authors => "authors",
            FieldName::AuthorEmails => "author_emails",
            FieldName::ConclusionSummary => "conclusion_summary",
        }
    }

    /// Exact (case-sensitive) label match.
    pub fn from_label(label: &str) -> Option<FieldName> {
        FieldName::ALL.into_iter().find(|f| f.label() == label)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable label → value mapping with every field present.
///
/// Fields missing from the reply hold [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    values: [String; 5],
}

impl FieldRecord {
    /// Build a record from whatever the parser found; absent or empty
    /// values become the sentinel.
    pub fn from_parsed(mut found: HashMap<FieldName, String>) -> Self {
        let values = FieldName::ALL.map(|field| match found.remove(&field) {
            Some(v) if !v.trim().is_empty() => v,
            _ => NOT_AVAILABLE.to_string(),
        });
        Self { values }
    }

    /// A record where every field reads "Not available".
    pub fn unavailable() -> Self {
        Self::from_parsed(HashMap::new())
    }

    pub fn get(&self, field: FieldName) -> &str {
        &self.values[field.index()]
    }

    /// `false` when the field holds the sentinel.
    pub fn is_available(&self, field: FieldName) -> bool {
        self.get(field) != NOT_AVAILABLE
    }

    /// Number of fields holding a real value.
    pub fn available_count(&self) -> usize {
        FieldName::ALL
            .iter()
            .filter(|f| self.is_available(**f))
            .count()
    }

    /// `(field, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        FieldName::ALL
            .into_iter()
            .map(move |f| (f, self.get(f)))
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FieldName::ALL.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_exactly() {
        for f in FieldName::ALL {
            assert_eq!(FieldName::from_label(f.label()), Some(f));
        }
        assert_eq!(FieldName::from_label("title"), None);
        assert_eq!(FieldName::from_label("Summary"), None);
    }

    #[test]
    fn missing_and_blank_become_sentinel() {
        let mut found = HashMap::new();
        found.insert(FieldName::Title, "Foo".to_string());
        found.insert(FieldName::Authors, "   ".to_string());
        let rec = FieldRecord::from_parsed(found);

        assert_eq!(rec.get(FieldName::Title), "Foo");
        assert_eq!(rec.get(FieldName::Authors), NOT_AVAILABLE);
        assert_eq!(rec.get(FieldName::Abstract), NOT_AVAILABLE);
        assert_eq!(rec.available_count(), 1);
    }

    #[test]
    fn iter_keeps_display_order() {
        let rec = FieldRecord::unavailable();
        let labels: Vec<&str> = rec.iter().map(|(f, _)| f.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Title",
                "Abstract",
                "Authors",
                "Author Emails",
                "Summary of the Conclusion"
            ]
        );
    }

    #[test]
    fn serialises_with_snake_case_keys() {
        let mut found = HashMap::new();
        found.insert(FieldName::AuthorEmails, "a@x.org".to_string());
        let json = serde_json::to_value(FieldRecord::from_parsed(found)).unwrap();
        assert_eq!(json["author_emails"], "a@x.org");
        assert_eq!(json["conclusion_summary"], NOT_AVAILABLE);
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}
