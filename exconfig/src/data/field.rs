//! Field rows of a section card.

use crate::data::source::FieldSource;

/// The source slot of a field row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowSource {
    /// No source configured yet (freshly added row).
    #[default]
    Unset,
    /// The stored payload could not be parsed.
    Invalid,
    /// A parsed source payload.
    Source(FieldSource),
}

impl RowSource {
    /// The parsed payload, if any.
    pub fn source(&self) -> Option<&FieldSource> {
        match self {
            RowSource::Source(src) => Some(src),
            _ => None,
        }
    }
}

/// One editable field row: an export key and its source payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldRow {
    /// Destination field name, optionally dot-delimited for nesting.
    pub key: String,
    /// The row's source slot.
    pub source: RowSource,
}

impl FieldRow {
    /// Create an empty row.
    pub fn new() -> Self {
        FieldRow::default()
    }

    /// Create a row with an initial key and source slot.
    pub fn with(key: impl Into<String>, source: RowSource) -> Self {
        FieldRow {
            key: key.into(),
            source,
        }
    }

    /// Whether the row would survive serialization.
    ///
    /// Requires a non-empty export key and a complete source payload.
    pub fn is_valid(&self) -> bool {
        !self.key.trim().is_empty()
            && self
                .source
                .source()
                .is_some_and(FieldSource::is_complete)
    }

    /// One-line preview of the row's source.
    pub fn preview(&self) -> String {
        match &self.source {
            RowSource::Unset => String::new(),
            RowSource::Invalid => "Invalid source data".to_string(),
            RowSource::Source(src) => src.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::SourceType;

    #[test]
    fn test_fresh_row_is_not_valid() {
        let row = FieldRow::new();
        assert!(!row.is_valid());
        assert_eq!(row.preview(), "");
    }

    #[test]
    fn test_invalid_payload_preview() {
        let row = FieldRow::with("title", RowSource::Invalid);
        assert!(!row.is_valid());
        assert_eq!(row.preview(), "Invalid source data");
    }

    #[test]
    fn test_row_needs_key_and_source() {
        let src = FieldSource {
            source_type: SourceType::Static,
            source: "Report".to_string(),
            ..FieldSource::default()
        };
        let row = FieldRow::with("", RowSource::Source(src.clone()));
        assert!(!row.is_valid());

        let row = FieldRow::with("title", RowSource::Source(src));
        assert!(row.is_valid());
    }
}
