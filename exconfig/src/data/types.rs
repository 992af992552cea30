//! Core enumerations for export configurations.
//!
//! Defines the export types, their section layouts, the supported source
//! kinds and the optional output formatting types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The overall kind of export being configured.
///
/// The export type determines which sections are editable and in which
/// order their cards are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    /// One output document per project document.
    Document,
    /// One output record per page.
    Page,
    /// Export of a curated collection.
    Collection,
    /// Export of a dictionary.
    Dictionary,
    /// Tag usage report.
    TagReport,
}

impl ExportType {
    /// All export types in display order.
    pub const ALL: [ExportType; 5] = [
        ExportType::Document,
        ExportType::Page,
        ExportType::Collection,
        ExportType::Dictionary,
        ExportType::TagReport,
    ];

    /// The ordered list of sections editable for this export type.
    pub fn sections(&self) -> &'static [Section] {
        match self {
            ExportType::Document => &[Section::General, Section::Documents, Section::Pages],
            ExportType::Page => &[Section::General, Section::Pages],
            ExportType::Collection => &[Section::General, Section::Items],
            ExportType::Dictionary => &[Section::General, Section::Entries],
            ExportType::TagReport => &[Section::General, Section::Tags],
        }
    }

    /// Stable identifier used in serialized documents.
    pub fn key(&self) -> &'static str {
        match self {
            ExportType::Document => "document",
            ExportType::Page => "page",
            ExportType::Collection => "collection",
            ExportType::Dictionary => "dictionary",
            ExportType::TagReport => "tag_report",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ExportType::Document => "Document",
            ExportType::Page => "Page",
            ExportType::Collection => "Collection",
            ExportType::Dictionary => "Dictionary",
            ExportType::TagReport => "Tag Report",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A named scope of fields within an export type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Project-level fields, present for every export type.
    General,
    /// Per-document fields.
    Documents,
    /// Per-page fields.
    Pages,
    /// Collection item fields.
    Items,
    /// Dictionary entry fields.
    Entries,
    /// Tag report fields.
    Tags,
}

impl Section {
    /// Stable identifier used as the section key in serialized documents.
    pub fn key(&self) -> &'static str {
        match self {
            Section::General => "general",
            Section::Documents => "documents",
            Section::Pages => "pages",
            Section::Items => "items",
            Section::Entries => "entries",
            Section::Tags => "tags",
        }
    }

    /// Capitalized section name used in card headers.
    pub fn title(&self) -> &'static str {
        match self {
            Section::General => "General",
            Section::Documents => "Documents",
            Section::Pages => "Pages",
            Section::Items => "Items",
            Section::Entries => "Entries",
            Section::Tags => "Tags",
        }
    }

    /// Label describing the object a field of this section is read from.
    ///
    /// Used by the source editor dialog title.
    pub fn label(&self) -> &'static str {
        match self {
            Section::General => "Project",
            Section::Documents => "Document",
            Section::Pages => "Page",
            Section::Items => "Collection Item",
            Section::Entries => "Dictionary Entry",
            Section::Tags => "Tag",
        }
    }

    /// Resolve a section from its serialized key.
    pub fn from_key(key: &str) -> Option<Section> {
        match key {
            "general" => Some(Section::General),
            "documents" => Some(Section::Documents),
            "pages" => Some(Section::Pages),
            "items" => Some(Section::Items),
            "entries" => Some(Section::Entries),
            "tags" => Some(Section::Tags),
            _ => None,
        }
    }

    /// The fixed list of text content kinds selectable for this section.
    ///
    /// Each entry is a `(name, label)` pair. Sections without textual
    /// content have an empty list.
    pub fn text_content_options(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Section::Documents => &[
                ("doc_text", "Document Text"),
                ("page_text_list", "List of Page Texts"),
                ("page_anno_list", "List of Lists of Annotations"),
            ],
            Section::Pages => &[("page_text", "Page Text"), ("anno_list", "List of Annotations")],
            _ => &[],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The origin kind of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A literal value entered by the user.
    Static,
    /// A field read from the database object.
    #[default]
    DbField,
    /// A metadata lookup, addressed as `service.key`.
    Metadata,
    /// Extracted text content.
    TextContent,
    /// A computed field.
    Special,
}

impl SourceType {
    /// All source types in display order.
    pub const ALL: [SourceType; 5] = [
        SourceType::DbField,
        SourceType::Metadata,
        SourceType::Static,
        SourceType::TextContent,
        SourceType::Special,
    ];

    /// Stable identifier used in serialized payloads.
    pub fn key(&self) -> &'static str {
        match self {
            SourceType::Static => "static",
            SourceType::DbField => "db_field",
            SourceType::Metadata => "metadata",
            SourceType::TextContent => "text_content",
            SourceType::Special => "special",
        }
    }

    /// Human readable label for selection controls.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Static => "Static Value",
            SourceType::DbField => "Database Field",
            SourceType::Metadata => "Metadata",
            SourceType::TextContent => "Text Content",
            SourceType::Special => "Special Field",
        }
    }

    /// Short label used in row previews.
    pub fn preview_label(&self) -> &'static str {
        match self {
            SourceType::Static => "static",
            SourceType::DbField => "db",
            SourceType::Metadata => "metadata",
            SourceType::TextContent => "text",
            SourceType::Special => "special",
        }
    }

    /// Resolve a source type from its serialized key.
    pub fn from_key(key: &str) -> Option<SourceType> {
        match key {
            "static" => Some(SourceType::Static),
            "db_field" => Some(SourceType::DbField),
            "metadata" => Some(SourceType::Metadata),
            "text_content" => Some(SourceType::TextContent),
            "special" => Some(SourceType::Special),
            _ => None,
        }
    }

    /// Whether this source type is selectable for fields of `section`.
    ///
    /// Metadata and text content are undefined at project scope.
    pub fn allowed_in(&self, section: Section) -> bool {
        if section == Section::General {
            !matches!(self, SourceType::Metadata | SourceType::TextContent)
        } else {
            true
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Output formatting type of a field.
///
/// Selects which formatting options apply; the options of the other two
/// types are removed when one is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// Plain string output with an optional format template and text case.
    #[default]
    String,
    /// Floating point output with an optional precision.
    Float,
    /// Integer output with an optional not-a-number label.
    Integer,
}

impl OutputType {
    /// All output types in display order.
    pub const ALL: [OutputType; 3] = [OutputType::String, OutputType::Float, OutputType::Integer];

    /// Stable identifier used in serialized payloads.
    pub fn key(&self) -> &'static str {
        match self {
            OutputType::String => "string",
            OutputType::Float => "float",
            OutputType::Integer => "integer",
        }
    }

    /// Human readable label for selection controls.
    pub fn label(&self) -> &'static str {
        match self {
            OutputType::String => "String",
            OutputType::Float => "Float",
            OutputType::Integer => "Integer",
        }
    }

    /// Resolve an output type from its serialized key.
    pub fn from_key(key: &str) -> Option<OutputType> {
        match key {
            "string" => Some(OutputType::String),
            "float" => Some(OutputType::Float),
            "integer" => Some(OutputType::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_sections() {
        assert_eq!(
            ExportType::Document.sections(),
            &[Section::General, Section::Documents, Section::Pages]
        );
    }

    #[test]
    fn test_every_export_type_starts_with_general() {
        for ty in ExportType::ALL {
            assert_eq!(ty.sections().first(), Some(&Section::General));
        }
    }

    #[test]
    fn test_general_disallows_metadata_and_text() {
        assert!(!SourceType::Metadata.allowed_in(Section::General));
        assert!(!SourceType::TextContent.allowed_in(Section::General));
        assert!(SourceType::Static.allowed_in(Section::General));
        assert!(SourceType::Metadata.allowed_in(Section::Pages));
    }

    #[test]
    fn test_key_round_trip() {
        for ty in SourceType::ALL {
            assert_eq!(SourceType::from_key(ty.key()), Some(ty));
        }
        for ty in OutputType::ALL {
            assert_eq!(OutputType::from_key(ty.key()), Some(ty));
        }
    }
}
