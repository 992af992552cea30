//! Editor state container for export configuration editing.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::bail;
use log::warn;
use serde_json::{Map, Value};

use crate::data::{
    catalog::Catalogs,
    field::{FieldRow, RowSource},
    source::{FieldSource, SourceDraft, SourceError},
    types::{ExportType, Section},
};

/// One section card: the section and its ordered field rows.
#[derive(Debug, Clone)]
pub struct SectionRows {
    /// The section this card edits.
    pub section: Section,
    /// Field rows in display order.
    pub rows: Vec<FieldRow>,
}

/// Editing session handle for the source editor dialog.
///
/// Returned by [`EditorData::open_editor`] and passed back into
/// [`EditorData::save_editor`]; the dialog owns it for its lifetime, so
/// no global "currently editing" state exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSession {
    /// Section of the row under edit.
    pub section: Section,
    /// Row index within the section.
    pub row: usize,
}

/// Application state container for export configuration editing.
#[derive(Clone)]
pub struct EditorData {
    /// Currently selected export type.
    pub export_type: ExportType,
    /// Section cards of the active export type, in display order.
    pub sections: Vec<SectionRows>,
    /// Catalogs backing the source editor choices.
    pub catalogs: Catalogs,
    /// Whether the configuration has pending changes.
    pub needs_save: bool,
    /// Path to the configuration file.
    pub config: PathBuf,
}

impl EditorData {
    /// Build an empty editor for `export_type`.
    pub fn new(export_type: ExportType, catalogs: Catalogs) -> Self {
        EditorData {
            export_type,
            sections: empty_sections(export_type),
            catalogs,
            needs_save: false,
            config: PathBuf::new(),
        }
    }

    /// Build editor state from configuration file content.
    ///
    /// The content format follows the file extension (`json` or `toml`).
    /// Empty or unparseable content initializes an empty tree; only an
    /// unsupported extension is an error.
    pub fn new_with_init(
        init: &str,
        config_path: &Path,
        export_type: ExportType,
        catalogs: Catalogs,
    ) -> anyhow::Result<Self> {
        let mut data = EditorData::new(export_type, catalogs);
        data.config = config_path.to_path_buf();

        if !init.trim().is_empty() {
            let ext = config_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("");
            let parsed: Option<Value> = match ext {
                "json" => serde_json::from_str(init).ok(),
                "toml" => toml::from_str::<toml::Value>(init)
                    .ok()
                    .and_then(|v| serde_json::to_value(v).ok()),
                ext => {
                    bail!("Unsupported config file extension: {ext:?}");
                }
            };
            match parsed {
                Some(value) => data.update_by_value(&value),
                None => {
                    warn!(
                        "could not parse {}, starting with an empty configuration",
                        config_path.display()
                    );
                }
            }
        }

        Ok(data)
    }

    /// Build editor state from a configuration file.
    ///
    /// A missing file initializes an empty tree.
    pub fn load(
        config_path: impl AsRef<Path>,
        export_type: ExportType,
        catalogs: Catalogs,
    ) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        let content = if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            String::new()
        };
        Self::new_with_init(&content, config_path, export_type, catalogs)
    }

    /// Fill section rows from a configuration tree.
    ///
    /// Only sections of the active export type are read, in display
    /// order; field payloads that fail to parse become rows flagged
    /// invalid.
    pub fn update_by_value(&mut self, value: &Value) {
        let Some(obj) = value.as_object() else {
            warn!("configuration root is not an object, ignoring");
            return;
        };
        for card in &mut self.sections {
            let Some(fields) = obj.get(card.section.key()).and_then(Value::as_object) else {
                continue;
            };
            for (key, payload) in fields {
                let source = match FieldSource::from_value(payload) {
                    Ok(src) => RowSource::Source(src),
                    Err(err) => {
                        warn!("field `{key}` in `{}`: {err}", card.section);
                        RowSource::Invalid
                    }
                };
                card.rows.push(FieldRow::with(key.clone(), source));
            }
        }
    }

    /// The card for `section`, if it belongs to the active export type.
    pub fn section_rows(&self, section: Section) -> Option<&SectionRows> {
        self.sections.iter().find(|card| card.section == section)
    }

    fn section_rows_mut(&mut self, section: Section) -> Option<&mut SectionRows> {
        self.sections.iter_mut().find(|card| card.section == section)
    }

    /// Append an empty row to `section` and return its index.
    pub fn add_field(&mut self, section: Section) -> Option<usize> {
        let card = self.section_rows_mut(section)?;
        card.rows.push(FieldRow::new());
        let idx = card.rows.len() - 1;
        self.needs_save = true;
        Some(idx)
    }

    /// Append a row with an initial key and source payload.
    pub fn add_field_with(
        &mut self,
        section: Section,
        key: impl Into<String>,
        source: FieldSource,
    ) -> Option<usize> {
        let card = self.section_rows_mut(section)?;
        card.rows
            .push(FieldRow::with(key, RowSource::Source(source)));
        let idx = card.rows.len() - 1;
        self.needs_save = true;
        Some(idx)
    }

    /// Remove one row. No confirmation, removal is local to the row.
    pub fn remove_field(&mut self, section: Section, row: usize) {
        if let Some(card) = self.section_rows_mut(section)
            && row < card.rows.len()
        {
            card.rows.remove(row);
            self.needs_save = true;
        }
    }

    /// Remove all rows of one section.
    pub fn reset_section(&mut self, section: Section) {
        if let Some(card) = self.section_rows_mut(section) {
            let was_nonempty = !card.rows.is_empty();
            card.rows.clear();
            if was_nonempty {
                self.needs_save = true;
            }
        }
    }

    /// Update a row's export key.
    pub fn set_field_key(&mut self, section: Section, row: usize, key: &str) {
        if let Some(card) = self.section_rows_mut(section)
            && let Some(field) = card.rows.get_mut(row)
        {
            field.key = key.to_string();
            self.needs_save = true;
        }
    }

    /// Whether any section currently holds rows.
    pub fn has_fields(&self) -> bool {
        self.sections.iter().any(|card| !card.rows.is_empty())
    }

    /// Switch to a different export type, clearing all rows.
    ///
    /// Destructive; the UI asks for confirmation first when
    /// [`EditorData::has_fields`] reports existing rows.
    pub fn set_export_type(&mut self, export_type: ExportType) {
        if self.export_type == export_type {
            return;
        }
        self.export_type = export_type;
        self.sections = empty_sections(export_type);
        self.needs_save = true;
    }

    /// Open an editing session for one row.
    ///
    /// Returns the session handle and a draft loaded from the row's
    /// current payload (or editor defaults for a fresh row).
    pub fn open_editor(&self, section: Section, row: usize) -> Option<(EditSession, SourceDraft)> {
        let field = self.section_rows(section)?.rows.get(row)?;
        let draft = SourceDraft::from_source(field.source.source());
        Some((EditSession { section, row }, draft))
    }

    /// Merge an edited draft back into its row.
    ///
    /// # Errors
    ///
    /// Validation failures leave the row untouched; see
    /// [`SourceDraft::merge_into`].
    pub fn save_editor(
        &mut self,
        session: &EditSession,
        draft: &SourceDraft,
    ) -> Result<(), SourceError> {
        let merged = {
            let field = self
                .section_rows(session.section)
                .and_then(|card| card.rows.get(session.row))
                .ok_or(SourceError::EmptySource)?;
            draft.merge_into(field.source.source())?
        };
        if let Some(card) = self.section_rows_mut(session.section)
            && let Some(field) = card.rows.get_mut(session.row)
        {
            field.source = RowSource::Source(merged);
            self.needs_save = true;
        }
        Ok(())
    }

    /// Serialize the configuration tree.
    ///
    /// Sections holding at least one row contribute an object; rows with
    /// a non-empty key and a complete source are inserted in display
    /// order (a repeated key keeps the last row). Everything else is
    /// silently skipped.
    pub fn as_json(&self) -> Value {
        let mut result = Map::new();
        for card in &self.sections {
            if card.rows.is_empty() {
                continue;
            }
            let mut fields = Map::new();
            for row in &card.rows {
                let key = row.key.trim();
                if key.is_empty() {
                    continue;
                }
                if let RowSource::Source(src) = &row.source
                    && src.is_complete()
                {
                    fields.insert(key.to_string(), src.as_json());
                }
            }
            result.insert(card.section.key().to_string(), Value::Object(fields));
        }
        Value::Object(result)
    }

    /// Persist changes and create a timestamped backup when needed.
    pub fn on_exit(&mut self) -> anyhow::Result<()> {
        if !self.needs_save {
            return Ok(());
        }
        let ext = self
            .config
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let json_value = self.as_json();

        let s = match ext {
            "toml" | "tml" => toml::to_string_pretty(&json_value)?,
            "json" => serde_json::to_string_pretty(&json_value)?,
            _ => {
                bail!("Unsupported config file extension: {}", ext);
            }
        };

        if self.config.exists() {
            let bk = format!(
                "bk-{:?}.{ext}",
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)?
                    .as_secs()
            );

            let backup_path = self.config.with_extension(bk);
            fs::copy(&self.config, &backup_path)?;
        }
        fs::write(&self.config, s)?;
        self.needs_save = false;
        Ok(())
    }
}

fn empty_sections(export_type: ExportType) -> Vec<SectionRows> {
    export_type
        .sections()
        .iter()
        .map(|section| SectionRows {
            section: *section,
            rows: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{OutputType, SourceType};
    use serde_json::json;
    use std::path::Path;

    fn editor(export_type: ExportType) -> EditorData {
        EditorData::new(export_type, Catalogs::default())
    }

    fn static_source(value: &str) -> FieldSource {
        FieldSource {
            source_type: SourceType::Static,
            source: value.to_string(),
            ..FieldSource::default()
        }
    }

    #[test]
    fn test_document_editor_shows_three_cards() {
        let data = editor(ExportType::Document);
        let sections: Vec<Section> = data.sections.iter().map(|c| c.section).collect();
        assert_eq!(
            sections,
            vec![Section::General, Section::Documents, Section::Pages]
        );
    }

    #[test]
    fn test_row_count_tracks_adds_and_removals() {
        let mut data = editor(ExportType::Document);
        data.add_field(Section::Documents);
        data.add_field(Section::Documents);
        data.add_field(Section::Documents);
        data.remove_field(Section::Documents, 1);
        assert_eq!(data.section_rows(Section::Documents).unwrap().rows.len(), 2);

        data.reset_section(Section::Documents);
        assert!(data.section_rows(Section::Documents).unwrap().rows.is_empty());
    }

    #[test]
    fn test_static_title_serializes() {
        let mut data = editor(ExportType::Document);
        data.add_field_with(Section::General, "title", static_source("Report"));

        let result = data.as_json();
        assert_eq!(
            result,
            json!({
                "general": {
                    "title": {"source_type": "static", "source": "Report"}
                }
            })
        );
    }

    #[test]
    fn test_round_trip_reproduces_rows() {
        let mut data = editor(ExportType::Document);
        data.add_field_with(Section::General, "title", static_source("Report"));
        let mut db = FieldSource {
            source_type: SourceType::DbField,
            source: "document.title".to_string(),
            fallback: Some("untitled".to_string()),
            ..FieldSource::default()
        };
        db.set_output_type(OutputType::String);
        data.add_field_with(Section::Documents, "name", db.clone());
        data.add_field_with(Section::Documents, "status", static_source("open"));

        let serialized = data.as_json();
        let mut reloaded = editor(ExportType::Document);
        reloaded.update_by_value(&serialized);

        assert_eq!(reloaded.as_json(), serialized);
        let docs = reloaded.section_rows(Section::Documents).unwrap();
        assert_eq!(docs.rows.len(), 2);
        assert_eq!(docs.rows[0].key, "name");
        assert_eq!(docs.rows[0].source.source(), Some(&db));
    }

    #[test]
    fn test_rows_without_key_or_source_are_skipped() {
        let mut data = editor(ExportType::Page);
        data.add_field(Section::Pages);
        data.add_field_with(Section::Pages, "", static_source("x"));
        data.add_field_with(Section::Pages, "kept", static_source("y"));

        let result = data.as_json();
        // the section has rows, so it is present, holding only the valid one
        assert_eq!(result["pages"], json!({"kept": {"source_type": "static", "source": "y"}}));
        assert!(result.get("general").is_none());
    }

    #[test]
    fn test_duplicate_keys_keep_last_row() {
        let mut data = editor(ExportType::Page);
        data.add_field_with(Section::Pages, "n", static_source("first"));
        data.add_field_with(Section::Pages, "n", static_source("second"));
        assert_eq!(data.as_json()["pages"]["n"]["source"], json!("second"));
    }

    #[test]
    fn test_malformed_init_yields_empty_editor() {
        let data = EditorData::new_with_init(
            "{not json",
            Path::new("config.json"),
            ExportType::Document,
            Catalogs::default(),
        )
        .unwrap();
        assert!(!data.has_fields());
    }

    #[test]
    fn test_malformed_field_payload_is_flagged_and_skipped() {
        let mut data = editor(ExportType::Page);
        data.update_by_value(&json!({
            "pages": {
                "bad": "not an object",
                "good": {"source_type": "static", "source": "x"}
            }
        }));

        let rows = &data.section_rows(Section::Pages).unwrap().rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].preview(), "Invalid source data");
        assert_eq!(data.as_json()["pages"], json!({"good": {"source_type": "static", "source": "x"}}));
    }

    #[test]
    fn test_open_then_save_leaves_payload_unchanged() {
        let mut data = editor(ExportType::Document);
        let src = FieldSource::from_value(&json!({
            "source_type": "db_field",
            "source": "document.title",
            "fallback": "untitled",
            "output_type": "string",
            "format": "Title: {}",
            "custom": true
        }))
        .unwrap();
        data.add_field_with(Section::Documents, "title", src.clone());

        let (session, draft) = data.open_editor(Section::Documents, 0).unwrap();
        data.save_editor(&session, &draft).unwrap();

        let rows = &data.section_rows(Section::Documents).unwrap().rows;
        assert_eq!(rows[0].source.source(), Some(&src));
    }

    #[test]
    fn test_blocked_save_leaves_row_untouched() {
        let mut data = editor(ExportType::Document);
        data.add_field_with(Section::Documents, "place", static_source("x"));

        let (session, mut draft) = data.open_editor(Section::Documents, 0).unwrap();
        draft.source_type = SourceType::Metadata;
        draft.service = "ner".to_string();
        draft.key.clear();

        assert_eq!(
            data.save_editor(&session, &draft),
            Err(SourceError::IncompleteMetadata)
        );
        let rows = &data.section_rows(Section::Documents).unwrap().rows;
        assert_eq!(rows[0].source.source(), Some(&static_source("x")));
    }

    #[test]
    fn test_export_type_switch_clears_rows() {
        let mut data = editor(ExportType::Document);
        data.add_field_with(Section::Documents, "title", static_source("x"));
        assert!(data.has_fields());

        data.set_export_type(ExportType::Page);
        let sections: Vec<Section> = data.sections.iter().map(|c| c.section).collect();
        assert_eq!(sections, vec![Section::General, Section::Pages]);
        assert!(!data.has_fields());
    }
}
