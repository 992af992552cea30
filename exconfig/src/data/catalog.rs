//! Field catalogs backing the source editor choices.
//!
//! Catalogs describe which database fields, metadata keys and computed
//! fields exist for each section. They are consumed from a single JSON
//! document with the groups `db_fields`, `metadata_doc_fields`,
//! `metadata_page_fields` and `special_fields`; entries are
//! `[name, label, sample]` arrays (`sample` optional) or bare names.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::data::types::{ExportType, Section};

/// Errors produced while parsing a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document was not valid JSON.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
    /// A catalog member had the wrong shape.
    #[error("`{path}`: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Dotted path of the offending member.
        path: String,
        /// Description of the expected value.
        expected: String,
        /// The offending value, rendered as JSON.
        actual: String,
    },
}

fn type_mismatch(path: &str, expected: &str, actual: &Value) -> CatalogError {
    CatalogError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// One selectable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogField {
    /// Machine name stored in payloads.
    pub name: String,
    /// Label shown in selection controls.
    pub label: String,
    /// Example value shown next to the selection, if known.
    pub sample: Option<String>,
}

impl CatalogField {
    /// Create an entry whose label equals its name and has no sample.
    pub fn bare(name: impl Into<String>) -> Self {
        let name = name.into();
        CatalogField {
            label: name.clone(),
            name,
            sample: None,
        }
    }
}

/// A metadata service and its known keys.
///
/// A service without known keys is edited through a free-text key field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataService {
    /// Service name, the first part of a `service.key` source.
    pub name: String,
    /// Known keys within the service.
    pub keys: Vec<CatalogField>,
}

/// All catalogs consumed by the editor.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    /// Database fields per section.
    pub db_fields: HashMap<Section, Vec<CatalogField>>,
    /// Metadata services available to document-level sections.
    pub metadata_doc_fields: Vec<MetadataService>,
    /// Metadata services available to the pages section.
    pub metadata_page_fields: Vec<MetadataService>,
    /// Computed fields, keyed by section or by the split general keys
    /// `general_project` / `general_collection`.
    pub special_fields: HashMap<String, Vec<CatalogField>>,
}

impl Catalogs {
    /// Parse catalogs from a JSON string.
    pub fn from_str(content: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Parse catalogs from a JSON value.
    ///
    /// Missing groups yield empty catalogs; unknown section keys inside
    /// `db_fields` are ignored with a log message.
    pub fn from_value(value: &Value) -> Result<Self, CatalogError> {
        let obj = value
            .as_object()
            .ok_or_else(|| type_mismatch("", "object", value))?;

        let mut catalogs = Catalogs::default();

        if let Some(db) = obj.get("db_fields") {
            let db = db
                .as_object()
                .ok_or_else(|| type_mismatch("db_fields", "object", db))?;
            for (key, fields) in db {
                let path = format!("db_fields.{key}");
                let Some(section) = Section::from_key(key) else {
                    log::warn!("ignoring unknown section `{key}` in db_fields");
                    continue;
                };
                catalogs
                    .db_fields
                    .insert(section, parse_field_list(&path, fields)?);
            }
        }

        if let Some(doc) = obj.get("metadata_doc_fields") {
            catalogs.metadata_doc_fields = parse_services("metadata_doc_fields", doc)?;
        }
        if let Some(page) = obj.get("metadata_page_fields") {
            catalogs.metadata_page_fields = parse_services("metadata_page_fields", page)?;
        }

        if let Some(special) = obj.get("special_fields") {
            let special = special
                .as_object()
                .ok_or_else(|| type_mismatch("special_fields", "object", special))?;
            for (key, fields) in special {
                let path = format!("special_fields.{key}");
                catalogs
                    .special_fields
                    .insert(key.clone(), parse_field_list(&path, fields)?);
            }
        }

        Ok(catalogs)
    }

    /// Derive metadata catalogs from sample metadata documents.
    ///
    /// Each top-level member becomes a service; nested members are
    /// flattened into dotted keys with the leaf value as sample. Lists
    /// contribute their first elements by index.
    pub fn from_samples(doc_metadata: &Value, page_metadata: &Value) -> Self {
        Catalogs {
            metadata_doc_fields: services_from_sample(doc_metadata),
            metadata_page_fields: services_from_sample(page_metadata),
            ..Catalogs::default()
        }
    }

    /// Database fields selectable for `section`.
    pub fn db_fields_for(&self, section: Section) -> &[CatalogField] {
        self.db_fields
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Metadata services selectable for `section`.
    ///
    /// The pages section reads page metadata, every other section reads
    /// document metadata.
    pub fn metadata_for(&self, section: Section) -> &[MetadataService] {
        if section == Section::Pages {
            &self.metadata_page_fields
        } else {
            &self.metadata_doc_fields
        }
    }

    /// Look up one metadata service by name.
    pub fn metadata_service(&self, section: Section, name: &str) -> Option<&MetadataService> {
        self.metadata_for(section).iter().find(|s| s.name == name)
    }

    /// Computed fields selectable for `section`.
    ///
    /// The general section is split by export type into the
    /// `general_collection` and `general_project` catalogs.
    pub fn special_for(&self, section: Section, export_type: ExportType) -> &[CatalogField] {
        let key = if section == Section::General {
            if export_type == ExportType::Collection {
                "general_collection"
            } else {
                "general_project"
            }
        } else {
            section.key()
        };
        self.special_fields
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn parse_services(path: &str, value: &Value) -> Result<Vec<MetadataService>, CatalogError> {
    let obj = value
        .as_object()
        .ok_or_else(|| type_mismatch(path, "object", value))?;
    let mut services = Vec::with_capacity(obj.len());
    for (name, keys) in obj {
        let path = format!("{path}.{name}");
        services.push(MetadataService {
            name: name.clone(),
            keys: parse_field_list(&path, keys)?,
        });
    }
    Ok(services)
}

fn parse_field_list(path: &str, value: &Value) -> Result<Vec<CatalogField>, CatalogError> {
    let entries = value
        .as_array()
        .ok_or_else(|| type_mismatch(path, "array", value))?;
    let mut fields = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let path = format!("{path}.{idx}");
        fields.push(parse_field(&path, entry)?);
    }
    Ok(fields)
}

fn parse_field(path: &str, entry: &Value) -> Result<CatalogField, CatalogError> {
    match entry {
        Value::String(name) => Ok(CatalogField::bare(name.clone())),
        Value::Array(parts) => {
            let name = parts
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| type_mismatch(path, "[name, label, sample?]", entry))?;
            let label = parts.get(1).and_then(Value::as_str).unwrap_or(name);
            Ok(CatalogField {
                name: name.to_string(),
                label: label.to_string(),
                sample: parts.get(2).map(sample_text),
            })
        }
        _ => Err(type_mismatch(path, "[name, label, sample?] or name", entry)),
    }
}

fn sample_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const SAMPLE_LIST_LIMIT: usize = 3;

fn services_from_sample(metadata: &Value) -> Vec<MetadataService> {
    let Some(obj) = metadata.as_object() else {
        return Vec::new();
    };
    obj.iter()
        .map(|(name, value)| {
            let mut keys = Vec::new();
            flatten_sample("", value, &mut keys);
            MetadataService {
                name: name.clone(),
                keys,
            }
        })
        .collect()
}

fn flatten_sample(prefix: &str, value: &Value, out: &mut Vec<CatalogField>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, member) in map {
                flatten_sample(&join(key), member, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (idx, item) in items.iter().take(SAMPLE_LIST_LIMIT).enumerate() {
                flatten_sample(&join(&idx.to_string()), item, out);
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.push(CatalogField {
                    name: prefix.to_string(),
                    label: prefix.to_string(),
                    sample: Some(sample_text(leaf)),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_catalogs() -> Catalogs {
        Catalogs::from_value(&json!({
            "db_fields": {
                "general": [["project.title", "Project Title", "Letters 1820"]],
                "documents": [
                    ["document.title", "Document Title", "Letter 17"],
                    ["document.status", "Status", "open"]
                ]
            },
            "metadata_doc_fields": {
                "ner": [["place", "Place", "Vienna"]],
                "import": []
            },
            "metadata_page_fields": {
                "layout": [["columns", "Columns", 2]]
            },
            "special_fields": {
                "general_project": [["no_of_docs", "Number of Documents", "123"]],
                "general_collection": [["collection_items_count", "Number of Collection Items"]],
                "documents": ["tag_list", "word_count"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_tuples_and_bare_names() {
        let catalogs = sample_catalogs();
        let docs = catalogs.db_fields_for(Section::Documents);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].sample.as_deref(), Some("Letter 17"));

        let special = catalogs.special_for(Section::Documents, ExportType::Document);
        assert_eq!(special[0].name, "tag_list");
        assert_eq!(special[0].label, "tag_list");
    }

    #[test]
    fn test_metadata_catalog_selection_by_section() {
        let catalogs = sample_catalogs();
        assert_eq!(catalogs.metadata_for(Section::Documents)[0].name, "ner");
        assert_eq!(catalogs.metadata_for(Section::Pages)[0].name, "layout");
        assert_eq!(
            catalogs.metadata_for(Section::Pages)[0].keys[0].sample.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_general_special_split_by_export_type() {
        let catalogs = sample_catalogs();
        let project = catalogs.special_for(Section::General, ExportType::Document);
        assert_eq!(project[0].name, "no_of_docs");
        let collection = catalogs.special_for(Section::General, ExportType::Collection);
        assert_eq!(collection[0].name, "collection_items_count");
    }

    #[test]
    fn test_shape_errors_carry_paths() {
        let err = Catalogs::from_value(&json!({"db_fields": {"documents": [[17]]}})).unwrap_err();
        match err {
            CatalogError::TypeMismatch { path, .. } => {
                assert_eq!(path, "db_fields.documents.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_samples_flattens_nested_metadata() {
        let catalogs = Catalogs::from_samples(
            &json!({
                "ner": {
                    "place": "Vienna",
                    "persons": [{"name": "A"}, {"name": "B"}]
                }
            }),
            &json!({}),
        );
        let service = &catalogs.metadata_doc_fields[0];
        assert_eq!(service.name, "ner");
        let names: Vec<&str> = service.keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["place", "persons.0.name", "persons.1.name"]);
    }
}
