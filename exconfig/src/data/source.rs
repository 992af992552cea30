//! Field source payloads and the editing draft.
//!
//! A [`FieldSource`] is the serialized description of where one export
//! field takes its value from. Payloads travel as flat JSON objects;
//! members that are not understood here are carried along untouched so
//! that editing never loses data.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::types::{OutputType, SourceType};

/// Errors produced while parsing or validating a source payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    /// A payload member had the wrong JSON type.
    #[error("`{path}`: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Member name within the payload.
        path: String,
        /// Description of the expected value.
        expected: String,
        /// The offending value, rendered as JSON.
        actual: String,
    },
    /// No source value was selected or entered.
    #[error("no source value selected")]
    EmptySource,
    /// A metadata source is missing its service or key part.
    #[error("metadata sources need both a service and a key")]
    IncompleteMetadata,
    /// A non-empty string format without a `{}` placeholder.
    #[error("format must contain a {{}} placeholder")]
    MissingPlaceholder,
    /// A precision outside the supported range.
    #[error("precision must be an integer between 0 and 10")]
    PrecisionOutOfRange,
}

fn type_mismatch(path: &str, expected: &str, actual: &Value) -> SourceError {
    SourceError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// The source definition of a single export field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSource {
    /// Kind of origin the value is read from.
    pub source_type: SourceType,
    /// Concrete field or key within that origin. For metadata this is a
    /// compound `service.key` string.
    pub source: String,
    /// Value substituted when the source resolves to nothing.
    pub fallback: Option<String>,
    /// Output formatting type, gating the options below.
    pub output_type: Option<OutputType>,
    /// String format template, must contain `{}` when non-empty.
    pub format: Option<String>,
    /// Text case transformation for string output.
    pub text_case: Option<String>,
    /// Number of decimal places for float output.
    pub precision: Option<u8>,
    /// Label substituted when integer output cannot be parsed.
    pub nan_label: Option<String>,
    /// Payload members not interpreted by the editor, preserved verbatim.
    pub extra: Map<String, Value>,
}

fn opt_string(path: &str, value: &Value) -> Result<Option<String>, SourceError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(type_mismatch(path, "string", value)),
    }
}

impl FieldSource {
    /// Parse a payload from its JSON representation.
    ///
    /// Empty-string members are treated as absent. Unknown members are
    /// collected into [`FieldSource::extra`].
    pub fn from_value(value: &Value) -> Result<Self, SourceError> {
        let obj = value
            .as_object()
            .ok_or_else(|| type_mismatch("", "object", value))?;

        let mut out = FieldSource::default();
        for (key, member) in obj {
            match key.as_str() {
                "source_type" => match member {
                    Value::String(s) if s.is_empty() => {}
                    Value::String(s) => {
                        out.source_type = SourceType::from_key(s)
                            .ok_or_else(|| type_mismatch(key, "a source type", member))?;
                    }
                    _ => return Err(type_mismatch(key, "string", member)),
                },
                "source" => match member {
                    Value::String(s) => out.source = s.clone(),
                    _ => return Err(type_mismatch(key, "string", member)),
                },
                "fallback" => out.fallback = opt_string(key, member)?,
                "output_type" => match member {
                    Value::Null => {}
                    Value::String(s) if s.is_empty() => {}
                    Value::String(s) => {
                        out.output_type = Some(
                            OutputType::from_key(s)
                                .ok_or_else(|| type_mismatch(key, "an output type", member))?,
                        );
                    }
                    _ => return Err(type_mismatch(key, "string", member)),
                },
                "format" => out.format = opt_string(key, member)?,
                "text_case" => out.text_case = opt_string(key, member)?,
                "precision" => match member {
                    Value::Null => {}
                    Value::String(s) if s.trim().is_empty() => {}
                    Value::String(s) => {
                        out.precision = Some(
                            s.trim()
                                .parse::<u8>()
                                .map_err(|_| type_mismatch(key, "integer", member))?,
                        );
                    }
                    Value::Number(n) => {
                        let p = n
                            .as_u64()
                            .filter(|p| *p <= u8::MAX as u64)
                            .ok_or_else(|| type_mismatch(key, "integer", member))?;
                        out.precision = Some(p as u8);
                    }
                    _ => return Err(type_mismatch(key, "integer", member)),
                },
                "nan_label" => out.nan_label = opt_string(key, member)?,
                _ => {
                    out.extra.insert(key.clone(), member.clone());
                }
            }
        }
        Ok(out)
    }

    /// Serialize the payload into a flat JSON object.
    ///
    /// Absent options are omitted; preserved extra members follow the
    /// interpreted ones.
    pub fn as_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "source_type".to_string(),
            Value::String(self.source_type.key().to_string()),
        );
        obj.insert("source".to_string(), Value::String(self.source.clone()));
        if let Some(fallback) = &self.fallback {
            obj.insert("fallback".to_string(), Value::String(fallback.clone()));
        }
        if let Some(output_type) = self.output_type {
            obj.insert(
                "output_type".to_string(),
                Value::String(output_type.key().to_string()),
            );
        }
        if let Some(format) = &self.format {
            obj.insert("format".to_string(), Value::String(format.clone()));
        }
        if let Some(text_case) = &self.text_case {
            obj.insert("text_case".to_string(), Value::String(text_case.clone()));
        }
        if let Some(precision) = self.precision {
            obj.insert("precision".to_string(), Value::Number(precision.into()));
        }
        if let Some(nan_label) = &self.nan_label {
            obj.insert("nan_label".to_string(), Value::String(nan_label.clone()));
        }
        for (key, member) in &self.extra {
            if !obj.contains_key(key) {
                obj.insert(key.clone(), member.clone());
            }
        }
        Value::Object(obj)
    }

    /// Whether the payload names a concrete source.
    pub fn is_complete(&self) -> bool {
        !self.source.trim().is_empty()
    }

    /// Commit an output type, removing the options of the other types.
    pub fn set_output_type(&mut self, output_type: OutputType) {
        self.output_type = Some(output_type);
        match output_type {
            OutputType::String => {
                self.precision = None;
                self.nan_label = None;
            }
            OutputType::Float => {
                self.format = None;
                self.text_case = None;
                self.nan_label = None;
            }
            OutputType::Integer => {
                self.format = None;
                self.text_case = None;
                self.precision = None;
            }
        }
    }

    /// One-line human summary used in row previews.
    pub fn summary(&self) -> String {
        let mut summary = match self.source_type {
            SourceType::Static => format!("static: \"{}\"", self.source),
            _ => format!("{}: {}", self.source_type.preview_label(), self.source),
        };
        if let Some(fallback) = &self.fallback
            && !fallback.is_empty()
        {
            summary.push_str(&format!(" (fallback: \"{fallback}\")"));
        }
        summary
    }
}

/// Editable control state of the source editor dialog.
///
/// Drafts hold raw control text; nothing is validated until the draft is
/// merged back into a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceDraft {
    /// Selected source type.
    pub source_type: SourceType,
    /// Selected or entered source value (non-metadata types).
    pub source: String,
    /// Selected metadata service.
    pub service: String,
    /// Selected or entered metadata key.
    pub key: String,
    /// Fallback value text.
    pub fallback: String,
    /// Selected output type.
    pub output_type: OutputType,
    /// String format template text.
    pub format: String,
    /// Selected text case.
    pub text_case: String,
    /// Precision text, parsed on save.
    pub precision: String,
    /// Not-a-number label text.
    pub nan_label: String,
}

impl SourceDraft {
    /// Build a draft from a row's current payload, or editor defaults when
    /// the row has none yet.
    pub fn from_source(source: Option<&FieldSource>) -> Self {
        let Some(src) = source else {
            return SourceDraft::default();
        };

        let (service, key) = if src.source_type == SourceType::Metadata {
            src.source
                .split_once('.')
                .map(|(service, key)| (service.to_string(), key.to_string()))
                .unwrap_or_default()
        } else {
            (String::new(), String::new())
        };

        SourceDraft {
            source_type: src.source_type,
            source: src.source.clone(),
            service,
            key,
            fallback: src.fallback.clone().unwrap_or_default(),
            output_type: src.output_type.unwrap_or_default(),
            format: src.format.clone().unwrap_or_default(),
            text_case: src.text_case.clone().unwrap_or_default(),
            precision: src.precision.map(|p| p.to_string()).unwrap_or_default(),
            nan_label: src.nan_label.clone().unwrap_or_default(),
        }
    }

    /// Compose the concrete source value.
    ///
    /// Metadata drafts combine service and key; both parts are required.
    pub fn resolved_source(&self) -> Result<String, SourceError> {
        if self.source_type == SourceType::Metadata {
            let service = self.service.trim();
            let key = self.key.trim();
            if service.is_empty() || key.is_empty() {
                return Err(SourceError::IncompleteMetadata);
            }
            return Ok(format!("{service}.{key}"));
        }
        let source = self.source.trim();
        if source.is_empty() {
            return Err(SourceError::EmptySource);
        }
        Ok(source.to_string())
    }

    /// Merge the draft into a row's existing payload.
    ///
    /// Members not represented by a dialog control are preserved; options
    /// of the output types not selected are removed. Validation failures
    /// leave the existing payload untouched.
    ///
    /// # Errors
    ///
    /// Returns an error when no concrete source was produced, the string
    /// format lacks its `{}` placeholder, or the precision is not an
    /// integer in `0..=10`.
    pub fn merge_into(&self, existing: Option<&FieldSource>) -> Result<FieldSource, SourceError> {
        let source = self.resolved_source()?;

        let mut out = existing.cloned().unwrap_or_default();
        out.source_type = self.source_type;
        out.source = source;
        out.fallback = non_empty(&self.fallback);
        out.set_output_type(self.output_type);

        match self.output_type {
            OutputType::String => {
                let format = self.format.trim();
                if !format.is_empty() && !format.contains("{}") {
                    return Err(SourceError::MissingPlaceholder);
                }
                out.format = non_empty(format);
                out.text_case = non_empty(&self.text_case);
            }
            OutputType::Float => {
                let precision = self.precision.trim();
                out.precision = if precision.is_empty() {
                    None
                } else {
                    let p: u8 = precision
                        .parse()
                        .map_err(|_| SourceError::PrecisionOutOfRange)?;
                    if p > 10 {
                        return Err(SourceError::PrecisionOutOfRange);
                    }
                    Some(p)
                };
            }
            OutputType::Integer => {
                out.nan_label = non_empty(&self.nan_label);
            }
        }
        Ok(out)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_round_trip_preserves_extras() {
        let payload = json!({
            "source_type": "db_field",
            "source": "document.title",
            "fallback": "untitled",
            "output_type": "string",
            "format": "Title: {}",
            "text_case": "upper",
            "note": "kept verbatim"
        });
        let src = FieldSource::from_value(&payload).unwrap();
        assert_eq!(src.source_type, SourceType::DbField);
        assert_eq!(src.extra.get("note"), Some(&json!("kept verbatim")));

        let back = src.as_json();
        assert_eq!(back["source"], json!("document.title"));
        assert_eq!(back["format"], json!("Title: {}"));
        assert_eq!(back["note"], json!("kept verbatim"));
    }

    #[test]
    fn test_parse_normalizes_empty_options() {
        let payload = json!({
            "source_type": "static",
            "source": "x",
            "fallback": "",
            "precision": ""
        });
        let src = FieldSource::from_value(&payload).unwrap();
        assert_eq!(src.fallback, None);
        assert_eq!(src.precision, None);
        assert!(src.as_json().get("fallback").is_none());
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(FieldSource::from_value(&json!("nope")).is_err());
        assert!(FieldSource::from_value(&json!({"source_type": "bogus"})).is_err());
        assert!(FieldSource::from_value(&json!({"source": 17})).is_err());
    }

    #[test]
    fn test_summary_labels() {
        let mut src = FieldSource {
            source_type: SourceType::Static,
            source: "Report".to_string(),
            ..FieldSource::default()
        };
        assert_eq!(src.summary(), "static: \"Report\"");

        src.source_type = SourceType::DbField;
        src.source = "document.title".to_string();
        src.fallback = Some("untitled".to_string());
        assert_eq!(
            src.summary(),
            "db: document.title (fallback: \"untitled\")"
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let payload = json!({
            "source_type": "metadata",
            "source": "ner.place",
            "fallback": "unknown",
            "output_type": "string",
            "format": "near {}",
            "custom": 42
        });
        let src = FieldSource::from_value(&payload).unwrap();
        let draft = SourceDraft::from_source(Some(&src));
        let merged = draft.merge_into(Some(&src)).unwrap();
        assert_eq!(merged, src);
    }

    #[test]
    fn test_output_type_switch_clears_other_options() {
        let src = FieldSource::from_value(&json!({
            "source_type": "db_field",
            "source": "page.tk_page_number",
            "output_type": "string",
            "format": "p. {}",
            "text_case": "upper"
        }))
        .unwrap();

        let mut draft = SourceDraft::from_source(Some(&src));
        draft.output_type = OutputType::Float;
        draft.precision = "2".to_string();

        let merged = draft.merge_into(Some(&src)).unwrap();
        assert_eq!(merged.output_type, Some(OutputType::Float));
        assert_eq!(merged.precision, Some(2));
        assert_eq!(merged.format, None);
        assert_eq!(merged.text_case, None);
    }

    #[test]
    fn test_metadata_draft_needs_service_and_key() {
        let draft = SourceDraft {
            source_type: SourceType::Metadata,
            service: "ner".to_string(),
            ..SourceDraft::default()
        };
        assert_eq!(
            draft.merge_into(None),
            Err(SourceError::IncompleteMetadata)
        );
    }

    #[test]
    fn test_format_placeholder_is_required() {
        let draft = SourceDraft {
            source_type: SourceType::Static,
            source: "x".to_string(),
            format: "no placeholder".to_string(),
            ..SourceDraft::default()
        };
        assert_eq!(draft.merge_into(None), Err(SourceError::MissingPlaceholder));
    }

    #[test]
    fn test_precision_range() {
        let mut draft = SourceDraft {
            source_type: SourceType::Static,
            source: "x".to_string(),
            output_type: OutputType::Float,
            precision: "11".to_string(),
            ..SourceDraft::default()
        };
        assert_eq!(draft.merge_into(None), Err(SourceError::PrecisionOutOfRange));

        draft.precision = "10".to_string();
        assert_eq!(draft.merge_into(None).unwrap().precision, Some(10));
    }
}
