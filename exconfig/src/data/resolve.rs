//! Applying stored configurations to data records.
//!
//! A saved configuration maps export keys to field sources; this module
//! resolves those sources against a record document and its metadata,
//! applies the optional output formatting, and assembles the result tree.
//! Dotted export keys are interpreted as nesting here: `a.b.c` creates
//! the intermediate objects `a` and `b`.

use serde_json::{Map, Number, Value};

use crate::data::{
    source::FieldSource,
    types::{OutputType, SourceType},
};

/// Provider for computed field and text content values.
///
/// The editor only stores the names of computed fields; producing their
/// values needs knowledge this crate does not have. Implementations plug
/// that knowledge into the resolver.
pub trait ComputedValues {
    /// Value of the computed field `name`, if available.
    fn special(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Text content of kind `kind`, if available.
    fn text_content(&self, kind: &str) -> Option<Value> {
        let _ = kind;
        None
    }
}

/// Computed values that are never available.
pub struct NoComputed;

impl ComputedValues for NoComputed {}

/// Computed values read from reserved groups of a record document.
///
/// `special` values are looked up under the record's `special` member and
/// text content under its `texts` member.
pub struct RecordComputed<'a> {
    record: &'a Value,
}

impl<'a> RecordComputed<'a> {
    /// Read computed values from `record`.
    pub fn new(record: &'a Value) -> Self {
        RecordComputed { record }
    }
}

impl ComputedValues for RecordComputed<'_> {
    fn special(&self, name: &str) -> Option<Value> {
        self.record.get("special")?.get(name).cloned()
    }

    fn text_content(&self, kind: &str) -> Option<Value> {
        self.record.get("texts")?.get(kind).cloned()
    }
}

/// Resolves one section's configuration against a record.
pub struct Resolver<'a> {
    record: &'a Value,
    metadata: &'a Value,
    computed: &'a dyn ComputedValues,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a record document and its metadata.
    pub fn new(record: &'a Value, metadata: &'a Value, computed: &'a dyn ComputedValues) -> Self {
        Resolver {
            record,
            metadata,
            computed,
        }
    }

    /// Apply one section's configuration.
    ///
    /// Returns the assembled result tree and the warnings collected on
    /// the way. Field payloads that fail to parse are skipped with a
    /// warning; a missing source value falls back to the field's
    /// fallback.
    pub fn apply(&self, section_map: &Value) -> (Value, Vec<String>) {
        let mut out = Map::new();
        let mut warnings = Vec::new();

        let Some(fields) = section_map.as_object() else {
            warnings.push("section configuration is not an object".to_string());
            return (Value::Object(out), warnings);
        };

        for (key, payload) in fields {
            let src = match FieldSource::from_value(payload) {
                Ok(src) => src,
                Err(err) => {
                    warnings.push(format!("field `{key}` skipped: {err}"));
                    continue;
                }
            };
            let value = self.resolve(key, &src, &mut warnings);
            insert_nested(&mut out, key, value);
        }

        (Value::Object(out), warnings)
    }

    fn resolve(&self, key: &str, src: &FieldSource, warnings: &mut Vec<String>) -> Value {
        let raw = match src.source_type {
            SourceType::Static => Some(Value::String(src.source.clone())),
            SourceType::DbField => get_nested_value(self.record, &src.source).cloned(),
            SourceType::Metadata => get_nested_value(self.metadata, &src.source).cloned(),
            SourceType::TextContent => self.computed.text_content(&src.source),
            SourceType::Special => self.computed.special(&src.source),
        };

        let value = match raw {
            Some(value) => value,
            None => {
                warnings.push(format!("field `{key}`: `{}` not found", src.source));
                match &src.fallback {
                    Some(fallback) => Value::String(fallback.clone()),
                    None => Value::Null,
                }
            }
        };

        format_output(value, src, key, warnings)
    }
}

/// Retrieve a value from nested objects and arrays using dot notation.
///
/// `my.list.0.item` navigates object members and array indices; any miss
/// yields `None`.
pub fn get_nested_value<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = data;
    for part in key.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Assign a value under a dotted key, creating intermediate objects.
///
/// Collisions resolve last-write-wins: an intermediate that already holds
/// a non-object value is replaced by an object.
pub fn insert_nested(target: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            target.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(map) = entry {
                insert_nested(map, rest, value);
            }
        }
    }
}

/// List the dot-notation keys of a record.
///
/// Lists descend into their first element only.
pub fn flatten_keys(value: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    flatten_into(value, String::new(), &mut keys);
    keys
}

fn flatten_into(value: &Value, prefix: String, keys: &mut Vec<String>) {
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
                flatten_into(member, join(key), keys);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            flatten_into(&items[0], join("0"), keys);
        }
        _ => {
            if !prefix.is_empty() {
                keys.push(prefix);
            }
        }
    }
}

fn format_output(value: Value, src: &FieldSource, key: &str, warnings: &mut Vec<String>) -> Value {
    let Some(output_type) = src.output_type else {
        return value;
    };
    match output_type {
        OutputType::String => {
            let mut s = value_to_string(&value);
            if let Some(format) = &src.format
                && format.contains("{}")
            {
                s = format.replacen("{}", &s, 1);
            }
            match src.text_case.as_deref() {
                Some("upper") => s = s.to_uppercase(),
                Some("lower") => s = s.to_lowercase(),
                Some("title") => s = title_case(&s),
                _ => {}
            }
            Value::String(s)
        }
        OutputType::Float => match value_to_f64(&value) {
            Some(f) => {
                let f = match src.precision {
                    Some(precision) => {
                        let precision = precision as usize;
                        format!("{f:.precision$}").parse().unwrap_or(f)
                    }
                    None => f,
                };
                Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
            }
            None => {
                warnings.push(format!("field `{key}`: value is not a number"));
                Value::Null
            }
        },
        OutputType::Integer => match value_to_i64(&value) {
            Some(i) => Value::Number(i.into()),
            None => match &src.nan_label {
                Some(label) => Value::String(label.clone()),
                None => {
                    warnings.push(format!("field `{key}`: value is not an integer"));
                    Value::Null
                }
            },
        },
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_value_navigates_objects_and_arrays() {
        let data = json!({"my": {"list": [{"item": 7}]}});
        assert_eq!(get_nested_value(&data, "my.list.0.item"), Some(&json!(7)));
        assert_eq!(get_nested_value(&data, "my.list.1.item"), None);
        assert_eq!(get_nested_value(&data, "my.missing"), None);
    }

    #[test]
    fn test_apply_resolves_each_source_type() {
        let record = json!({
            "document": {"title": "Letter 17"},
            "texts": {"doc_text": "Dear Anna, ..."},
            "special": {"word_count": 812}
        });
        let metadata = json!({"ner": {"place": "Vienna"}});
        let computed = RecordComputed::new(&record);
        let resolver = Resolver::new(&record, &metadata, &computed);

        let config = json!({
            "title": {"source_type": "db_field", "source": "document.title"},
            "place": {"source_type": "metadata", "source": "ner.place"},
            "kind": {"source_type": "static", "source": "letter"},
            "text": {"source_type": "text_content", "source": "doc_text"},
            "words": {"source_type": "special", "source": "word_count"}
        });
        let (out, warnings) = resolver.apply(&config);
        assert!(warnings.is_empty());
        assert_eq!(
            out,
            json!({
                "title": "Letter 17",
                "place": "Vienna",
                "kind": "letter",
                "text": "Dear Anna, ...",
                "words": 812
            })
        );
    }

    #[test]
    fn test_missing_source_uses_fallback_and_warns() {
        let record = json!({});
        let metadata = json!({});
        let resolver = Resolver::new(&record, &metadata, &NoComputed);

        let config = json!({
            "status": {"source_type": "db_field", "source": "document.status", "fallback": "unknown"},
            "place": {"source_type": "metadata", "source": "ner.place"}
        });
        let (out, warnings) = resolver.apply(&config);
        assert_eq!(out["status"], json!("unknown"));
        assert_eq!(out["place"], json!(null));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_malformed_payload_is_skipped_with_warning() {
        let record = json!({});
        let resolver = Resolver::new(&record, &record, &NoComputed);
        let (out, warnings) = resolver.apply(&json!({"bad": 17}));
        assert_eq!(out, json!({}));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_string_formatting() {
        let record = json!({"page": {"number": 4}});
        let resolver = Resolver::new(&record, &record, &NoComputed);
        let config = json!({
            "label": {
                "source_type": "db_field",
                "source": "page.number",
                "output_type": "string",
                "format": "p. {}",
                "text_case": "upper"
            }
        });
        let (out, _) = resolver.apply(&config);
        assert_eq!(out["label"], json!("P. 4"));
    }

    #[test]
    fn test_float_precision() {
        let record = json!({"score": "3.14159"});
        let resolver = Resolver::new(&record, &record, &NoComputed);
        let config = json!({
            "score": {
                "source_type": "db_field",
                "source": "score",
                "output_type": "float",
                "precision": 2
            }
        });
        let (out, _) = resolver.apply(&config);
        assert_eq!(out["score"], json!(3.14));
    }

    #[test]
    fn test_integer_nan_label() {
        let record = json!({"count": "many"});
        let resolver = Resolver::new(&record, &record, &NoComputed);
        let config = json!({
            "count": {
                "source_type": "db_field",
                "source": "count",
                "output_type": "integer",
                "nan_label": "n/a"
            }
        });
        let (out, warnings) = resolver.apply(&config);
        assert_eq!(out["count"], json!("n/a"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_dotted_keys_nest_with_last_write_wins() {
        let mut out = Map::new();
        insert_nested(&mut out, "meta.title", json!("a"));
        insert_nested(&mut out, "meta.author.name", json!("b"));
        // collision: `meta.title` becomes an intermediate object
        insert_nested(&mut out, "meta.title.short", json!("c"));
        assert_eq!(
            Value::Object(out),
            json!({"meta": {"title": {"short": "c"}, "author": {"name": "b"}}})
        );
    }

    #[test]
    fn test_flatten_keys_descends_first_list_element() {
        let record = json!({
            "document": {"title": "x"},
            "pages": [{"number": 1}, {"number": 2}]
        });
        assert_eq!(
            flatten_keys(&record),
            vec!["document.title", "pages.0.number"]
        );
    }
}
