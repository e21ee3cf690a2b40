//! JSON document adapter
//!
//! `json:///path/file.json` summarizes the document; `?element=` selects a
//! top-level key, or a JSON pointer when it starts with `/`.

use super::{Adapter, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::uri::QueryMap;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::path::PathBuf;

pub struct JsonDocFactory;

impl AdapterFactory for JsonDocFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::ResourceAndQuery { resource, query } => {
                if resource.is_empty() {
                    return Construction::Invalid(
                        "the json adapter requires a document path, e.g. json:///data/file.json"
                            .to_string(),
                    );
                }
                let path = PathBuf::from(resource);
                if !path.is_file() {
                    return Construction::Invalid(format!("no such file: {resource}"));
                }
                Construction::Ready(Box::new(JsonDocAdapter {
                    path,
                    query: (*query).clone(),
                }))
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct JsonDocAdapter {
    path: PathBuf,
    query: QueryMap,
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl JsonDocAdapter {
    fn source(&self) -> String {
        format!("json://{}", self.path.display())
    }

    fn load(&self) -> Result<Value> {
        let text = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| {
            Error::AdapterValidation(format!("{} is not valid JSON: {e}", self.path.display()))
        })
    }
}

impl Adapter for JsonDocAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let root = self.load()?;

        if let Some(selector) = self.query.get("element") {
            let found = if selector.starts_with('/') {
                root.pointer(selector)
            } else {
                root.get(selector.as_str())
            };
            let value = found.ok_or_else(|| {
                Error::AdapterValidation(format!(
                    "no such key '{selector}' in {}",
                    self.path.display()
                ))
            })?;
            return Ok(ResultRecord::new("json_value", self.source())
                .with("element", selector.clone())
                .with("value_type", value_type(value))
                .with("value", value.clone()));
        }

        let record = ResultRecord::new("json_document", self.source())
            .with("root_type", value_type(&root));
        Ok(match &root {
            Value::Object(map) => {
                let keys: Vec<Value> = map
                    .iter()
                    .map(|(k, v)| json!({"name": k, "type": value_type(v)}))
                    .collect();
                record.with("count", keys.len()).with("keys", keys)
            }
            Value::Array(items) => {
                let item_type = items.first().map(value_type).unwrap_or("empty");
                record.with("count", items.len()).with("item_type", item_type)
            }
            scalar => record.with("value", scalar.clone()),
        })
    }

    fn metadata(&self) -> Option<ResultRecord> {
        let bytes = std::fs::metadata(&self.path).map(|m| m.len()).ok()?;
        Some(ResultRecord::new("json_meta", self.source()).with("bytes", bytes))
    }
}

pub struct JsonDocRenderer;

impl Renderer for JsonDocRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "json_document" => {
                let mut out = format!(
                    "{} ({})",
                    record.source(),
                    record.str_field("root_type").unwrap_or("?")
                );
                if let Some(keys) = record.array_field("keys") {
                    for key in keys {
                        out.push_str(&format!(
                            "\n  {}: {}",
                            key["name"].as_str().unwrap_or(""),
                            key["type"].as_str().unwrap_or("")
                        ));
                    }
                } else if let Some(count) = record.get("count") {
                    out.push_str(&format!("\n  {count} items"));
                }
                Ok(out)
            }
            "json_value" => {
                let value = record.get("value").cloned().unwrap_or(Value::Null);
                Ok(serde_json::to_string_pretty(&value)?)
            }
            _ => Ok(render::raw_dump(record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn doc(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn adapter_for(file: &tempfile::NamedTempFile, query: QueryMap) -> JsonDocAdapter {
        JsonDocAdapter {
            path: file.path().to_path_buf(),
            query,
        }
    }

    #[test]
    fn test_object_summary() {
        let file = doc(r#"{"name": "ada", "scores": [1, 2]}"#);
        let record = adapter_for(&file, QueryMap::new()).structure().unwrap();
        assert_eq!(record.kind(), "json_document");
        assert_eq!(record.str_field("root_type"), Some("object"));
        assert_eq!(record.array_field("keys").unwrap().len(), 2);
    }

    #[test]
    fn test_element_by_key_and_pointer() {
        let file = doc(r#"{"scores": [10, 20]}"#);

        let mut by_key = QueryMap::new();
        by_key.insert("element".to_string(), "scores".to_string());
        let record = adapter_for(&file, by_key).structure().unwrap();
        assert_eq!(record.kind(), "json_value");
        assert_eq!(record.str_field("value_type"), Some("array"));

        let mut by_pointer = QueryMap::new();
        by_pointer.insert("element".to_string(), "/scores/1".to_string());
        let record = adapter_for(&file, by_pointer).structure().unwrap();
        assert_eq!(record.get("value"), Some(&Value::from(20)));
    }

    #[test]
    fn test_missing_key_is_a_validation_error() {
        let file = doc(r#"{"a": 1}"#);
        let mut query = QueryMap::new();
        query.insert("element".to_string(), "missing".to_string());
        let err = adapter_for(&file, query).structure().unwrap_err();
        assert!(matches!(err, Error::AdapterValidation(_)));
    }

    #[test]
    fn test_invalid_json_is_a_validation_error() {
        let file = doc("not json at all {");
        let err = adapter_for(&file, QueryMap::new()).structure().unwrap_err();
        assert!(matches!(err, Error::AdapterValidation(_)));
    }

    #[test]
    fn test_construction_validates_path() {
        let factory = JsonDocFactory;
        let empty = QueryMap::new();
        assert!(matches!(
            factory.construct(&ConstructInput::ResourceAndQuery {
                resource: "",
                query: &empty
            }),
            Construction::Invalid(_)
        ));
        assert!(matches!(
            factory.construct(&ConstructInput::ResourceAndQuery {
                resource: "/definitely/not/here.json",
                query: &empty
            }),
            Construction::Invalid(_)
        ));
        assert!(matches!(
            factory.construct(&ConstructInput::NoArgs),
            Construction::Mismatch
        ));
    }
}
