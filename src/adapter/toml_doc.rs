//! TOML document adapter
//!
//! `toml:///path/file.toml` summarizes the document; `?element=` selects a
//! top-level key.

use super::{Adapter, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::uri::QueryMap;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::path::PathBuf;

pub struct TomlDocFactory;

impl AdapterFactory for TomlDocFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::ResourceAndQuery { resource, query } => {
                if resource.is_empty() {
                    return Construction::Invalid(
                        "the toml adapter requires a document path, e.g. toml:///etc/app.toml"
                            .to_string(),
                    );
                }
                let path = PathBuf::from(resource);
                if !path.is_file() {
                    return Construction::Invalid(format!("no such file: {resource}"));
                }
                Construction::Ready(Box::new(TomlDocAdapter {
                    path,
                    query: (*query).clone(),
                }))
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct TomlDocAdapter {
    path: PathBuf,
    query: QueryMap,
}

fn toml_type(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Datetime(_) => "datetime",
        toml::Value::Array(_) => "array",
        toml::Value::Table(_) => "table",
    }
}

impl TomlDocAdapter {
    fn source(&self) -> String {
        format!("toml://{}", self.path.display())
    }

    fn load(&self) -> Result<toml::Value> {
        let text = std::fs::read_to_string(&self.path)?;
        text.parse::<toml::Value>().map_err(|e| {
            Error::AdapterValidation(format!("{} is not valid TOML: {e}", self.path.display()))
        })
    }

    fn to_json(&self, value: &toml::Value) -> Result<Value> {
        serde_json::to_value(value)
            .map_err(|e| Error::AdapterInternal(format!("TOML value not representable: {e}")))
    }
}

impl Adapter for TomlDocAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let root = self.load()?;

        if let Some(selector) = self.query.get("element") {
            let value = root.get(selector.as_str()).ok_or_else(|| {
                Error::AdapterValidation(format!(
                    "no such key '{selector}' in {}",
                    self.path.display()
                ))
            })?;
            return Ok(ResultRecord::new("toml_value", self.source())
                .with("element", selector.clone())
                .with("value_type", toml_type(value))
                .with("value", self.to_json(value)?));
        }

        let record = ResultRecord::new("toml_document", self.source());
        Ok(match &root {
            toml::Value::Table(table) => {
                let keys: Vec<Value> = table
                    .iter()
                    .map(|(k, v)| json!({"name": k, "type": toml_type(v)}))
                    .collect();
                record.with("count", keys.len()).with("keys", keys)
            }
            other => record
                .with("root_type", toml_type(other))
                .with("value", self.to_json(other)?),
        })
    }

    fn metadata(&self) -> Option<ResultRecord> {
        let bytes = std::fs::metadata(&self.path).map(|m| m.len()).ok()?;
        Some(ResultRecord::new("toml_meta", self.source()).with("bytes", bytes))
    }
}

pub struct TomlDocRenderer;

impl Renderer for TomlDocRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "toml_document" => {
                let mut out = record.source().to_string();
                if let Some(keys) = record.array_field("keys") {
                    for key in keys {
                        out.push_str(&format!(
                            "\n  {}: {}",
                            key["name"].as_str().unwrap_or(""),
                            key["type"].as_str().unwrap_or("")
                        ));
                    }
                }
                Ok(out)
            }
            "toml_value" => {
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

    fn adapter_for(file: &tempfile::NamedTempFile, query: QueryMap) -> TomlDocAdapter {
        TomlDocAdapter {
            path: file.path().to_path_buf(),
            query,
        }
    }

    #[test]
    fn test_table_summary() {
        let file = doc("title = \"demo\"\n\n[server]\nport = 8080\n");
        let record = adapter_for(&file, QueryMap::new()).structure().unwrap();
        assert_eq!(record.kind(), "toml_document");
        assert_eq!(record.array_field("keys").unwrap().len(), 2);
    }

    #[test]
    fn test_element_selection() {
        let file = doc("[server]\nport = 8080\n");
        let mut query = QueryMap::new();
        query.insert("element".to_string(), "server".to_string());
        let record = adapter_for(&file, query).structure().unwrap();
        assert_eq!(record.kind(), "toml_value");
        assert_eq!(record.str_field("value_type"), Some("table"));
        assert_eq!(record.get("value").unwrap()["port"], Value::from(8080));
    }

    #[test]
    fn test_invalid_toml_is_a_validation_error() {
        let file = doc("= broken =");
        let err = adapter_for(&file, QueryMap::new()).structure().unwrap_err();
        assert!(matches!(err, Error::AdapterValidation(_)));
    }
}
