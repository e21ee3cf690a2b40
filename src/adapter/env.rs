//! Environment adapter - browse process environment variables
//!
//! `env://` dumps the whole environment; `env://NAME` looks up one variable.

use super::{Adapter, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::Result;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub struct EnvFactory;

impl AdapterFactory for EnvFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            // Ambient resource: the environment needs no arguments.
            ConstructInput::NoArgs => Construction::Ready(Box::new(EnvAdapter::from_process())),
            _ => Construction::Mismatch,
        }
    }
}

/// Snapshot of the process environment, taken at construction.
pub struct EnvAdapter {
    vars: BTreeMap<String, String>,
}

impl EnvAdapter {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit variables, for tests.
    pub fn with_vars(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }
}

impl Adapter for EnvAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let mut map = Map::new();
        for (name, value) in &self.vars {
            map.insert(name.clone(), Value::String(value.clone()));
        }
        Ok(ResultRecord::new("env_map", "env://")
            .with("count", self.vars.len())
            .with("vars", Value::Object(map)))
    }

    fn element(&self, name: &str) -> Result<Option<ResultRecord>> {
        Ok(self.vars.get(name).map(|value| {
            ResultRecord::new("env_var", format!("env://{name}"))
                .with("name", name)
                .with("value", value.clone())
        }))
    }

    fn metadata(&self) -> Option<ResultRecord> {
        Some(ResultRecord::new("env_meta", "env://").with("count", self.vars.len()))
    }
}

pub struct EnvRenderer;

impl Renderer for EnvRenderer {
    fn supports_element(&self) -> bool {
        true
    }

    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "env_map" => {
                let mut lines = Vec::new();
                if let Some(Value::Object(vars)) = record.get("vars") {
                    for (name, value) in vars {
                        lines.push(format!("{}={}", name, value.as_str().unwrap_or("")));
                    }
                }
                lines.push(format!("({} variables)", lines.len()));
                Ok(lines.join("\n"))
            }
            "env_var" => Ok(format!(
                "{}={}",
                record.str_field("name").unwrap_or(""),
                record.str_field("value").unwrap_or("")
            )),
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        match record.get("vars") {
            Some(Value::Object(vars)) => Some(
                vars.keys()
                    .enumerate()
                    .map(|(i, name)| GrepItem::new("env", i as u64 + 1, name.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Introspection schema for the scheme listing.
pub fn query_schema() -> Value {
    json!({
        "element": "variable name to look up (or use env://NAME)"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnvAdapter {
        let mut vars = BTreeMap::new();
        vars.insert("HOME".to_string(), "/home/u".to_string());
        vars.insert("SHELL".to_string(), "/bin/sh".to_string());
        EnvAdapter::with_vars(vars)
    }

    #[test]
    fn test_structure_counts_vars() {
        let record = sample().structure().unwrap();
        assert_eq!(record.kind(), "env_map");
        assert_eq!(record.get("count"), Some(&Value::from(2)));
    }

    #[test]
    fn test_element_lookup() {
        let record = sample().element("HOME").unwrap().unwrap();
        assert_eq!(record.kind(), "env_var");
        assert_eq!(record.str_field("value"), Some("/home/u"));
    }

    #[test]
    fn test_missing_element_is_absent_not_error() {
        assert!(sample().element("__definitely_missing__").unwrap().is_none());
    }

    #[test]
    fn test_constructs_only_from_no_args() {
        let factory = EnvFactory;
        assert!(matches!(
            factory.construct(&ConstructInput::NoArgs),
            Construction::Ready(_)
        ));
        assert!(matches!(
            factory.construct(&ConstructInput::ResourceOnly { resource: "HOME" }),
            Construction::Mismatch
        ));
    }

    #[test]
    fn test_element_text_rendering() {
        let record = sample().element("SHELL").unwrap().unwrap();
        let out = EnvRenderer.render_element(&record, crate::render::Format::Text).unwrap();
        assert_eq!(out, "SHELL=/bin/sh");
    }
}
