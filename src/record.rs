//! Result records - the tagged, ephemeral values adapters hand to renderers
//!
//! Every record carries a `type` discriminant (e.g. `"xlsx_sheet"`,
//! `"sqlite_table"`, `"git_ref"`) and a `source` naming where it came from;
//! the rest of the payload is adapter-defined. Records are created fresh per
//! dispatch and consumed immediately - they are never cached.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tagged result value produced by an adapter.
///
/// Thin wrapper over a JSON object map; the constructor enforces the
/// `type` + `source` invariant the renderers rely on. Serialization is
/// verbatim and deterministic (sorted keys), so rendering the same record
/// twice yields byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(Map<String, Value>);

impl ResultRecord {
    /// Create a record with the mandatory discriminant and source fields.
    pub fn new(kind: &str, source: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(kind.to_string()));
        map.insert("source".to_string(), Value::String(source.into()));
        Self(map)
    }

    /// Attach a payload field (builder style).
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// The `type` discriminant.
    pub fn kind(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or("")
    }

    /// The `source` field.
    pub fn source(&self) -> &str {
        self.0.get("source").and_then(Value::as_str).unwrap_or("")
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a payload field as a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Look up a payload field as an array.
    pub fn array_field(&self, key: &str) -> Option<&Vec<Value>> {
        self.0.get(key).and_then(Value::as_array)
    }

    /// All fields, for renderers that dump the record raw.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<ResultRecord> for Value {
    fn from(record: ResultRecord) -> Self {
        Value::Object(record.0)
    }
}
