//! Rendering - format multiplexing and error presentation
//!
//! `json` output is always the record serialized verbatim. `text` is keyed on
//! the record type by each scheme's renderer, with [`raw_dump`] as the shared
//! fallback for unrecognized types. `grep` emits `path:line:name` lines for
//! piping into line-oriented tools. `csv` projects tabular records; records
//! without a tabular shape fall back to `json`.

use crate::record::ResultRecord;
use crate::ui;
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed set of output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
    Grep,
    Csv,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Text => "text",
            Format::Json => "json",
            Format::Grep => "grep",
            Format::Csv => "csv",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "grep" => Ok(Format::Grep),
            "csv" => Ok(Format::Csv),
            other => Err(Error::InvalidUri(format!(
                "unknown format '{other}' (expected text, json, grep or csv)"
            ))),
        }
    }
}

/// One matched sub-item for grep output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepItem {
    pub path: String,
    pub line: u64,
    pub name: String,
}

impl GrepItem {
    pub fn new(path: impl Into<String>, line: u64, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            name: name.into(),
        }
    }
}

/// Serialize a record verbatim. Deterministic: two renders of the same
/// record are byte-identical.
pub fn to_json(record: &ResultRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// One `path:line:name` line per item.
pub fn grep_lines(items: &[GrepItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}:{}:{}", i.path, i.line, i.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Project a record with `columns` + `rows` fields into CSV.
///
/// Answers `Ok(None)` for records without that tabular shape so callers can
/// fall back to json.
pub fn record_to_csv(record: &ResultRecord) -> Result<Option<String>> {
    let Some(columns) = record.array_field("columns") else {
        return Ok(None);
    };
    let Some(rows) = record.array_field("rows") else {
        return Ok(None);
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(cell))?;
    for row in rows {
        match row {
            Value::Array(fields) => writer.write_record(fields.iter().map(cell))?,
            other => writer.write_record([cell(other)])?,
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Adapter(format!("csv buffering failed: {e}")))?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Shared text fallback: a raw structured dump of the record. Used whenever a
/// renderer meets a record type it does not recognize; never crashes.
pub fn raw_dump(record: &ResultRecord) -> String {
    let mut out = format!("{} ({})", record.kind(), record.source());
    for (key, value) in record.fields() {
        if key == "type" || key == "source" {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
        };
        out.push_str(&format!("\n  {key}: {rendered}"));
    }
    out
}

/// Present an element-not-found record. Not an error: the dispatch exits 0.
pub fn render_not_found(record: &ResultRecord, format: Format) -> Result<String> {
    match format {
        Format::Json => to_json(record),
        _ => Ok(format!(
            "no such element '{}' in {}",
            record.str_field("element").unwrap_or("?"),
            record.source()
        )),
    }
}

/// Format a user-facing error to stderr, choosing the presentation by error
/// kind. Missing-dependency conditions get installation guidance appended.
pub fn render_error(err: &Error, debug: bool) {
    match err {
        Error::MissingDependency { name, install } => {
            ui::error(&format!("missing dependency '{name}'"));
            ui::hint(&format!("to install it: {install}"));
        }
        Error::SchemeNotFound { .. }
        | Error::InvalidUri(_)
        | Error::ConstructionExhausted { .. }
        | Error::AdapterValidation(_) => {
            ui::error(&err.to_string());
        }
        Error::AdapterInternal(_) => {
            ui::error(&err.to_string());
            if debug {
                eprintln!("{err:#?}");
            } else {
                ui::hint("re-run with --debug for the full failure detail");
            }
        }
        other => {
            ui::error(&other.to_string());
            if debug {
                eprintln!("{other:#?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_idempotence() {
        let record = ResultRecord::new("git_ref", "git:///srv/app")
            .with("name", "main")
            .with("commit", "abc1234");
        let first = to_json(&record).unwrap();
        let second = to_json(&record).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_grep_shape() {
        let items = vec![
            GrepItem::new("src/a.rs", 3, "foo"),
            GrepItem::new("src/b.rs", 14, "bar"),
        ];
        assert_eq!(grep_lines(&items), "src/a.rs:3:foo\nsrc/b.rs:14:bar");
    }

    #[test]
    fn test_tabular_record_to_csv() {
        let record = ResultRecord::new("sqlite_table", "sqlite:///db")
            .with("columns", json!(["id", "name"]))
            .with("rows", json!([[1, "ada"], [2, "grace"]]));
        let csv = record_to_csv(&record).unwrap().unwrap();
        assert_eq!(csv, "id,name\n1,ada\n2,grace\n");
    }

    #[test]
    fn test_non_tabular_record_has_no_csv() {
        let record = ResultRecord::new("env_var", "env://HOME").with("value", "/home/u");
        assert!(record_to_csv(&record).unwrap().is_none());
    }

    #[test]
    fn test_raw_dump_never_crashes() {
        let record = ResultRecord::new("mystery_blob", "somewhere")
            .with("nested", json!({"a": [1, 2]}))
            .with("note", "plain");
        let dump = raw_dump(&record);
        assert!(dump.starts_with("mystery_blob (somewhere)"));
        assert!(dump.contains("note: plain"));
    }
}
