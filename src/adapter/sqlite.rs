//! SQLite adapter
//!
//! `sqlite:///path/db.sqlite` lists tables with row counts; `?table=` shows
//! one table's columns and sample rows. The connection is read-only and lives
//! exactly as long as the dispatch.

use super::{Adapter, AdapterFactory, Renderer, parse_limit};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::ui;
use crate::uri::QueryMap;
use crate::{Error, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Value, json};
use std::path::PathBuf;

const DEFAULT_ROW_LIMIT: usize = 20;

pub struct SqliteFactory;

impl AdapterFactory for SqliteFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::ResourceAndQuery { resource, query } => {
                if resource.is_empty() {
                    return Construction::Invalid(
                        "the sqlite adapter requires an explicit database path, e.g. sqlite:///data/app.db"
                            .to_string(),
                    );
                }
                let path = PathBuf::from(resource);
                if !path.is_file() {
                    return Construction::Invalid(format!("no such database file: {resource}"));
                }
                match Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
                    Ok(conn) => Construction::Ready(Box::new(SqliteAdapter {
                        conn,
                        path,
                        query: (*query).clone(),
                    })),
                    Err(e) => Construction::Invalid(format!("cannot open {resource}: {e}")),
                }
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct SqliteAdapter {
    conn: Connection,
    path: PathBuf,
    query: QueryMap,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<{} byte blob>", b.len())),
    }
}

impl SqliteAdapter {
    fn source(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(names)
    }

    fn overview(&self) -> Result<ResultRecord> {
        let names = self.table_names()?;
        let mut tables = Vec::new();
        for name in &names {
            let rows: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
                [],
                |row| row.get(0),
            )?;
            tables.push(json!({"name": name, "rows": rows}));
        }
        Ok(ResultRecord::new("sqlite_database", self.source())
            .with("path", self.path.display().to_string())
            .with("count", tables.len())
            .with("tables", tables))
    }

    fn table_detail(&self, table: &str) -> Result<ResultRecord> {
        if !self.table_names()?.iter().any(|n| n == table) {
            return Err(Error::AdapterValidation(format!(
                "no such table '{table}' in {}",
                self.path.display()
            )));
        }
        let limit = parse_limit(&self.query, DEFAULT_ROW_LIMIT)?;

        let row_count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} LIMIT {limit}", quote_ident(table)))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut result_rows = stmt.query([])?;
        while let Some(row) = result_rows.next()? {
            let mut fields = Vec::with_capacity(column_count);
            for i in 0..column_count {
                fields.push(sql_value(row.get_ref(i)?));
            }
            rows.push(Value::Array(fields));
        }

        let truncated = row_count as usize > rows.len();
        Ok(ResultRecord::new("sqlite_table", self.source())
            .with("path", self.path.display().to_string())
            .with("table", table)
            .with("columns", columns)
            .with("rows", rows)
            .with("row_count", row_count)
            .with("truncated", truncated))
    }
}

impl Adapter for SqliteAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        match self.query.get("table").or_else(|| self.query.get("element")) {
            Some(table) => self.table_detail(&table.clone()),
            None => self.overview(),
        }
    }

    fn metadata(&self) -> Option<ResultRecord> {
        let bytes = std::fs::metadata(&self.path).map(|m| m.len()).ok()?;
        let tables = self.table_names().ok()?.len();
        Some(
            ResultRecord::new("sqlite_meta", self.source())
                .with("bytes", bytes)
                .with("tables", tables),
        )
    }
}

pub struct SqliteRenderer;

impl Renderer for SqliteRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "sqlite_database" => {
                let mut table = ui::TableBuilder::new();
                if let Some(tables) = record.array_field("tables") {
                    for t in tables {
                        table.add_row(
                            t["name"].as_str().unwrap_or(""),
                            &format!("{} rows", t["rows"]),
                        );
                    }
                }
                Ok(format!("{}\n{}", record.source(), table.build()))
            }
            "sqlite_table" => {
                let columns: Vec<String> = record
                    .array_field("columns")
                    .map(|c| {
                        c.iter()
                            .map(|v| v.as_str().unwrap_or("").to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                let rows: Vec<Vec<String>> = record
                    .array_field("rows")
                    .map(|rows| {
                        rows.iter()
                            .map(|row| match row {
                                Value::Array(fields) => fields
                                    .iter()
                                    .map(|f| match f {
                                        Value::String(s) => s.clone(),
                                        Value::Null => String::new(),
                                        other => other.to_string(),
                                    })
                                    .collect(),
                                other => vec![other.to_string()],
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let mut out = format!(
                    "{} table '{}'\n{}",
                    record.source(),
                    record.str_field("table").unwrap_or("?"),
                    ui::rows_table(&columns, &rows)
                );
                if let Some(count) = record.get("row_count") {
                    out.push_str(&format!("\n{count} rows total"));
                }
                Ok(out)
            }
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        match record.kind() {
            "sqlite_database" => {
                let path = record.str_field("path")?;
                let tables = record.array_field("tables")?;
                Some(
                    tables
                        .iter()
                        .enumerate()
                        .map(|(i, t)| {
                            GrepItem::new(path, i as u64 + 1, t["name"].as_str().unwrap_or(""))
                        })
                        .collect(),
                )
            }
            "sqlite_table" => {
                let path = record.str_field("path")?;
                let rows = record.array_field("rows")?;
                Some(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| {
                            let first = row
                                .as_array()
                                .and_then(|f| f.first())
                                .map(|v| match v {
                                    Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .unwrap_or_default();
                            GrepItem::new(path, i as u64 + 1, first)
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }
}

/// Introspection schema for the scheme listing.
pub fn query_schema() -> Value {
    json!({
        "table": "table to show (columns + sample rows)",
        "limit": "maximum sample rows (default 20)"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
            INSERT INTO users (name) VALUES ('ada'), ('grace'), ('edsger');
            CREATE TABLE empty_side (x REAL);
            "#,
        )
        .unwrap();
        (dir, path)
    }

    fn adapter_for(path: &PathBuf, query: QueryMap) -> SqliteAdapter {
        SqliteAdapter {
            conn: Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap(),
            path: path.clone(),
            query,
        }
    }

    #[test]
    fn test_overview_lists_tables() {
        let (_dir, path) = sample_db();
        let record = adapter_for(&path, QueryMap::new()).structure().unwrap();
        assert_eq!(record.kind(), "sqlite_database");
        assert_eq!(record.get("count"), Some(&Value::from(2)));
    }

    #[test]
    fn test_table_detail_with_limit() {
        let (_dir, path) = sample_db();
        let mut query = QueryMap::new();
        query.insert("table".to_string(), "users".to_string());
        query.insert("limit".to_string(), "2".to_string());
        let record = adapter_for(&path, query).structure().unwrap();
        assert_eq!(record.kind(), "sqlite_table");
        assert_eq!(record.get("row_count"), Some(&Value::from(3)));
        assert_eq!(record.array_field("rows").unwrap().len(), 2);
        assert_eq!(record.get("truncated"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_missing_table_is_a_validation_error() {
        let (_dir, path) = sample_db();
        let mut query = QueryMap::new();
        query.insert("table".to_string(), "nope".to_string());
        let err = adapter_for(&path, query).structure().unwrap_err();
        assert!(matches!(err, Error::AdapterValidation(_)));
    }

    #[test]
    fn test_construction_requires_existing_file() {
        let factory = SqliteFactory;
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
                resource: "/definitely/not/a.db",
                query: &empty
            }),
            Construction::Invalid(_)
        ));
    }

    #[test]
    fn test_end_to_end_table_dispatch() {
        let (_dir, path) = sample_db();
        let registry = crate::registry::default_registry();
        let uri = format!("sqlite://{}?table=users&limit=2", path.display());
        let opts = crate::dispatch::DispatchOptions {
            format: crate::render::Format::Json,
            show_meta: false,
        };
        let out = crate::dispatch::dispatch(&registry, &uri, &opts).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["type"], "sqlite_table");
        assert_eq!(value["rows"].as_array().unwrap().len(), 2);
    }
}
