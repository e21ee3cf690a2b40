//! CSV adapter
//!
//! `csv:///path/file.csv` shows headers and sample rows. `?limit=` caps the
//! sample, `?match=` keeps only rows where some field matches a regex.

use super::{Adapter, AdapterFactory, Renderer, parse_limit};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::ui;
use crate::uri::QueryMap;
use crate::{Error, Result};
use regex::Regex;
use serde_json::{Value, json};
use std::path::PathBuf;

const DEFAULT_ROW_LIMIT: usize = 20;

pub struct CsvFactory;

impl AdapterFactory for CsvFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::ResourceAndQuery { resource, query } => {
                if resource.is_empty() {
                    return Construction::Invalid(
                        "the csv adapter requires a file path, e.g. csv:///data/sales.csv"
                            .to_string(),
                    );
                }
                let path = PathBuf::from(resource);
                if !path.is_file() {
                    return Construction::Invalid(format!("no such file: {resource}"));
                }
                Construction::Ready(Box::new(CsvAdapter {
                    path,
                    query: (*query).clone(),
                }))
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct CsvAdapter {
    path: PathBuf,
    query: QueryMap,
}

impl CsvAdapter {
    fn source(&self) -> String {
        format!("csv://{}", self.path.display())
    }

    fn matcher(&self) -> Result<Option<Regex>> {
        match self.query.get("match") {
            None => Ok(None),
            Some(pattern) => Regex::new(pattern).map(Some).map_err(|e| {
                Error::AdapterValidation(format!("invalid match pattern '{pattern}': {e}"))
            }),
        }
    }
}

impl Adapter for CsvAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let limit = parse_limit(&self.query, DEFAULT_ROW_LIMIT)?;
        let matcher = self.matcher()?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows: Vec<Value> = Vec::new();
        let mut total = 0usize;
        let mut matched = 0usize;
        for record in reader.records() {
            let record = record?;
            total += 1;
            if let Some(re) = &matcher {
                if !record.iter().any(|field| re.is_match(field)) {
                    continue;
                }
            }
            matched += 1;
            if rows.len() < limit {
                rows.push(Value::Array(
                    record.iter().map(|f| Value::String(f.to_string())).collect(),
                ));
            }
        }

        let truncated = matched > rows.len();
        let mut result = ResultRecord::new("csv_table", self.source())
            .with("path", self.path.display().to_string())
            .with("columns", columns)
            .with("rows", rows)
            .with("row_count", total)
            .with("truncated", truncated);
        if matcher.is_some() {
            result = result.with("matched", matched);
        }
        Ok(result)
    }

    fn metadata(&self) -> Option<ResultRecord> {
        let bytes = std::fs::metadata(&self.path).map(|m| m.len()).ok()?;
        Some(ResultRecord::new("csv_meta", self.source()).with("bytes", bytes))
    }
}

pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "csv_table" => {
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
                                    .map(|f| f.as_str().unwrap_or("").to_string())
                                    .collect(),
                                other => vec![other.to_string()],
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let mut out = ui::rows_table(&columns, &rows);
                if let Some(count) = record.get("row_count") {
                    out.push_str(&format!("\n{count} rows total"));
                }
                Ok(out)
            }
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        let path = record.str_field("path")?;
        let rows = record.array_field("rows")?;
        Some(
            rows.iter()
                .enumerate()
                .map(|(i, row)| {
                    let first = row
                        .as_array()
                        .and_then(|f| f.first())
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    // +2: 1-based, after the header line
                    GrepItem::new(path, i as u64 + 2, first.to_string())
                })
                .collect(),
        )
    }
}

/// Introspection schema for the scheme listing.
pub fn query_schema() -> Value {
    json!({
        "limit": "maximum sample rows (default 20)",
        "match": "regex; keep only rows with a matching field"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn adapter_for(file: &tempfile::NamedTempFile, query: QueryMap) -> CsvAdapter {
        CsvAdapter {
            path: file.path().to_path_buf(),
            query,
        }
    }

    const SAMPLE: &str = "region,amount\nnorth,10\nsouth,20\neast,30\n";

    #[test]
    fn test_headers_and_rows() {
        let file = csv_file(SAMPLE);
        let record = adapter_for(&file, QueryMap::new()).structure().unwrap();
        assert_eq!(record.kind(), "csv_table");
        assert_eq!(record.get("row_count"), Some(&Value::from(3)));
        assert_eq!(record.array_field("rows").unwrap().len(), 3);
        assert_eq!(
            record.array_field("columns").unwrap()[0],
            Value::from("region")
        );
    }

    #[test]
    fn test_limit_truncates() {
        let file = csv_file(SAMPLE);
        let mut query = QueryMap::new();
        query.insert("limit".to_string(), "1".to_string());
        let record = adapter_for(&file, query).structure().unwrap();
        assert_eq!(record.array_field("rows").unwrap().len(), 1);
        assert_eq!(record.get("truncated"), Some(&Value::Bool(true)));
        // the full count is still reported
        assert_eq!(record.get("row_count"), Some(&Value::from(3)));
    }

    #[test]
    fn test_match_filters_rows() {
        let file = csv_file(SAMPLE);
        let mut query = QueryMap::new();
        query.insert("match".to_string(), "^s".to_string());
        let record = adapter_for(&file, query).structure().unwrap();
        assert_eq!(record.array_field("rows").unwrap().len(), 1);
        assert_eq!(record.get("matched"), Some(&Value::from(1)));
    }

    #[test]
    fn test_bad_regex_is_a_validation_error() {
        let file = csv_file(SAMPLE);
        let mut query = QueryMap::new();
        query.insert("match".to_string(), "(".to_string());
        let err = adapter_for(&file, query).structure().unwrap_err();
        assert!(matches!(err, Error::AdapterValidation(_)));
    }

    #[test]
    fn test_csv_format_round_trips_rows() {
        let file = csv_file(SAMPLE);
        let record = adapter_for(&file, QueryMap::new()).structure().unwrap();
        let out = CsvRenderer
            .render_structure(&record, crate::render::Format::Csv)
            .unwrap();
        assert!(out.starts_with("region,amount\n"));
        assert!(out.contains("south,20"));
    }
}
