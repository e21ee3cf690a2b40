//! Excel workbook adapter
//!
//! `xlsx:///path/book.xlsx` lists sheets with their dimensions; `?sheet=`
//! selects one sheet by index or name, `?limit=` caps the sampled rows. The
//! first row of a sheet is treated as its header row.

use super::{Adapter, AdapterFactory, Renderer, parse_limit};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::ui;
use crate::uri::QueryMap;
use crate::{Error, Result};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

const DEFAULT_ROW_LIMIT: usize = 50;
const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub struct XlsxFactory;

impl AdapterFactory for XlsxFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::BasePath { base_path, query } => {
                if base_path.is_empty() {
                    return Construction::Invalid(
                        "the xlsx adapter requires a workbook path, e.g. xlsx:///data/book.xlsx"
                            .to_string(),
                    );
                }
                let path = PathBuf::from(base_path);
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
                    return Construction::Invalid(format!(
                        "unsupported extension '{extension}' (expected one of: {})",
                        SUPPORTED_EXTENSIONS.join(", ")
                    ));
                }
                if !path.is_file() {
                    return Construction::Invalid(format!("no such file: {base_path}"));
                }
                match open_workbook_auto(&path) {
                    Ok(workbook) => Construction::Ready(Box::new(XlsxAdapter {
                        path,
                        query: (*query).clone(),
                        workbook: RefCell::new(workbook),
                    })),
                    Err(e) => {
                        Construction::Invalid(format!("cannot open workbook {base_path}: {e}"))
                    }
                }
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct XlsxAdapter {
    path: PathBuf,
    query: QueryMap,
    workbook: RefCell<Sheets<BufReader<File>>>,
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Int(i) => Value::from(*i),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

impl XlsxAdapter {
    fn source(&self) -> String {
        format!("xlsx://{}", self.path.display())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.borrow().sheet_names().to_vec()
    }

    fn resolve_sheet(&self, selector: &str) -> Result<String> {
        let names = self.sheet_names();
        match selector.parse::<usize>() {
            Ok(index) => names.get(index).cloned().ok_or_else(|| {
                Error::AdapterValidation(format!(
                    "sheet index {index} out of range ({} sheets)",
                    names.len()
                ))
            }),
            Err(_) => names
                .iter()
                .find(|n| n.as_str() == selector)
                .cloned()
                .ok_or_else(|| {
                    Error::AdapterValidation(format!(
                        "no such sheet '{selector}' (sheets: {})",
                        names.join(", ")
                    ))
                }),
        }
    }

    fn sheet_detail(&self, selector: &str) -> Result<ResultRecord> {
        let name = self.resolve_sheet(selector)?;
        let limit = parse_limit(&self.query, DEFAULT_ROW_LIMIT)?;
        let range = self
            .workbook
            .borrow_mut()
            .worksheet_range(&name)
            .map_err(|e| Error::Adapter(format!("cannot read sheet '{name}': {e}")))?;

        let mut rows_iter = range.rows();
        let columns: Vec<Value> = rows_iter
            .next()
            .map(|header| {
                header
                    .iter()
                    .map(|c| Value::String(c.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let mut rows = Vec::new();
        let mut data_rows = 0usize;
        for row in rows_iter {
            data_rows += 1;
            if rows.len() < limit {
                rows.push(Value::Array(row.iter().map(cell_value).collect()));
            }
        }

        let truncated = data_rows > rows.len();
        Ok(ResultRecord::new("xlsx_sheet", self.source())
            .with("path", self.path.display().to_string())
            .with("sheet_name", name)
            .with("columns", columns)
            .with("rows", rows)
            .with("row_count", data_rows)
            .with("truncated", truncated))
    }

    fn workbook_overview(&self) -> Result<ResultRecord> {
        let names = self.sheet_names();
        let mut sheets = Vec::new();
        for name in &names {
            let range = self
                .workbook
                .borrow_mut()
                .worksheet_range(name)
                .map_err(|e| Error::Adapter(format!("cannot read sheet '{name}': {e}")))?;
            let (rows, cols) = range.get_size();
            sheets.push(json!({"name": name, "rows": rows, "cols": cols}));
        }
        Ok(ResultRecord::new("xlsx_workbook", self.source())
            .with("path", self.path.display().to_string())
            .with("count", sheets.len())
            .with("sheets", sheets))
    }
}

impl Adapter for XlsxAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        match self.query.get("sheet").or_else(|| self.query.get("element")) {
            Some(selector) => self.sheet_detail(&selector.clone()),
            None => self.workbook_overview(),
        }
    }

    fn metadata(&self) -> Option<ResultRecord> {
        let bytes = std::fs::metadata(&self.path).map(|m| m.len()).ok()?;
        Some(
            ResultRecord::new("xlsx_meta", self.source())
                .with("bytes", bytes)
                .with("sheets", self.sheet_names().len()),
        )
    }
}

pub struct XlsxRenderer;

impl Renderer for XlsxRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "xlsx_workbook" => {
                let mut table = ui::TableBuilder::new();
                if let Some(sheets) = record.array_field("sheets") {
                    for sheet in sheets {
                        table.add_row(
                            sheet["name"].as_str().unwrap_or(""),
                            &format!("{} x {}", sheet["rows"], sheet["cols"]),
                        );
                    }
                }
                Ok(format!("{}\n{}", record.source(), table.build()))
            }
            "xlsx_sheet" => {
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
                    "{} sheet '{}'\n{}",
                    record.source(),
                    record.str_field("sheet_name").unwrap_or("?"),
                    ui::rows_table(&columns, &rows)
                );
                if let Some(count) = record.get("row_count") {
                    out.push_str(&format!("\n{count} data rows total"));
                }
                Ok(out)
            }
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        match record.kind() {
            "xlsx_workbook" => {
                let path = record.str_field("path")?;
                let sheets = record.array_field("sheets")?;
                Some(
                    sheets
                        .iter()
                        .enumerate()
                        .map(|(i, s)| {
                            GrepItem::new(path, i as u64 + 1, s["name"].as_str().unwrap_or(""))
                        })
                        .collect(),
                )
            }
            "xlsx_sheet" => {
                let sheet = record.str_field("sheet_name")?;
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
                            // +2: 1-based, after the header row
                            GrepItem::new(sheet, i as u64 + 2, first)
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
        "sheet": "sheet to sample, by zero-based index or name",
        "limit": "maximum sample rows (default 50)"
    })
}
