//! Adapter framework
//!
//! Defines the boundary every scheme backend satisfies: a factory that
//! answers the construction probe, an adapter that extracts structure or a
//! named element, and a renderer that turns result records into output.
//! One file per scheme; each holds its factory, adapter, renderer and tests.

pub mod csv_file;
pub mod dir;
pub mod env;
pub mod git;
pub mod http;
pub mod json_doc;
pub mod path_probe;
pub mod sqlite;
pub mod toml_doc;
pub mod xlsx;

use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render::{self, Format, GrepItem};
use crate::Result;

/// Parse an optional `?limit=` query parameter, with a scheme default.
pub(crate) fn parse_limit(query: &crate::uri::QueryMap, default: usize) -> Result<usize> {
    match query.get("limit") {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            crate::Error::AdapterValidation(format!("invalid limit '{raw}' (expected a number)"))
        }),
    }
}

/// Builds an adapter from one of the recognized construction shapes.
///
/// Contract: answer [`Construction::Mismatch`] for shapes that do not apply,
/// [`Construction::Invalid`] when a shape applies but the value is bad, and
/// reserve [`Construction::Failed`] for genuine misbehavior or a missing
/// external dependency. The no-argument shape must never answer `Invalid`.
pub trait AdapterFactory {
    fn construct(&self, input: &ConstructInput) -> Construction;
}

/// A live handle on one resource, scoped to a single dispatch.
///
/// Any resources held (file handles, database connections) are released when
/// the adapter is dropped, on every exit path.
pub trait Adapter {
    /// Full structural summary. Mandatory for every adapter.
    fn structure(&self) -> Result<ResultRecord>;

    /// Look up one named element. `Ok(None)` means "no such element" and is
    /// never an error; an `Err` here is adapter misbehavior. Only required
    /// when the paired renderer declares element support.
    fn element(&self, name: &str) -> Result<Option<ResultRecord>> {
        let _ = name;
        Err(crate::Error::AdapterInternal(
            "element lookup is not supported by this adapter".to_string(),
        ))
    }

    /// Coarse descriptive metadata, surfaced on demand only - never used in
    /// dispatch decisions.
    fn metadata(&self) -> Option<ResultRecord> {
        None
    }
}

impl std::fmt::Debug for dyn Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<adapter>")
    }
}

/// Renders one scheme's result records.
///
/// `json` output always serializes the record verbatim; `text` dispatches on
/// the record's `type` and falls back to a raw dump for unrecognized types;
/// `grep` and `csv` fall back to `json` where the record has no line-oriented
/// or tabular projection.
pub trait Renderer {
    /// Explicit capability flag: does this renderer present single elements?
    /// This is what routes a dispatch to element lookup instead of full
    /// structure extraction.
    fn supports_element(&self) -> bool {
        false
    }

    /// Type-keyed text formatting. Implementations match on `record.kind()`
    /// and fall back to [`render::raw_dump`] for anything unrecognized.
    fn text(&self, record: &ResultRecord) -> Result<String>;

    /// Line-oriented projection for grep output, if this record has one.
    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        let _ = record;
        None
    }

    /// Format-multiplexed structure rendering.
    fn render_structure(&self, record: &ResultRecord, format: Format) -> Result<String> {
        match format {
            Format::Json => render::to_json(record),
            Format::Text => self.text(record),
            Format::Grep => match self.grep_items(record) {
                Some(items) => Ok(render::grep_lines(&items)),
                None => render::to_json(record),
            },
            Format::Csv => match render::record_to_csv(record)? {
                Some(csv) => Ok(csv),
                None => render::to_json(record),
            },
        }
    }

    /// Format-multiplexed element rendering. Meaningful only when
    /// [`Renderer::supports_element`] answers true.
    fn render_element(&self, record: &ResultRecord, format: Format) -> Result<String> {
        self.render_structure(record, format)
    }
}
