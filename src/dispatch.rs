//! Dispatch - one URI through the whole pipeline
//!
//! parse -> registry lookup -> construction probe -> extraction -> rendering.
//! Single-threaded and sequential by design: one URI is fully resolved before
//! the next, and the read-only registry is the only state shared between
//! entries of a batch.

use crate::probe::probe;
use crate::record::ResultRecord;
use crate::registry::SchemeRegistry;
use crate::render::{self, Format};
use crate::uri::ResourceUri;
use crate::{Error, Result};
use std::path::Path;

/// Per-invocation rendering options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    pub format: Format,
    /// Surface the adapter's coarse metadata instead of extracting.
    pub show_meta: bool,
}

/// Resolve one URI end to end and return the rendered output.
///
/// Element-not-found is a success: it renders as an explicit not-found value
/// and the caller exits 0.
pub fn dispatch(registry: &SchemeRegistry, raw: &str, opts: &DispatchOptions) -> Result<String> {
    let uri = ResourceUri::parse(raw, None, None)?;
    let entry = registry.entry(&uri.scheme).ok_or_else(|| Error::SchemeNotFound {
        scheme: uri.scheme.clone(),
        known: registry.schemes().iter().map(|s| s.to_string()).collect(),
    })?;

    tracing::debug!(scheme = %uri.scheme, resource = uri.resource(), "dispatching");
    let adapter = probe(&uri.scheme, entry.factory.as_ref(), &uri)?;

    if opts.show_meta {
        let record = adapter
            .metadata()
            .unwrap_or_else(|| ResultRecord::new("no_metadata", raw));
        return match opts.format {
            Format::Text => Ok(render::raw_dump(&record)),
            _ => render::to_json(&record),
        };
    }

    let renderer = entry.renderer.as_ref();
    let resource = uri.resource();

    // A bare `scheme://NAME` means "look up element NAME" for element-based
    // schemes, without needing an explicit ?element= parameter.
    if renderer.supports_element() && (uri.element.is_some() || !resource.is_empty()) {
        let name = uri
            .element
            .clone()
            .unwrap_or_else(|| resource.to_string());
        match adapter.element(&name) {
            Ok(Some(record)) => renderer.render_element(&record, opts.format),
            Ok(None) => {
                let record = ResultRecord::new("not_found", raw).with("element", name);
                render::render_not_found(&record, opts.format)
            }
            // Distinct from "not found": the adapter misbehaved.
            Err(err) => Err(internalize(err)),
        }
    } else {
        let record = adapter.structure()?;
        renderer.render_structure(&record, opts.format)
    }
}

/// Element lookup must signal a missing name with `Ok(None)`; anything it
/// raises is adapter misbehavior, except a missing external dependency which
/// keeps its installation guidance.
fn internalize(err: Error) -> Error {
    match err {
        Error::MissingDependency { .. } => err,
        other => Error::AdapterInternal(other.to_string()),
    }
}

/// Resolve every URI in a list file, one per line.
///
/// Blank lines and `#` comments are skipped. A failing entry is logged and
/// rendered to stderr, then the batch continues; the number of failures is
/// returned so the caller can pick the exit code.
pub fn dispatch_batch(
    registry: &SchemeRegistry,
    list_path: &Path,
    opts: &DispatchOptions,
    debug: bool,
) -> Result<usize> {
    let contents = std::fs::read_to_string(list_path)?;
    let mut failures = 0;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match dispatch(registry, line, opts) {
            Ok(output) => println!("{output}"),
            Err(err) => {
                tracing::error!("{line}: {err}");
                render::render_error(&err, debug);
                failures += 1;
            }
        }
    }
    Ok(failures)
}
