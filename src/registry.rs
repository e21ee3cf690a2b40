//! Scheme registry - one (factory, renderer) binding per URI scheme
//!
//! Populated exactly once during deterministic startup and read-only
//! afterwards. No global state: the CLI builds a registry and passes it down,
//! and tests build their own.

use crate::adapter::{self, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default timeout for network-touching adapters.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// One scheme binding: factory + renderer, plus optional help text and an
/// optional query-schema producer for introspection commands.
pub struct RegistryEntry {
    scheme: String,
    pub factory: Box<dyn AdapterFactory>,
    pub renderer: Box<dyn Renderer>,
    pub help: Option<&'static str>,
    pub schema: Option<fn() -> serde_json::Value>,
}

impl RegistryEntry {
    pub fn new(
        scheme: impl Into<String>,
        factory: Box<dyn AdapterFactory>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            factory,
            renderer,
            help: None,
            schema: None,
        }
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_schema(mut self, schema: fn() -> serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

/// Registry of scheme bindings, keyed by exact (case-sensitive) scheme.
#[derive(Default)]
pub struct SchemeRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl SchemeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scheme binding.
    ///
    /// Panics on a duplicate scheme: double registration is a programming
    /// error in startup wiring, not a recoverable runtime condition.
    pub fn register(&mut self, entry: RegistryEntry) {
        let scheme = entry.scheme.clone();
        if self.entries.insert(scheme.clone(), entry).is_some() {
            panic!("duplicate scheme registration: '{scheme}'");
        }
    }

    /// Look up the full entry for a scheme.
    pub fn entry(&self, scheme: &str) -> Option<&RegistryEntry> {
        self.entries.get(scheme)
    }

    /// Look up the adapter factory for a scheme.
    pub fn adapter_factory(&self, scheme: &str) -> Option<&dyn AdapterFactory> {
        self.entries.get(scheme).map(|e| e.factory.as_ref())
    }

    /// Look up the renderer for a scheme.
    pub fn renderer(&self, scheme: &str) -> Option<&dyn Renderer> {
        self.entries.get(scheme).map(|e| e.renderer.as_ref())
    }

    /// All registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Iterate all entries, sorted by scheme.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every binding. Exposed explicitly for test isolation; production
    /// code never mutates a registry after startup.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Build the registry of all built-in schemes, in fixed order, with the
/// default network timeout.
pub fn default_registry() -> SchemeRegistry {
    default_registry_with_timeout(DEFAULT_HTTP_TIMEOUT)
}

/// Same as [`default_registry`] with an explicit network timeout, for
/// configuration-driven startup.
pub fn default_registry_with_timeout(http_timeout: Duration) -> SchemeRegistry {
    let mut registry = SchemeRegistry::new();
    registry.register(
        RegistryEntry::new(
            "env",
            Box::new(adapter::env::EnvFactory),
            Box::new(adapter::env::EnvRenderer),
        )
        .with_help("process environment; env://NAME looks up one variable")
        .with_schema(adapter::env::query_schema),
    );
    registry.register(
        RegistryEntry::new(
            "path",
            Box::new(adapter::path_probe::PathFactory),
            Box::new(adapter::path_probe::PathRenderer),
        )
        .with_help("executable search path; path://NAME locates a binary"),
    );
    registry.register(
        RegistryEntry::new(
            "json",
            Box::new(adapter::json_doc::JsonDocFactory),
            Box::new(adapter::json_doc::JsonDocRenderer),
        )
        .with_help("JSON documents; json:///file.json, ?element= selects a key or pointer"),
    );
    registry.register(
        RegistryEntry::new(
            "toml",
            Box::new(adapter::toml_doc::TomlDocFactory),
            Box::new(adapter::toml_doc::TomlDocRenderer),
        )
        .with_help("TOML documents; toml:///file.toml, ?element= selects a top-level key"),
    );
    registry.register(
        RegistryEntry::new(
            "csv",
            Box::new(adapter::csv_file::CsvFactory),
            Box::new(adapter::csv_file::CsvRenderer),
        )
        .with_help("CSV files; ?limit= caps rows, ?match= filters rows by regex")
        .with_schema(adapter::csv_file::query_schema),
    );
    registry.register(
        RegistryEntry::new(
            "sqlite",
            Box::new(adapter::sqlite::SqliteFactory),
            Box::new(adapter::sqlite::SqliteRenderer),
        )
        .with_help("SQLite databases; ?table= selects a table, ?limit= caps rows")
        .with_schema(adapter::sqlite::query_schema),
    );
    registry.register(
        RegistryEntry::new(
            "xlsx",
            Box::new(adapter::xlsx::XlsxFactory),
            Box::new(adapter::xlsx::XlsxRenderer),
        )
        .with_help("Excel workbooks; ?sheet= selects a sheet by index or name, ?limit= caps rows")
        .with_schema(adapter::xlsx::query_schema),
    );
    registry.register(
        RegistryEntry::new(
            "dir",
            Box::new(adapter::dir::DirFactory),
            Box::new(adapter::dir::DirRenderer),
        )
        .with_help("directory listings; dir:// browses the current directory"),
    );
    registry.register(
        RegistryEntry::new(
            "git",
            Box::new(adapter::git::GitFactory),
            Box::new(adapter::git::GitRenderer),
        )
        .with_help("git repositories; ?ref= shows one ref, ?limit= caps the commit log"),
    );
    registry.register(
        RegistryEntry::new(
            "http",
            Box::new(adapter::http::HttpFactory::new("http", http_timeout)),
            Box::new(adapter::http::HttpRenderer),
        )
        .with_help("HTTP resources; bounded existence/header probe"),
    );
    registry.register(
        RegistryEntry::new(
            "https",
            Box::new(adapter::http::HttpFactory::new("https", http_timeout)),
            Box::new(adapter::http::HttpRenderer),
        )
        .with_help("HTTPS resources; bounded existence/header probe"),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scheme_fully_bound() {
        let registry = default_registry();
        assert!(!registry.is_empty());
        for scheme in registry.schemes() {
            assert!(registry.adapter_factory(scheme).is_some(), "{scheme}");
            assert!(registry.renderer(scheme).is_some(), "{scheme}");
            assert!(registry.schemes().contains(&scheme));
        }
    }

    #[test]
    fn test_no_args_shape_never_rejects_a_value() {
        // The zero-argument shape carries no value, so no factory may answer
        // it with Invalid or Failed.
        let registry = default_registry();
        for entry in registry.entries() {
            let outcome = entry.factory.construct(&ConstructInput::NoArgs);
            assert!(
                matches!(outcome, Construction::Ready(_) | Construction::Mismatch),
                "scheme '{}' mishandles the no-argument shape: {outcome:?}",
                entry.scheme()
            );
        }
    }

    #[test]
    #[should_panic(expected = "duplicate scheme registration")]
    fn test_duplicate_registration_panics() {
        let mut registry = default_registry();
        registry.register(RegistryEntry::new(
            "env",
            Box::new(adapter::env::EnvFactory),
            Box::new(adapter::env::EnvRenderer),
        ));
    }

    #[test]
    fn test_clear_is_explicit() {
        let mut registry = default_registry();
        assert!(!registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.adapter_factory("env").is_none());
    }
}
