//! # Resview - Universal Resource Browser
//!
//! Point it at anything addressable by a URI and get a structural summary back.
//!
//! Resview provides:
//! - A scheme registry binding each URI scheme to an adapter and a renderer
//! - A fixed-order construction probe that turns a raw resource string into
//!   a live adapter without a shared constructor signature
//! - A uniform extraction contract: full structure, or one named element
//! - Format-multiplexed rendering (text, json, grep, csv) with safe fallbacks
//! - Built-in adapters for environment variables, executables on PATH, JSON,
//!   TOML, CSV, SQLite, Excel workbooks, directories, git repositories and HTTP

pub mod adapter;
pub mod config;
pub mod dispatch;
pub mod probe;
pub mod record;
pub mod registry;
pub mod render;
pub mod ui;
pub mod uri;

// Re-exports for convenient access
pub use record::ResultRecord;
pub use registry::{RegistryEntry, SchemeRegistry, default_registry};
pub use render::Format;
pub use uri::{QueryMap, ResourceUri};

/// Result type alias for Resview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Resview operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("unknown scheme '{scheme}' (known schemes: {})", .known.join(", "))]
    SchemeNotFound { scheme: String, known: Vec<String> },

    #[error("the '{scheme}' adapter does not support this resource form")]
    ConstructionExhausted { scheme: String },

    #[error("{0}")]
    AdapterValidation(String),

    #[error("adapter failure (this is a bug): {0}")]
    AdapterInternal(String),

    #[error("{0}")]
    Adapter(String),

    #[error("missing dependency '{name}'")]
    MissingDependency { name: String, install: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// True for errors a user can fix by changing their input, as opposed to
    /// adapter defects.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUri(_)
                | Error::SchemeNotFound { .. }
                | Error::ConstructionExhausted { .. }
                | Error::AdapterValidation(_)
        )
    }
}
