//! PATH adapter - locate executables on the search path
//!
//! `path://` lists the search path directories; `path://NAME` finds a binary.

use super::{Adapter, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::Result;
use serde_json::{Value, json};
use std::path::PathBuf;

pub struct PathFactory;

impl AdapterFactory for PathFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::NoArgs => Construction::Ready(Box::new(PathAdapter::from_env())),
            _ => Construction::Mismatch,
        }
    }
}

pub struct PathAdapter {
    dirs: Vec<PathBuf>,
}

impl PathAdapter {
    pub fn from_env() -> Self {
        let dirs = std::env::var_os("PATH")
            .map(|raw| std::env::split_paths(&raw).collect())
            .unwrap_or_default();
        Self { dirs }
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    #[cfg(unix)]
    fn is_executable(path: &std::path::Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(path: &std::path::Path) -> bool {
        path.is_file()
    }
}

impl Adapter for PathAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let dirs: Vec<Value> = self
            .dirs
            .iter()
            .map(|d| {
                json!({
                    "dir": d.display().to_string(),
                    "exists": d.is_dir(),
                })
            })
            .collect();
        Ok(ResultRecord::new("path_dirs", "path://")
            .with("count", dirs.len())
            .with("dirs", dirs))
    }

    fn element(&self, name: &str) -> Result<Option<ResultRecord>> {
        let locations: Vec<String> = self
            .dirs
            .iter()
            .map(|d| d.join(name))
            .filter(|candidate| Self::is_executable(candidate))
            .map(|p| p.display().to_string())
            .collect();
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            ResultRecord::new("path_binary", format!("path://{name}"))
                .with("name", name)
                .with("location", locations[0].clone())
                .with("locations", locations),
        ))
    }

    fn metadata(&self) -> Option<ResultRecord> {
        Some(ResultRecord::new("path_meta", "path://").with("dirs", self.dirs.len()))
    }
}

pub struct PathRenderer;

impl Renderer for PathRenderer {
    fn supports_element(&self) -> bool {
        true
    }

    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "path_dirs" => {
                let mut lines = Vec::new();
                if let Some(dirs) = record.array_field("dirs") {
                    for dir in dirs {
                        let exists = dir["exists"].as_bool().unwrap_or(false);
                        let marker = if exists { " " } else { "!" };
                        lines.push(format!("{marker} {}", dir["dir"].as_str().unwrap_or("")));
                    }
                }
                Ok(lines.join("\n"))
            }
            "path_binary" => {
                let mut lines = Vec::new();
                if let Some(locations) = record.array_field("locations") {
                    for location in locations {
                        lines.push(location.as_str().unwrap_or("").to_string());
                    }
                }
                Ok(lines.join("\n"))
            }
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        let dirs = record.array_field("dirs")?;
        Some(
            dirs.iter()
                .enumerate()
                .map(|(i, d)| {
                    GrepItem::new(d["dir"].as_str().unwrap_or(""), i as u64 + 1, "PATH")
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_absent_not_error() {
        let adapter = PathAdapter::from_env();
        assert!(adapter.element("__definitely_missing__").unwrap().is_none());
    }

    #[test]
    fn test_finds_a_binary_in_a_seeded_dir() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("mytool");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let adapter = PathAdapter::with_dirs(vec![dir.path().to_path_buf()]);
        let record = adapter.element("mytool").unwrap().unwrap();
        assert_eq!(record.kind(), "path_binary");
        assert_eq!(
            record.str_field("location"),
            Some(bin.display().to_string().as_str())
        );
    }

    #[test]
    fn test_structure_lists_dirs() {
        let adapter = PathAdapter::with_dirs(vec![PathBuf::from("/usr/bin")]);
        let record = adapter.structure().unwrap();
        assert_eq!(record.kind(), "path_dirs");
        assert_eq!(record.get("count"), Some(&Value::from(1)));
    }
}
