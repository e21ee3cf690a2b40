//! Directory adapter
//!
//! `dir://` lists the current directory, `dir:///some/path` any other.
//! Listing is one level deep and unfiltered (hidden files included).

use super::{Adapter, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::ui;
use crate::Result;
use serde_json::json;
use std::path::PathBuf;

pub struct DirFactory;

impl AdapterFactory for DirFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::ResourceOnly { resource } => {
                let root = if resource.is_empty() {
                    PathBuf::from(".")
                } else {
                    PathBuf::from(resource)
                };
                if !root.exists() {
                    return Construction::Invalid(format!(
                        "no such directory: {}",
                        root.display()
                    ));
                }
                if !root.is_dir() {
                    return Construction::Invalid(format!("not a directory: {}", root.display()));
                }
                Construction::Ready(Box::new(DirAdapter { root }))
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct DirAdapter {
    root: PathBuf,
}

impl DirAdapter {
    fn source(&self) -> String {
        format!("dir://{}", self.root.display())
    }
}

impl Adapter for DirAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let mut entries = Vec::new();
        for entry in ignore::WalkBuilder::new(&self.root)
            .max_depth(Some(1))
            .standard_filters(false)
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.depth() > 0)
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type();
            let kind = match file_type {
                Some(t) if t.is_dir() => "dir",
                Some(t) if t.is_symlink() => "symlink",
                _ => "file",
            };
            let size = if kind == "file" {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            } else {
                0
            };
            entries.push(json!({"name": name, "kind": kind, "size": size}));
        }
        entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(ResultRecord::new("dir_listing", self.source())
            .with("path", self.root.display().to_string())
            .with("count", entries.len())
            .with("entries", entries))
    }

    fn metadata(&self) -> Option<ResultRecord> {
        Some(ResultRecord::new("dir_meta", self.source()).with("path", self.root.display().to_string()))
    }
}

pub struct DirRenderer;

impl Renderer for DirRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "dir_listing" => {
                let columns = vec![
                    "name".to_string(),
                    "kind".to_string(),
                    "size".to_string(),
                ];
                let rows: Vec<Vec<String>> = record
                    .array_field("entries")
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|e| {
                                vec![
                                    e["name"].as_str().unwrap_or("").to_string(),
                                    e["kind"].as_str().unwrap_or("").to_string(),
                                    e["size"].to_string(),
                                ]
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(format!(
                    "{}\n{}",
                    record.source(),
                    ui::rows_table(&columns, &rows)
                ))
            }
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        let path = record.str_field("path")?;
        let entries = record.array_field("entries")?;
        Some(
            entries
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    GrepItem::new(path, i as u64 + 1, e["name"].as_str().unwrap_or(""))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_lists_one_level() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("nested.txt"), "deep").unwrap();

        let adapter = DirAdapter {
            root: dir.path().to_path_buf(),
        };
        let record = adapter.structure().unwrap();
        assert_eq!(record.kind(), "dir_listing");
        // nested.txt is below the one-level horizon
        assert_eq!(record.get("count"), Some(&Value::from(2)));
    }

    #[test]
    fn test_construction_validates_target() {
        let factory = DirFactory;
        assert!(matches!(
            factory.construct(&ConstructInput::ResourceOnly {
                resource: "/definitely/not/a/dir"
            }),
            Construction::Invalid(_)
        ));
        // empty resource means the current directory
        assert!(matches!(
            factory.construct(&ConstructInput::ResourceOnly { resource: "" }),
            Construction::Ready(_)
        ));
        assert!(matches!(
            factory.construct(&ConstructInput::NoArgs),
            Construction::Mismatch
        ));
    }
}
