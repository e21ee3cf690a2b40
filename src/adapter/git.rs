//! Git repository adapter
//!
//! `git:///path/to/repo` summarizes HEAD, branches, tags and recent commits;
//! `?ref=` resolves one ref. Drives the `git` binary rather than linking a
//! libgit implementation; a missing binary is a missing dependency, not a
//! defect.

use super::{Adapter, AdapterFactory, Renderer, parse_limit};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::render::GrepItem;
use crate::ui;
use crate::uri::QueryMap;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Command;

const DEFAULT_LOG_LIMIT: usize = 10;

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::MissingDependency {
                    name: "git".to_string(),
                    install: "https://git-scm.com/downloads (e.g. `apt install git` or `brew install git`)"
                        .to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
    if !output.status.success() {
        return Err(Error::Adapter(format!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub struct GitFactory;

impl AdapterFactory for GitFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::ResourceAndQuery { resource, query } => {
                let root = if resource.is_empty() {
                    PathBuf::from(".")
                } else {
                    PathBuf::from(resource)
                };
                if !root.is_dir() {
                    return Construction::Invalid(format!(
                        "no such directory: {}",
                        root.display()
                    ));
                }
                match run_git(&root, &["rev-parse", "--git-dir"]) {
                    Ok(_) => Construction::Ready(Box::new(GitAdapter {
                        root,
                        query: (*query).clone(),
                    })),
                    Err(Error::Adapter(_)) => Construction::Invalid(format!(
                        "not a git repository: {}",
                        root.display()
                    )),
                    Err(err) => Construction::Failed(err),
                }
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct GitAdapter {
    root: PathBuf,
    query: QueryMap,
}

impl GitAdapter {
    fn source(&self) -> String {
        format!("git://{}", self.root.display())
    }

    fn ref_names(&self, pattern: &str) -> Result<Vec<String>> {
        let out = run_git(
            &self.root,
            &["for-each-ref", "--format=%(refname:short)", pattern],
        )?;
        Ok(out.lines().map(str::to_string).collect())
    }

    fn recent_commits(&self, limit: usize) -> Vec<Value> {
        // An unborn repository has no log; that is an empty history, not an
        // error.
        let count = format!("-{limit}");
        match run_git(
            &self.root,
            &["log", count.as_str(), "--format=%h%x09%an%x09%s"],
        ) {
            Ok(out) => out
                .lines()
                .map(|line| {
                    let mut parts = line.splitn(3, '\t');
                    json!({
                        "commit": parts.next().unwrap_or(""),
                        "author": parts.next().unwrap_or(""),
                        "subject": parts.next().unwrap_or(""),
                    })
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn ref_detail(&self, name: &str) -> Result<ResultRecord> {
        let commit = run_git(&self.root, &["rev-parse", "--short", name])
            .map_err(|_| Error::AdapterValidation(format!("no such ref '{name}'")))?;
        let line = run_git(
            &self.root,
            &["log", "-1", "--date=short", "--format=%an%x09%ad%x09%s", name],
        )?;
        let mut parts = line.trim_end().splitn(3, '\t');
        Ok(ResultRecord::new("git_ref", self.source())
            .with("repo", self.root.display().to_string())
            .with("ref", name)
            .with("commit", commit.trim())
            .with("author", parts.next().unwrap_or(""))
            .with("date", parts.next().unwrap_or(""))
            .with("subject", parts.next().unwrap_or("")))
    }
}

impl Adapter for GitAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        if let Some(name) = self.query.get("ref").or_else(|| self.query.get("element")) {
            return self.ref_detail(&name.clone());
        }

        let head = run_git(&self.root, &["rev-parse", "--abbrev-ref", "HEAD"])
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "(unborn)".to_string());
        let branches = self.ref_names("refs/heads")?;
        let tags = self.ref_names("refs/tags")?;
        let limit = parse_limit(&self.query, DEFAULT_LOG_LIMIT)?;
        let commits = self.recent_commits(limit);

        Ok(ResultRecord::new("git_repository", self.source())
            .with("repo", self.root.display().to_string())
            .with("head", head)
            .with("branches", branches)
            .with("tags", tags)
            .with("commits", commits))
    }

    fn metadata(&self) -> Option<ResultRecord> {
        let dir = run_git(&self.root, &["rev-parse", "--git-dir"]).ok()?;
        Some(
            ResultRecord::new("git_meta", self.source())
                .with("repo", self.root.display().to_string())
                .with("git_dir", dir.trim()),
        )
    }
}

pub struct GitRenderer;

impl Renderer for GitRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "git_repository" => {
                let mut table = ui::TableBuilder::new();
                table.add_row("HEAD", record.str_field("head").unwrap_or("?"));
                let join = |key: &str| {
                    record
                        .array_field(key)
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(Value::as_str)
                                .collect::<Vec<_>>()
                                .join(", ")
                        })
                        .unwrap_or_default()
                };
                table.add_row("branches", &join("branches"));
                table.add_row("tags", &join("tags"));
                let mut out = format!("{}\n{}", record.source(), table.build());
                if let Some(commits) = record.array_field("commits") {
                    for commit in commits {
                        out.push_str(&format!(
                            "\n{} {} ({})",
                            commit["commit"].as_str().unwrap_or(""),
                            commit["subject"].as_str().unwrap_or(""),
                            commit["author"].as_str().unwrap_or("")
                        ));
                    }
                }
                Ok(out)
            }
            "git_ref" => Ok(format!(
                "{} {} {} {} {}",
                record.str_field("ref").unwrap_or("?"),
                record.str_field("commit").unwrap_or(""),
                record.str_field("date").unwrap_or(""),
                record.str_field("author").unwrap_or(""),
                record.str_field("subject").unwrap_or("")
            )),
            _ => Ok(render::raw_dump(record)),
        }
    }

    fn grep_items(&self, record: &ResultRecord) -> Option<Vec<GrepItem>> {
        let repo = record.str_field("repo")?;
        let commits = record.array_field("commits")?;
        Some(
            commits
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    GrepItem::new(repo, i as u64 + 1, c["subject"].as_str().unwrap_or(""))
                })
                .collect(),
        )
    }
}
