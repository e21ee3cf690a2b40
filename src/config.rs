use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional `resview.toml` settings. CLI flags win over the file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResviewConfig {
    /// Default output format (text, json, grep, csv)
    pub format: Option<String>,
    /// Timeout for network-touching adapters, in seconds
    pub http_timeout_secs: Option<u64>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("resview.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ResviewConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ResviewConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("resview.toml"))).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_loads_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "format = \"json\"\nhttp_timeout_secs = 9").unwrap();
        file.flush().unwrap();

        let config = load_config(Some(file.path())).unwrap().unwrap();
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.http_timeout_secs, Some(9));
    }
}
