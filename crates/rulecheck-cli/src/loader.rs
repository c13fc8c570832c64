//! Reads input and rule files, choosing JSON or YAML by file extension

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            _ => bail!(
                "cannot tell the format of {}: expected a .json, .yaml or .yml file",
                path.display()
            ),
        }
    }
}

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = FileFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?format, "loading file");

    match format {
        FileFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display())),
        FileFormat::Yaml => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display())),
    }
}
