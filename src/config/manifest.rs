//! Manifest loading and persistence

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{ContentList, ManifestSettings};
use crate::error::{PipelineError, PipelineResult};

/// Persisted text format of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// Pick the format from a file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

/// The persisted description of all content entries plus global settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    pub settings: ManifestSettings,

    #[serde(default)]
    pub content: ContentList,
}

impl Manifest {
    /// Load a manifest from a file
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Manifest(format!("cannot read {}: {}", path.display(), e))
        })?;
        let manifest = Self::parse(&content, ManifestFormat::from_path(path))?;
        debug!(
            "Loaded manifest {:?} with {} content entries",
            path,
            manifest.content.len()
        );
        Ok(manifest)
    }

    /// Parse manifest text
    pub fn parse(content: &str, format: ManifestFormat) -> PipelineResult<Self> {
        let manifest = match format {
            ManifestFormat::Yaml if content.trim().is_empty() => Manifest::default(),
            ManifestFormat::Yaml => serde_yaml::from_str(content)?,
            ManifestFormat::Json => serde_json::from_str(content)?,
        };
        Ok(manifest)
    }

    /// Render manifest text
    pub fn render(&self, format: ManifestFormat) -> PipelineResult<String> {
        let text = match format {
            ManifestFormat::Yaml => serde_yaml::to_string(self)?,
            ManifestFormat::Json => serde_json::to_string_pretty(self)?,
        };
        Ok(text)
    }

    /// Save the manifest to a file, format chosen by extension
    pub fn save_to_file(&self, path: &Path) -> PipelineResult<()> {
        let content = self.render(ManifestFormat::from_path(path))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
