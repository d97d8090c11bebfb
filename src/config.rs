use crate::errors::{ComposerError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How input documents are framed on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatSetting {
    /// Decide per file from its extension
    Auto,

    /// The whole file is a single JSON document
    Json,

    /// One JSON document per non-blank line
    #[value(name = "ndjson")]
    NdJson,
}

impl Default for FormatSetting {
    fn default() -> Self {
        FormatSetting::Auto
    }
}

/// Composition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Content paths to scan for class expression documents
    pub content: Vec<String>,

    /// Glob patterns excluded from the scan
    pub exclude: Vec<String>,

    /// Input document framing
    pub format: FormatSetting,

    /// Manifest output configuration
    pub manifest: ManifestConfig,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            content: vec![
                "./src/**/*.classes.json".to_string(),
                "./src/**/*.classes.ndjson".to_string(),
            ],
            exclude: Vec::new(),
            format: FormatSetting::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

/// Configuration for manifest output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Emit compact JSON instead of pretty-printed JSON
    pub compact: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self { compact: false }
    }
}

impl ComposeConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ComposerError::ConfigError {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        serde_yaml::from_str(&content)
            .map_err(|e| ComposerError::ConfigError {
                message: format!("Failed to parse YAML config: {}", e),
            })
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ComposerError::ConfigError {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        serde_json::from_str(&content)
            .map_err(|e| ComposerError::ConfigError {
                message: format!("Failed to parse JSON config: {}", e),
            })
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ComposerError::ConfigError {
                message: format!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }

    /// Merge with another configuration
    pub fn merge(mut self, other: Self) -> Self {
        // Merge content patterns
        for pattern in other.content {
            if !self.content.contains(&pattern) {
                self.content.push(pattern);
            }
        }

        // Merge exclude patterns
        for pattern in other.exclude {
            if !self.exclude.contains(&pattern) {
                self.exclude.push(pattern);
            }
        }

        // Override the framing when the other side picks one explicitly
        if other.format != FormatSetting::Auto {
            self.format = other.format;
        }

        // Override manifest settings if compact output is requested in other
        if other.manifest.compact {
            self.manifest = other.manifest;
        }

        self
    }
}
