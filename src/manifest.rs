use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for the generated manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Version of the manifest format
    pub version: String,

    /// Timestamp when the manifest was generated
    pub generated_at: DateTime<Utc>,

    /// Number of files processed
    pub files_processed: usize,

    /// Number of class expressions evaluated
    pub expressions_evaluated: usize,

    /// Number of unique tokens emitted
    pub tokens_emitted: usize,

    /// Composer version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer_version: Option<String>,
}

/// Detailed token information in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestTokenInfo {
    /// Number of occurrences of this token
    pub count: usize,

    /// Locations where this token was emitted (file:line)
    pub files: Vec<String>,
}

/// Complete manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Metadata about the composition
    pub metadata: ManifestMetadata,

    /// Map of emitted tokens to their usage information
    pub tokens: IndexMap<String, ManifestTokenInfo>,

    /// Statistics about the composition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ManifestStatistics>,
}

/// Statistics about the composition process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStatistics {
    /// Total output size in bytes
    pub output_size_bytes: usize,

    /// Number of files that matched patterns
    pub files_matched: usize,

    /// Number of files that actually emitted tokens
    pub files_with_tokens: usize,

    /// Processing time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Most frequently emitted tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_tokens: Option<Vec<TopToken>>,
}

/// Information about frequently emitted tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopToken {
    pub name: String,
    pub count: usize,
    pub file_count: usize,
}

impl Manifest {
    /// Create a new manifest with default metadata
    pub fn new() -> Self {
        Self {
            metadata: ManifestMetadata {
                version: "1.0.0".to_string(),
                generated_at: Utc::now(),
                files_processed: 0,
                expressions_evaluated: 0,
                tokens_emitted: 0,
                composer_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            tokens: IndexMap::new(),
            statistics: None,
        }
    }

    /// Add or update token information
    pub fn add_token(&mut self, token: String, file_location: String) {
        let entry = self.tokens.entry(token).or_insert_with(|| ManifestTokenInfo {
            count: 0,
            files: Vec::new(),
        });

        entry.count += 1;
        if !entry.files.contains(&file_location) {
            entry.files.push(file_location);
        }
    }

    /// Calculate and set statistics
    pub fn calculate_statistics(&mut self, output_size: usize, processing_time_ms: Option<u64>) {
        // Count files that emitted at least one token
        let mut files_with_tokens = std::collections::HashSet::new();
        for token_info in self.tokens.values() {
            for file in &token_info.files {
                // Extract just the file path (before the line suffix)
                if let Some(path) = file.rsplit_once(':').map(|(path, _)| path) {
                    files_with_tokens.insert(path.to_string());
                } else {
                    files_with_tokens.insert(file.clone());
                }
            }
        }

        // Find the most frequent tokens
        let mut token_list: Vec<_> = self
            .tokens
            .iter()
            .map(|(name, info)| TopToken {
                name: name.clone(),
                count: info.count,
                file_count: info.files.len(),
            })
            .collect();

        token_list.sort_by(|a, b| b.count.cmp(&a.count));
        let top_tokens = token_list.into_iter().take(10).collect();

        self.statistics = Some(ManifestStatistics {
            output_size_bytes: output_size,
            files_matched: self.metadata.files_processed,
            files_with_tokens: files_with_tokens.len(),
            processing_time_ms,
            top_tokens: Some(top_tokens),
        });
    }

    /// Convert manifest to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Convert manifest to pretty JSON string
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert manifest to compact JSON string
    pub fn to_compact_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for creating manifests
pub struct ManifestBuilder {
    manifest: Manifest,
    start_time: Option<std::time::Instant>,
}

impl ManifestBuilder {
    /// Create a new manifest builder
    pub fn new() -> Self {
        Self {
            manifest: Manifest::new(),
            start_time: Some(std::time::Instant::now()),
        }
    }

    /// Set the number of files processed
    pub fn with_files_processed(mut self, count: usize) -> Self {
        self.manifest.metadata.files_processed = count;
        self
    }

    /// Set the number of expressions evaluated
    pub fn with_expressions_evaluated(mut self, count: usize) -> Self {
        self.manifest.metadata.expressions_evaluated = count;
        self
    }

    /// Set the number of unique tokens emitted
    pub fn with_tokens_emitted(mut self, count: usize) -> Self {
        self.manifest.metadata.tokens_emitted = count;
        self
    }

    /// Add token usage information.
    ///
    /// Counts are taken as given rather than derived from the location
    /// lists, since locations are deduplicated while counts are not.
    pub fn with_token_info(mut self, tokens: IndexMap<String, ManifestTokenInfo>) -> Self {
        self.manifest.tokens.extend(tokens);
        self
    }

    /// Build the final manifest with statistics
    pub fn build(mut self, output_size: usize) -> Manifest {
        let processing_time = self.start_time.map(|t| t.elapsed().as_millis() as u64);
        self.manifest.calculate_statistics(output_size, processing_time);
        self.manifest
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
