//! Class expression documents.
//!
//! A source file holds one or more class expressions encoded as JSON. A
//! top-level array is the variadic argument list of one expression; any
//! other top-level value is a single-argument expression. Files are framed
//! either as one JSON document or as newline-delimited JSON with one
//! document per non-blank line.

use crate::class_arg::ClassArg;
use crate::config::FormatSetting;
use crate::errors::{ComposerError, Result};
use serde_json::Value;
use std::path::Path;

/// On-disk framing of an expression document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// The whole file is a single JSON document
    Json,

    /// One JSON document per non-blank line
    NdJson,
}

impl SourceFormat {
    /// Pick the framing for a file, honoring an explicit setting.
    ///
    /// With [`FormatSetting::Auto`], `.ndjson` and `.jsonl` files are
    /// line-delimited and everything else is a single document.
    pub fn for_path(path: &Path, setting: FormatSetting) -> Self {
        match setting {
            FormatSetting::Json => SourceFormat::Json,
            FormatSetting::NdJson => SourceFormat::NdJson,
            FormatSetting::Auto => match path.extension().and_then(|s| s.to_str()) {
                Some("ndjson") | Some("jsonl") => SourceFormat::NdJson,
                _ => SourceFormat::Json,
            },
        }
    }
}

/// A single class expression read from a source document
#[derive(Debug, Clone, PartialEq)]
pub struct SourceExpression {
    /// Arguments of the expression, in call order
    pub args: Vec<ClassArg>,

    /// File the expression came from
    pub file_path: String,

    /// 1-based line number within the file (1 for whole-file documents)
    pub line: usize,
}

impl SourceExpression {
    /// Resolve the expression to its ordered output tokens
    pub fn tokens(&self) -> Vec<String> {
        ClassArg::list(self.args.iter()).resolve()
    }

    /// Compose the expression into its final class string
    pub fn compose(&self) -> String {
        self.tokens().join(" ")
    }

    /// The `file:line` location of the expression
    pub fn location(&self) -> String {
        format!("{}:{}", self.file_path, self.line)
    }
}

/// Split a parsed document into its argument list.
///
/// A top-level array is the variadic argument list; any other value is a
/// single-argument expression.
fn document_args(document: Value) -> Vec<ClassArg> {
    match document {
        Value::Array(items) => items.into_iter().map(ClassArg::from).collect(),
        other => vec![ClassArg::from(other)],
    }
}

/// Parse the expressions contained in one document body
pub fn parse_expressions_from_content(
    content: &str,
    source_name: &str,
    format: SourceFormat,
) -> Result<Vec<SourceExpression>> {
    match format {
        SourceFormat::Json => {
            // An empty file composes nothing rather than failing.
            if content.trim().is_empty() {
                return Ok(Vec::new());
            }

            let document: Value =
                serde_json::from_str(content).map_err(|e| ComposerError::ParseError {
                    path: source_name.to_string(),
                    message: e.to_string(),
                })?;

            Ok(vec![SourceExpression {
                args: document_args(document),
                file_path: source_name.to_string(),
                line: 1,
            }])
        }
        SourceFormat::NdJson => {
            let mut expressions = Vec::new();

            for (index, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }

                let document: Value =
                    serde_json::from_str(line).map_err(|e| ComposerError::ParseError {
                        path: source_name.to_string(),
                        message: format!("line {}: {}", index + 1, e),
                    })?;

                expressions.push(SourceExpression {
                    args: document_args(document),
                    file_path: source_name.to_string(),
                    line: index + 1,
                });
            }

            Ok(expressions)
        }
    }
}

/// Parse all expressions in a file, picking the framing from the path
pub fn parse_expressions_from_file(
    path: &Path,
    setting: FormatSetting,
) -> Result<Vec<SourceExpression>> {
    let content = std::fs::read_to_string(path)?;
    let format = SourceFormat::for_path(path, setting);
    parse_expressions_from_content(&content, &path.display().to_string(), format)
}

/// Parse many files in parallel, preserving file order in the result
pub fn parse_expressions_parallel(
    files: &[std::path::PathBuf],
    setting: FormatSetting,
    jobs: Option<usize>,
) -> Result<Vec<Vec<SourceExpression>>> {
    use rayon::prelude::*;

    // Configure thread pool if specified; the global pool keeps the size of
    // whichever initializer ran first.
    if let Some(num_jobs) = jobs {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(num_jobs).build_global();
    }

    files
        .par_iter()
        .map(|path| parse_expressions_from_file(path, setting))
        .collect()
}
