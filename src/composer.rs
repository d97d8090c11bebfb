use crate::manifest::{ManifestBuilder, ManifestTokenInfo};
use crate::source::SourceExpression;
use indexmap::IndexMap;

/// Usage record for one emitted token
#[derive(Debug, Clone)]
pub struct TokenUsage {
    /// The token text
    pub token: String,

    /// Number of times the token was emitted
    pub count: usize,

    /// Locations that emitted the token (file:line, deduplicated)
    pub locations: Vec<String>,
}

/// Aggregates composed expressions into output lines and token statistics
pub struct Composer {
    /// Composed class strings, one per expression, in input order
    lines: Vec<String>,

    /// Tracked tokens with their usage information
    tokens: IndexMap<String, TokenUsage>,

    /// Total number of tokens emitted, duplicates included
    emitted: usize,

    /// Number of expressions evaluated, inert ones included
    expressions: usize,
}

impl Composer {
    /// Create a new, empty composer
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            tokens: IndexMap::new(),
            emitted: 0,
            expressions: 0,
        }
    }

    /// Evaluate one expression and record its output.
    ///
    /// Every expression contributes exactly one output line, so line numbers
    /// in the output correspond to expression order. An expression whose
    /// arguments are all falsy contributes an empty line.
    pub fn add_expression(&mut self, expression: &SourceExpression) {
        let tokens = expression.tokens();
        let location = expression.location();

        for token in &tokens {
            let usage = self.tokens.entry(token.clone()).or_insert_with(|| TokenUsage {
                token: token.clone(),
                count: 0,
                locations: Vec::new(),
            });

            usage.count += 1;
            if !usage.locations.contains(&location) {
                usage.locations.push(location.clone());
            }
        }

        self.emitted += tokens.len();
        self.expressions += 1;
        self.lines.push(tokens.join(" "));
    }

    /// Evaluate a batch of expressions in order
    pub fn add_expressions(&mut self, expressions: &[SourceExpression]) {
        for expression in expressions {
            self.add_expression(expression);
        }
    }

    /// Render the collected output, one composed class string per line
    pub fn output(&self) -> String {
        if self.lines.is_empty() {
            String::new()
        } else {
            let mut text = self.lines.join("\n");
            text.push('\n');
            text
        }
    }

    /// Number of output lines collected so far
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of unique tokens emitted so far
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Total number of tokens emitted, duplicates included
    pub fn emitted_count(&self) -> usize {
        self.emitted
    }

    /// Number of expressions evaluated so far
    pub fn expression_count(&self) -> usize {
        self.expressions
    }

    /// Generate the token manifest
    pub fn generate_manifest(&self) -> serde_json::Value {
        self.generate_manifest_with_stats(0, 0)
    }

    /// Generate the manifest with additional statistics
    pub fn generate_manifest_with_stats(
        &self,
        files_processed: usize,
        output_size: usize,
    ) -> serde_json::Value {
        let mut builder = ManifestBuilder::new()
            .with_files_processed(files_processed)
            .with_expressions_evaluated(self.expressions)
            .with_tokens_emitted(self.tokens.len());

        let mut token_info_map = IndexMap::new();
        for (token, usage) in &self.tokens {
            token_info_map.insert(
                token.clone(),
                ManifestTokenInfo {
                    count: usage.count,
                    files: usage.locations.clone(),
                },
            );
        }
        builder = builder.with_token_info(token_info_map);

        let manifest = builder.build(output_size);
        manifest.to_json()
    }

    /// Reset the composer state
    pub fn reset(&mut self) {
        self.lines.clear();
        self.tokens.clear();
        self.emitted = 0;
        self.expressions = 0;
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}
