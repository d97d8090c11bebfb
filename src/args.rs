use crate::config::FormatSetting;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Class Composition CLI - Composes class strings from JSON class expression documents
#[derive(Parser, Debug)]
#[command(name = "class-composer-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose class strings from expression documents on disk
    Build(BuildArgs),
    /// Process expression documents from stdin and output class strings to stdout
    Pipe(PipeArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Input file patterns (glob patterns supported)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Input file patterns to scan for class expressions (falls back to config content paths)"
    )]
    pub input: Vec<String>,

    /// Output file path
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        required = true,
        help = "Path where the composed class strings will be written"
    )]
    pub output: PathBuf,

    /// Output manifest file path (JSON)
    #[arg(
        short = 'm',
        long = "output-manifest",
        value_name = "PATH",
        required = true,
        help = "Path where the JSON token manifest will be written"
    )]
    pub output_manifest: PathBuf,

    /// Configuration file path (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to configuration file (YAML or JSON format)"
    )]
    pub config: Option<PathBuf>,

    /// Input document framing
    #[arg(
        long = "format",
        value_name = "FORMAT",
        value_enum,
        help = "How input documents are framed (auto, json, or ndjson)"
    )]
    pub format: Option<FormatSetting>,

    /// Emit a compact manifest
    #[arg(
        long = "compact",
        default_value_t = false,
        help = "Write the manifest as compact JSON instead of pretty-printed JSON"
    )]
    pub compact: bool,

    /// Verbose output
    #[arg(
        short = 'v',
        long = "verbose",
        default_value_t = false,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Number of parallel threads to use
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of parallel threads to use (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from scanning"
    )]
    pub exclude: Vec<String>,

    /// Dry run (don't write output files)
    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Perform composition but don't write output files"
    )]
    pub dry_run: bool,
}

/// Arguments for the pipe command
#[derive(Parser, Debug, Clone)]
pub struct PipeArgs {
    /// Treat stdin as newline-delimited JSON
    #[arg(
        long = "ndjson",
        default_value_t = false,
        help = "Read one expression document per non-blank line instead of a single document"
    )]
    pub ndjson: bool,
}

impl BuildArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        // Check that output paths are not the same
        if self.output == self.output_manifest {
            return Err("Output and manifest paths must be different".to_string());
        }

        // Validate number of jobs if specified
        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        Ok(())
    }
}
