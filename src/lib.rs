pub mod args;
pub mod class_arg;
pub mod composer;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod resolve;
pub mod source;

pub use args::{BuildArgs, Cli, Commands, PipeArgs};
pub use class_arg::{is_truthy, ClassArg};
pub use composer::{Composer, TokenUsage};
pub use config::{ComposeConfig, FormatSetting, ManifestConfig};
pub use errors::{ComposerError, Result};
pub use manifest::{Manifest, ManifestBuilder, ManifestTokenInfo};
pub use resolve::cx;
pub use source::{
    parse_expressions_from_content, parse_expressions_from_file, parse_expressions_parallel,
    SourceExpression, SourceFormat,
};

#[cfg(feature = "cli")]
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::Path;
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Instant;
use std::time::Duration;

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Maximum file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allow symbolic links
    pub allow_symlinks: bool,
    /// Working directory for path traversal checks
    pub working_directory: PathBuf,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allow_symlinks: false,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Runtime options for the composition pipeline
#[derive(Debug, Clone)]
pub struct ComposerOptions {
    pub compact: bool,
    pub verbose: bool,
    pub jobs: Option<usize>,
    pub security: SecurityConfig,
}

impl From<&BuildArgs> for ComposerOptions {
    fn from(args: &BuildArgs) -> Self {
        Self {
            compact: args.compact,
            verbose: args.verbose,
            jobs: args.jobs,
            security: SecurityConfig::default(),
        }
    }
}

/// Performance statistics
#[derive(Debug, Clone)]
pub struct PerformanceStats {
    pub total_duration: Duration,
    pub parse_duration: Duration,
    pub compose_duration: Duration,
    pub files_per_second: f64,
    pub bytes_processed: u64,
}

/// Result of the composition process
#[derive(Debug)]
pub struct ComposeResult {
    pub output_text: String,
    pub manifest: serde_json::Value,
    pub total_expressions: usize,
    pub total_tokens: usize,
    pub total_files_processed: usize,
    pub performance_stats: Option<PerformanceStats>,
}

/// Main composition entry point
#[cfg(feature = "cli")]
pub async fn compose(args: BuildArgs) -> Result<ComposeResult> {
    let start_time = Instant::now();
    let mut stats = PerformanceStats {
        total_duration: Duration::from_secs(0),
        parse_duration: Duration::from_secs(0),
        compose_duration: Duration::from_secs(0),
        files_per_second: 0.0,
        bytes_processed: 0,
    };

    // Validate arguments
    args.validate().map_err(ComposerError::InvalidInput)?;

    // Create runtime options
    let options = ComposerOptions::from(&args);

    // Load configuration if provided; CLI flags win over config settings
    let config = if let Some(config_path) = &args.config {
        ComposeConfig::from_file(config_path)?
    } else {
        ComposeConfig::default()
    };

    let compact = options.compact || config.manifest.compact;
    let format = args.format.unwrap_or(config.format);

    // Security: Validate output paths are safe
    validate_output_path(&args.output, &options.security)?;
    validate_output_path(&args.output_manifest, &options.security)?;

    // Input patterns come from the command line, falling back to the config
    let patterns = if args.input.is_empty() {
        config.content.clone()
    } else {
        args.input.clone()
    };

    if patterns.is_empty() {
        return Err(ComposerError::InvalidInput(
            "At least one input pattern must be provided".to_string(),
        ));
    }

    // Merge exclude patterns from the command line and the config
    let mut exclude_patterns = args.exclude.clone();
    for pattern in &config.exclude {
        if !exclude_patterns.contains(pattern) {
            exclude_patterns.push(pattern.clone());
        }
    }

    if options.verbose {
        eprintln!("Starting class composition...");
        eprintln!("Input patterns: {:?}", patterns);
        eprintln!("Output: {}", args.output.display());
        eprintln!("Output manifest: {}", args.output_manifest.display());
        eprintln!(
            "Security: max file size = {} MB",
            options.security.max_file_size / (1024 * 1024)
        );
    }

    // Collect files matching the patterns
    let files = collect_files_with_security(&patterns, &exclude_patterns, &options.security)?;

    if files.is_empty() {
        return Err(ComposerError::NoFilesFound);
    }

    if options.verbose {
        eprintln!("Found {} files to process", files.len());
        let total_size: u64 = files.iter().map(|f| f.1).sum();
        eprintln!("Total size: {:.2} MB", total_size as f64 / (1024.0 * 1024.0));
    }

    // Create multi-progress container for better progress reporting
    let multi_progress = if !options.verbose {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };

    // Create main progress bar
    let progress_bar = if !options.verbose {
        let pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Starting composition...");
        Some(pb)
    } else {
        None
    };

    // Parse expressions from all files with progress tracking
    let parse_start = Instant::now();

    let file_paths: Vec<PathBuf> = files.iter().map(|(path, _)| path.clone()).collect();
    stats.bytes_processed = files.iter().map(|f| f.1).sum();

    let expressions_per_file = parse_expressions_parallel_with_progress(
        &file_paths,
        format,
        options.jobs,
        progress_bar.as_ref(),
    )?;

    stats.parse_duration = parse_start.elapsed();

    // Update progress bar
    if let Some(ref pb) = progress_bar {
        pb.set_message("Composing class strings...");
        pb.set_position(files.len() as u64);
    }

    // Evaluate expressions in file order so the output is deterministic
    let compose_start = Instant::now();
    let mut composer = Composer::new();
    for expressions in &expressions_per_file {
        composer.add_expressions(expressions);
    }
    stats.compose_duration = compose_start.elapsed();

    if options.verbose {
        eprintln!(
            "Evaluated {} expressions emitting {} tokens ({} unique)",
            composer.expression_count(),
            composer.emitted_count(),
            composer.token_count()
        );
    }

    let output_text = composer.output();
    let output_size = output_text.len();

    // Generate manifest with full statistics
    let manifest = composer.generate_manifest_with_stats(files.len(), output_size);

    // Calculate final statistics
    stats.total_duration = start_time.elapsed();
    stats.files_per_second = files.len() as f64 / stats.total_duration.as_secs_f64();

    let result = ComposeResult {
        output_text,
        manifest,
        total_expressions: composer.expression_count(),
        total_tokens: composer.token_count(),
        total_files_processed: files.len(),
        performance_stats: Some(stats.clone()),
    };

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("✓ Complete ({:.1} files/sec)", stats.files_per_second));
    }

    // Write output files if not in dry-run mode
    if !args.dry_run {
        write_output_files(&args, &result, compact)?;
    }

    if options.verbose {
        eprintln!("\nComposition complete:");
        eprintln!("  - Processed {} files", result.total_files_processed);
        eprintln!("  - Evaluated {} expressions", result.total_expressions);
        eprintln!("  - Emitted {} unique tokens", result.total_tokens);
        eprintln!("\nPerformance:");
        eprintln!("  - Total time: {:.2}s", stats.total_duration.as_secs_f64());
        eprintln!("  - Parsing: {:.2}s", stats.parse_duration.as_secs_f64());
        eprintln!("  - Composition: {:.2}s", stats.compose_duration.as_secs_f64());
        eprintln!("  - Processing rate: {:.1} files/sec", stats.files_per_second);
        eprintln!(
            "  - Data processed: {:.2} MB",
            stats.bytes_processed as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(result)
}

/// Validate that a path is safe (no path traversal)
#[cfg(feature = "cli")]
fn validate_output_path(path: &Path, security: &SecurityConfig) -> Result<()> {
    let working_dir = security
        .working_directory
        .canonicalize()
        .unwrap_or_else(|_| security.working_directory.clone());

    // The output file may not exist yet, so resolve its directory and
    // re-join the file name
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let canonical = parent
        .canonicalize()
        .unwrap_or_else(|_| parent.to_path_buf())
        .join(path.file_name().unwrap_or_default());

    // Check if path is within working directory
    if !canonical.starts_with(&working_dir) && path.is_relative() {
        return Err(ComposerError::SecurityError(format!(
            "Output path '{}' appears to use path traversal",
            path.display()
        )));
    }

    Ok(())
}

/// Check if a file is safe to read
#[cfg(feature = "cli")]
fn validate_input_file(path: &Path, security: &SecurityConfig) -> Result<()> {
    // Check for symlinks if not allowed
    if !security.allow_symlinks && path.is_symlink() {
        return Err(ComposerError::SecurityError(format!(
            "Symbolic link not allowed: {}",
            path.display()
        )));
    }

    // If it's a symlink and we allow them, validate the target
    if security.allow_symlinks && path.is_symlink() {
        let target = fs::read_link(path).map_err(|e| {
            ComposerError::SecurityError(format!(
                "Cannot read symlink target for '{}': {}",
                path.display(),
                e
            ))
        })?;

        // Ensure target is within working directory
        let canonical_target = target.canonicalize().unwrap_or_else(|_| target.clone());
        let working_dir = security
            .working_directory
            .canonicalize()
            .unwrap_or_else(|_| security.working_directory.clone());

        if !canonical_target.starts_with(&working_dir) {
            return Err(ComposerError::SecurityError(format!(
                "Symlink target '{}' is outside working directory",
                target.display()
            )));
        }
    }

    // Check file size
    let metadata = fs::metadata(path).map_err(|e| {
        ComposerError::SecurityError(format!(
            "Cannot read file metadata for '{}': {}",
            path.display(),
            e
        ))
    })?;

    if metadata.len() > security.max_file_size {
        return Err(ComposerError::SecurityError(format!(
            "File '{}' exceeds maximum size limit ({} MB > {} MB)",
            path.display(),
            metadata.len() / (1024 * 1024),
            security.max_file_size / (1024 * 1024)
        )));
    }

    Ok(())
}

/// Collect files matching the given patterns with security checks
#[cfg(feature = "cli")]
fn collect_files_with_security(
    patterns: &[String],
    exclude_patterns: &[String],
    security: &SecurityConfig,
) -> Result<Vec<(PathBuf, u64)>> {
    let mut files = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut skipped_count = 0;

    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;

            // Skip if excluded
            if should_exclude(&path, exclude_patterns)? {
                continue;
            }

            // Skip directories
            if path.is_dir() {
                continue;
            }

            // Security validation
            match validate_input_file(&path, security) {
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Warning: Skipping file - {}", e);
                    skipped_count += 1;
                    continue;
                }
            }

            // Get file size for statistics
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

            // Add only if not already seen
            if seen.insert(path.clone()) {
                files.push((path, size));
            }
        }
    }

    if skipped_count > 0 {
        eprintln!("Skipped {} files due to security constraints", skipped_count);
    }

    Ok(files)
}

/// Check if a path should be excluded
#[cfg(feature = "cli")]
fn should_exclude(path: &Path, exclude_patterns: &[String]) -> Result<bool> {
    for pattern in exclude_patterns {
        let pattern = glob::Pattern::new(pattern)?;
        if pattern.matches_path(path) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Write the composition results to output files with atomic writes
#[cfg(feature = "cli")]
fn write_output_files(args: &BuildArgs, result: &ComposeResult, compact: bool) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent)?;
    }
    if let Some(parent) = args.output_manifest.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write composed output atomically
    write_atomic(&args.output, &result.output_text).map_err(|e| ComposerError::OutputError {
        path: args.output.display().to_string(),
        message: e.to_string(),
    })?;

    // Write manifest file atomically
    let manifest_content = if compact {
        serde_json::to_string(&result.manifest)?
    } else {
        serde_json::to_string_pretty(&result.manifest)?
    };

    write_atomic(&args.output_manifest, &manifest_content).map_err(|e| {
        ComposerError::OutputError {
            path: args.output_manifest.display().to_string(),
            message: e.to_string(),
        }
    })?;

    Ok(())
}

/// Write file atomically by writing to temp file then renaming
#[cfg(feature = "cli")]
fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension(".tmp");

    // Write to temporary file
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    // Atomically rename temp file to final name
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Parse expression files with progress reporting, preserving file order
#[cfg(feature = "cli")]
fn parse_expressions_parallel_with_progress(
    files: &[PathBuf],
    format: FormatSetting,
    jobs: Option<usize>,
    progress_bar: Option<&ProgressBar>,
) -> Result<Vec<Vec<SourceExpression>>> {
    use rayon::prelude::*;
    use std::sync::{Arc, Mutex};

    // Configure thread pool if specified
    if let Some(num_jobs) = jobs {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(num_jobs).build_global();
    }

    // Create a shared counter for progress
    let processed = Arc::new(Mutex::new(0usize));

    files
        .par_iter()
        .map(|file_path| {
            // Early termination for empty files
            if let Ok(metadata) = fs::metadata(file_path) {
                if metadata.len() == 0 {
                    if let Some(pb) = progress_bar {
                        let mut count = processed.lock().unwrap();
                        *count += 1;
                        pb.set_position(*count as u64);
                        pb.set_message(format!(
                            "Skipped empty: {}",
                            file_path.file_name().unwrap_or_default().to_string_lossy()
                        ));
                    }
                    return Ok(Vec::new());
                }
            }

            let result = parse_expressions_from_file(file_path, format);

            if let Some(pb) = progress_bar {
                let mut count = processed.lock().unwrap();
                *count += 1;
                pb.set_position(*count as u64);
                pb.set_message(format!(
                    "Parsing: {}",
                    file_path.file_name().unwrap_or_default().to_string_lossy()
                ));
            }

            result
        })
        .collect()
}

/// Handle pipe command - read expression documents from stdin, output class
/// strings to stdout
#[cfg(feature = "cli")]
pub async fn handle_pipe_command(args: PipeArgs) -> Result<()> {
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    // Read expression documents from stdin asynchronously
    let mut input = String::new();
    let mut stdin = io::stdin();
    stdin
        .read_to_string(&mut input)
        .await
        .map_err(|e| ComposerError::InputError(format!("Failed to read from stdin: {}", e)))?;

    // If input is empty, output nothing
    if input.trim().is_empty() {
        return Ok(());
    }

    let format = if args.ndjson {
        SourceFormat::NdJson
    } else {
        SourceFormat::Json
    };

    let expressions = parse_expressions_from_content(&input, "stdin", format)?;

    if expressions.is_empty() {
        return Ok(());
    }

    // One composed class string per expression, in input order
    let mut output = String::new();
    for expression in &expressions {
        output.push_str(&expression.compose());
        output.push('\n');
    }

    // Write composed output to stdout asynchronously
    let mut stdout = io::stdout();
    stdout
        .write_all(output.as_bytes())
        .await
        .map_err(|e| ComposerError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;

    // Ensure output is flushed
    stdout.flush().await.map_err(|e| ComposerError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}
