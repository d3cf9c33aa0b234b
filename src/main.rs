//! atoz: collect ATOZ documentation blocks from a source tree.
//!
//! `atoz [PATHS]... [-o out.json] [-f json|json-compact|text]`
//!
//! Paths may be files, directories (walked recursively) or glob patterns.
//! Diagnostics go to stderr as `file:line: severity: message`, or as one JSON
//! array with `--diagnostics json`.

use anyhow::{Context, Result};
use atoz::diagnostics::DiagnosticRecord;
use atoz::render;
use atoz::{Config, Diagnostic, Severity, SourceFile};
use clap::Parser;
use glob::MatchOptions;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "atoz",
    about = "Generate API documentation from ATOZ blocks in source files of any language"
)]
struct Cli {
    /// Files, directories or glob patterns to scan.
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// File (or existing directory) to write to. Writes to stdout when omitted.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: json (default), json-compact, text
    #[arg(short = 'f', long, default_value = "json")]
    format: String,

    /// Worker threads for scanning and assembly
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Exit with failure when any error diagnostic was reported
    #[arg(long)]
    strict: bool,

    /// Do not print warnings
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Diagnostics format on stderr: text (default) or json
    #[arg(long = "diagnostics", default_value = "text")]
    diagnostics: String,

    /// Also scan hidden files and directories
    #[arg(long)]
    hidden: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ATOZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Resolve both formats before doing any work so a bad flag fails fast.
    let renderer = render::create_renderer(&cli.format)?;
    let json_diagnostics = match cli.diagnostics.as_str() {
        "text" => false,
        "json" => true,
        other => anyhow::bail!("unknown diagnostics format: {}. Use text or json", other),
    };

    let files = expand_paths(&cli.paths, cli.hidden)?;
    let sources = read_sources(&files)?;
    tracing::info!(files = files.len(), readable = sources.len(), "loaded sources");

    let config = Config {
        jobs: cli.jobs,
        ..Config::default()
    };
    let out = atoz::run(&sources, &config);

    report(&out.diagnostics, cli.quiet, json_diagnostics)?;

    tracing::info!(
        errors = out.error_count(),
        warnings = out.warning_count(),
        "run complete"
    );

    let rendered = renderer.render(&out.catalog)?;
    match cli.output {
        Some(ref path) => {
            // An existing directory gets atoz.<ext> inside it
            let path = if path.is_dir() {
                path.join(format!("atoz.{}", renderer.file_extension()))
            } else {
                path.clone()
            };
            fs::write(&path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => print!("{}", rendered),
    }

    if cli.strict && out.error_count() > 0 {
        anyhow::bail!("{} error(s) reported", out.error_count());
    }
    Ok(())
}

/// Print diagnostics to stderr, errors always, warnings unless quiet.
///
/// JSON mode writes one array of flat records instead of one line each.
fn report(diagnostics: &[Diagnostic], quiet: bool, json: bool) -> Result<()> {
    let shown = diagnostics
        .iter()
        .filter(|d| !(quiet && d.severity() == Severity::Warning));
    if json {
        let records: Vec<DiagnosticRecord> = shown.map(DiagnosticRecord::from).collect();
        eprintln!("{}", serde_json::to_string(&records)?);
    } else {
        for d in shown {
            eprintln!("{}", d);
        }
    }
    Ok(())
}

/// Expand paths into a sorted, deduplicated list of real files.
fn expand_paths(patterns: &[String], hidden: bool) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        require_literal_leading_dot: !hidden,
        ..MatchOptions::new()
    };

    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // Directories are walked recursively
        let base = path.is_dir().then_some(path);
        let pattern = match base {
            Some(_) => format!("{}/**/*", glob::Pattern::escape(pattern.trim_end_matches('/'))),
            None => pattern.clone(),
        };
        let matches: Vec<_> = glob::glob_with(&pattern, options)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .filter(|p| hidden || !base.is_some_and(|b| is_hidden_below(b, p)))
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

/// True if any component of `path` below `base` is a dotfile or dot-directory.
fn is_hidden_below(base: &Path, path: &Path) -> bool {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.')))
}

/// Read every file as UTF-8 text. Binary and non-UTF-8 files are skipped.
fn read_sources(files: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        match String::from_utf8(bytes) {
            Ok(text) => sources.push(SourceFile::new(path.clone(), text)),
            Err(_) => tracing::debug!(path = %path.display(), "skipping non-UTF-8 file"),
        }
    }
    Ok(sources)
}
