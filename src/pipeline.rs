//! Run pipeline: scan → parse → assemble → register, over many sources.
//!
//! Per-file and per-block work runs on a rayon pool. The registry is only
//! touched from the calling thread, in source-path order, so "later" always
//! means "later path" and output is reproducible.

use crate::assemble::{self, Assembled, Definitions};
use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::model::{Endpoint, ObjectDoc, Origin};
use crate::parser::scanner::BlockKind;
use crate::parser::{self, ParsedBlock, ParsedSource};
use crate::registry::{Catalog, Registrable, Registry};
use rayon::prelude::*;
use std::path::PathBuf;

/// Raw text of one source file, already loaded by the host.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Result of a run: the best registry achievable plus every problem found.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub catalog: Catalog,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunOutput {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

/// Process all sources. Never fails: every problem ends up in `diagnostics`.
pub fn run(sources: &[SourceFile], config: &Config) -> RunOutput {
    match config.jobs {
        Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| run_in_pool(sources, config)),
            Err(e) => {
                tracing::warn!("cannot build a {jobs}-thread pool ({e}); using the global pool");
                run_in_pool(sources, config)
            }
        },
        None => run_in_pool(sources, config),
    }
}

enum Entry {
    Endpoint(Assembled<Endpoint>),
    Object(Assembled<ObjectDoc>),
}

fn run_in_pool(sources: &[SourceFile], config: &Config) -> RunOutput {
    let mut ordered: Vec<&SourceFile> = sources.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let parsed: Vec<ParsedSource> = ordered
        .par_iter()
        .map(|src| parser::parse_source(&src.path, &src.text, &config.markers))
        .collect();

    let mut output = RunOutput::default();
    let mut blocks: Vec<&ParsedBlock> = Vec::new();
    let mut definitions = Definitions::new();

    // Structural diagnostics and definitions first: includes may point at
    // definitions in any file.
    for source in &parsed {
        output.diagnostics.extend(source.diagnostics.iter().cloned());
        for block in &source.blocks {
            match block.kind {
                BlockKind::Definition => {
                    output.diagnostics.extend(definitions.insert_block(block));
                }
                BlockKind::Endpoint | BlockKind::Object => blocks.push(block),
            }
        }
    }

    let assembled: Vec<Entry> = blocks
        .par_iter()
        .map(|block| match block.kind {
            BlockKind::Object => Entry::Object(assemble::assemble_object(block, &definitions)),
            _ => Entry::Endpoint(assemble::assemble_endpoint(block, &definitions)),
        })
        .collect();

    for entry in assembled {
        match entry {
            Entry::Endpoint(a) => register(&mut output.catalog.endpoints, a, &mut output.diagnostics),
            Entry::Object(a) => register(&mut output.catalog.objects, a, &mut output.diagnostics),
        }
    }

    // Stable report order: by file, then line. A definition included by
    // several blocks reports its own problems once.
    output
        .diagnostics
        .sort_by_cached_key(|d| (d.origin.clone(), d.problem.to_string()));
    output.diagnostics.dedup();

    tracing::debug!(
        sources = sources.len(),
        definitions = definitions.len(),
        endpoints = output.catalog.endpoints.len(),
        objects = output.catalog.objects.len(),
        errors = output.error_count(),
        "run finished"
    );
    output
}

fn register<T: Registrable>(
    registry: &mut Registry<T>,
    assembled: Assembled<T>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    diagnostics.extend(assembled.diagnostics);
    let Some(entry) = assembled.entry else {
        return;
    };
    let origin = first_source(&entry);
    if let Err(problem) = registry.register(entry) {
        diagnostics.push(Diagnostic::new(origin, problem));
    }
}

fn first_source<T: Registrable>(entry: &T) -> Origin {
    entry
        .sources()
        .first()
        .cloned()
        .unwrap_or_else(|| Origin::new(PathBuf::new(), 0))
}
