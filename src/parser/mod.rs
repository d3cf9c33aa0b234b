//! Parser module: scan a source for blocks, then parse each block's tags.

pub mod scanner;
pub mod tags;

use crate::config::Markers;
use crate::diagnostics::{Diagnostic, Problem};
use crate::model::Origin;
use scanner::BlockKind;
use std::path::Path;
use tags::{Tag, TagSyntaxError};

/// One block with its tag lines parsed, detached from the source text.
#[derive(Debug, Clone)]
pub struct ParsedBlock {
    pub kind: BlockKind,
    pub origin: Origin,
    pub tags: Vec<Result<Tag, TagSyntaxError>>,
}

/// Everything one source file contributes before assembly.
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub blocks: Vec<ParsedBlock>,
    /// Structural problems (unterminated blocks).
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan and tag-parse a whole source file.
pub fn parse_source(path: &Path, text: &str, markers: &Markers) -> ParsedSource {
    let mut parsed = ParsedSource::default();

    for block in scanner::scan(path, text, markers) {
        match block {
            Ok(block) => parsed.blocks.push(ParsedBlock {
                kind: block.kind,
                origin: block.origin(),
                tags: tags::parse_block(&block),
            }),
            Err(unterminated) => parsed.diagnostics.push(Diagnostic::new(
                unterminated.origin,
                Problem::Unterminated {
                    kind: unterminated.kind,
                },
            )),
        }
    }

    tracing::debug!(
        path = %path.display(),
        blocks = parsed.blocks.len(),
        broken = parsed.diagnostics.len(),
        "scanned source"
    );
    parsed
}
