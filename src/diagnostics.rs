//! Diagnostics channel: every recoverable problem found during a run.

use crate::model::Origin;
use crate::parser::scanner::BlockKind;
use crate::parser::tags::TagSyntaxError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Scope of a problem: what was dropped because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// One block lost (unterminated).
    Structural,
    /// One line lost.
    TagSyntax,
    /// One block lost (no `@ref`).
    MissingRequiredField,
    /// One registration rejected.
    Conflict,
    /// `@include` could not be expanded; the include line is lost.
    Include,
    /// Nothing lost; the documentation is incomplete or odd.
    Lint,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Problem {
    #[error("unterminated {kind} block: no end marker before the next block or end of input")]
    Unterminated { kind: BlockKind },

    #[error(transparent)]
    TagSyntax(#[from] TagSyntaxError),

    #[error("unknown tag @{0}")]
    UnknownTag(String),

    #[error("@{tag} is not valid in {kind} block; ignored")]
    MisplacedTag { tag: String, kind: BlockKind },

    #[error("{kind} block has no @ref; block dropped")]
    MissingRef { kind: BlockKind },

    #[error("{reference} has no @{field}")]
    MissingField {
        reference: String,
        field: &'static str,
    },

    #[error("conflicting uri for {reference}: {existing:?} already registered, {incoming:?} rejected")]
    Conflict {
        reference: String,
        existing: String,
        incoming: String,
    },

    #[error("@include {0} does not name a known definition")]
    UnresolvedInclude(String),

    #[error("@include {0} includes itself")]
    IncludeCycle(String),

    #[error("definition {reference} redefined; previous one at {previous} replaced")]
    DuplicateDefinition { reference: String, previous: Origin },
}

impl Problem {
    pub fn category(&self) -> Category {
        match self {
            Problem::Unterminated { .. } => Category::Structural,
            Problem::TagSyntax(_) => Category::TagSyntax,
            Problem::MissingRef { .. } => Category::MissingRequiredField,
            Problem::Conflict { .. } => Category::Conflict,
            Problem::UnresolvedInclude(_) | Problem::IncludeCycle(_) => Category::Include,
            Problem::UnknownTag(_)
            | Problem::MisplacedTag { .. }
            | Problem::MissingField { .. }
            | Problem::DuplicateDefinition { .. } => Category::Lint,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.category() {
            Category::Lint => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A problem pinned to a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub origin: Origin,
    pub problem: Problem,
}

impl Diagnostic {
    pub fn new(origin: Origin, problem: impl Into<Problem>) -> Self {
        Diagnostic {
            origin,
            problem: problem.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.problem.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

/// Renders as `file:line: severity: message`.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.origin, self.severity(), self.problem)
    }
}

/// Flat record for hosts that want to serialize the channel.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub file: String,
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl From<&Diagnostic> for DiagnosticRecord {
    fn from(d: &Diagnostic) -> Self {
        DiagnosticRecord {
            file: d.origin.file.to_string_lossy().to_string(),
            line: d.origin.line,
            severity: d.severity(),
            message: d.problem.to_string(),
        }
    }
}
