//! Tag parser: one `@tag` per line inside a block.
//!
//! Grammar per line, after comment decoration is stripped:
//!
//! ```text
//! @name  <text>                       text tags: name ref uri description include
//! @tag   [{Type[,Limit]}] path [text]  field tags: parameter required optional
//!                                                 return success failure property
//! ```
//!
//! A line that does not start with `@` is prose and is skipped. A line that
//! starts with `@` but breaks the grammar becomes an error entry; its
//! neighbours are still parsed.

use crate::model::{Flag, Origin};
use crate::parser::scanner::RawBlock;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][A-Za-z0-9_-]*)(?:[[:space:]]+(.*))?$").unwrap());

// Path segments: anything but dots, whitespace and braces.
static RE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^.\s{}]+(?:\.[^.\s{}]+)*$").unwrap());

/// Characters hosts put in front of comment lines (`*`, `//`, `#`, `;`, `--` ...).
const DECORATION: &[char] = &['*', '/', '#', ';', '!', '%', '-'];

/// Recognized tag vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Name,
    Ref,
    Uri,
    Description,
    Include,
    Parameter,
    Required,
    Optional,
    Return,
    Success,
    Failure,
    Property,
    /// Not in the vocabulary; kept so it can be reported.
    Unknown(String),
}

/// How a tag's arguments are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Text,
    Field,
    Free,
}

impl TagKind {
    /// Case-sensitive lookup.
    pub fn from_name(name: &str) -> TagKind {
        match name {
            "name" => TagKind::Name,
            "ref" => TagKind::Ref,
            "uri" => TagKind::Uri,
            "description" => TagKind::Description,
            "include" => TagKind::Include,
            "parameter" => TagKind::Parameter,
            "required" => TagKind::Required,
            "optional" => TagKind::Optional,
            "return" => TagKind::Return,
            "success" => TagKind::Success,
            "failure" => TagKind::Failure,
            "property" => TagKind::Property,
            other => TagKind::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TagKind::Name => "name",
            TagKind::Ref => "ref",
            TagKind::Uri => "uri",
            TagKind::Description => "description",
            TagKind::Include => "include",
            TagKind::Parameter => "parameter",
            TagKind::Required => "required",
            TagKind::Optional => "optional",
            TagKind::Return => "return",
            TagKind::Success => "success",
            TagKind::Failure => "failure",
            TagKind::Property => "property",
            TagKind::Unknown(name) => name,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            TagKind::Name | TagKind::Ref | TagKind::Uri | TagKind::Description | TagKind::Include => {
                Shape::Text
            }
            TagKind::Unknown(_) => Shape::Free,
            _ => Shape::Field,
        }
    }

    /// Flag a field tag puts on the node it declares.
    pub fn flag(&self) -> Option<Flag> {
        match self {
            TagKind::Required => Some(Flag::Required),
            TagKind::Optional => Some(Flag::Optional),
            TagKind::Success => Some(Flag::Success),
            TagKind::Failure => Some(Flag::Failure),
            _ => None,
        }
    }
}

/// One parsed annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub type_hint: Option<String>,
    pub limit: Option<u32>,
    /// Dotted path, field tags only.
    pub path: Option<String>,
    /// Remaining free text, possibly empty.
    pub body: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("@{tag}: {reason}")]
pub struct TagSyntaxError {
    pub tag: String,
    pub reason: SyntaxReason,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxReason {
    #[error("expected a tag name after `@`")]
    MissingTagName,
    #[error("missing value")]
    MissingValue,
    #[error("unclosed `{{` in type hint")]
    UnclosedType,
    #[error("empty type hint `{{}}`")]
    EmptyType,
    #[error("type hint must be {{Type}} or {{Type,Limit}}, got {{{0}}}")]
    MalformedType(String),
    #[error("type limit must be a non-negative integer, got {0:?}")]
    InvalidLimit(String),
    #[error("missing field path")]
    MissingPath,
    #[error("invalid field path {0:?}")]
    InvalidPath(String),
}

/// Parse every tag line of a block, in order.
pub fn parse_block(block: &RawBlock<'_>) -> Vec<Result<Tag, TagSyntaxError>> {
    block
        .lines()
        .filter_map(|(line, text)| parse_line(text, Origin::new(block.path, line)))
        .collect()
}

/// Parse one body line. `None` for prose and blank lines.
pub fn parse_line(line: &str, origin: Origin) -> Option<Result<Tag, TagSyntaxError>> {
    let text = strip_decoration(line);
    if !text.starts_with('@') {
        return None;
    }

    let Some(caps) = RE_TAG.captures(text) else {
        return Some(Err(TagSyntaxError {
            tag: String::new(),
            reason: SyntaxReason::MissingTagName,
            origin,
        }));
    };
    let kind = TagKind::from_name(&caps[1]);
    let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let fail = |kind: &TagKind, reason| TagSyntaxError {
        tag: kind.name().to_string(),
        reason,
        origin: origin.clone(),
    };

    let tag = match kind.shape() {
        Shape::Text if rest.is_empty() => Err(fail(&kind, SyntaxReason::MissingValue)),
        Shape::Text | Shape::Free => Ok(Tag {
            kind,
            type_hint: None,
            limit: None,
            path: None,
            body: rest.to_string(),
            origin: origin.clone(),
        }),
        Shape::Field => match parse_field(rest) {
            Ok(field) => Ok(Tag {
                kind,
                type_hint: field.type_hint,
                limit: field.limit,
                path: Some(field.path),
                body: field.body,
                origin: origin.clone(),
            }),
            Err(reason) => Err(fail(&kind, reason)),
        },
    };
    Some(tag)
}

/// Strip leading whitespace and comment decoration.
///
/// `" * @name X"` → `"@name X"`, `"// @ref /A"` → `"@ref /A"`.
pub fn strip_decoration(line: &str) -> &str {
    line.trim_start()
        .trim_start_matches(|c: char| DECORATION.contains(&c) || c.is_whitespace())
        .trim_end()
}

struct FieldArgs {
    type_hint: Option<String>,
    limit: Option<u32>,
    path: String,
    body: String,
}

/// `[{Type[,Limit]}] path [body...]`: the first token after the type hint
/// is always the path.
fn parse_field(rest: &str) -> Result<FieldArgs, SyntaxReason> {
    let (type_hint, limit, rest) = match rest.strip_prefix('{') {
        Some(after) => {
            let close = after.find('}').ok_or(SyntaxReason::UnclosedType)?;
            let (type_hint, limit) = parse_type(&after[..close])?;
            (Some(type_hint), limit, after[close + 1..].trim_start())
        }
        None => (None, None, rest),
    };

    let (path, body) = match rest.split_once(char::is_whitespace) {
        Some((path, body)) => (path, body.trim()),
        None => (rest, ""),
    };
    if path.is_empty() {
        return Err(SyntaxReason::MissingPath);
    }
    if !RE_PATH.is_match(path) {
        return Err(SyntaxReason::InvalidPath(path.to_string()));
    }

    Ok(FieldArgs {
        type_hint,
        limit,
        path: path.to_string(),
        body: body.to_string(),
    })
}

fn parse_type(inner: &str) -> Result<(String, Option<u32>), SyntaxReason> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [""] => Err(SyntaxReason::EmptyType),
        [ty] => Ok((ty.to_string(), None)),
        [ty, limit] if !ty.is_empty() => limit
            .parse::<u32>()
            .map(|l| (ty.to_string(), Some(l)))
            .map_err(|_| SyntaxReason::InvalidLimit(limit.to_string())),
        _ => Err(SyntaxReason::MalformedType(inner.to_string())),
    }
}
