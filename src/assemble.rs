//! Block assembly: turn one block's tags into an Endpoint or ObjectDoc.
//!
//! Definition blocks are not assembled; they are collected into
//! [`Definitions`] first so `@include` can splice their tags in place.

use crate::diagnostics::{Diagnostic, Problem};
use crate::model::{Endpoint, ObjectDoc, Origin, Setting};
use crate::parser::scanner::BlockKind;
use crate::parser::tags::{Tag, TagKind};
use crate::parser::ParsedBlock;
use crate::schema::SchemaBuilder;
use std::collections::HashMap;

/// Outcome of assembling one block. Diagnostics are always carried; `entry`
/// is `None` when the block could not be kept.
#[derive(Debug)]
pub struct Assembled<T> {
    pub entry: Option<T>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A reusable tag fragment from a `---ATOZDEF---` block.
#[derive(Debug, Clone)]
pub struct Definition {
    pub reference: String,
    pub origin: Origin,
    /// Tags to splice, `@ref` removed.
    pub tags: Vec<Tag>,
}

/// Run-wide table of definitions, keyed by ref.
#[derive(Debug, Default)]
pub struct Definitions {
    by_ref: HashMap<String, Definition>,
}

impl Definitions {
    pub fn new() -> Self {
        Definitions::default()
    }

    pub fn get(&self, reference: &str) -> Option<&Definition> {
        self.by_ref.get(reference)
    }

    pub fn len(&self) -> usize {
        self.by_ref.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }

    /// Add a definition block. A later block with the same ref replaces the
    /// earlier one.
    pub fn insert_block(&mut self, block: &ParsedBlock) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut reference = Setting::Unset;
        let mut tags = Vec::new();

        for tag in usable_tags(block, &mut diagnostics) {
            match tag.kind {
                TagKind::Ref => reference.overlay(Setting::text(&tag.body)),
                _ => tags.push(tag.clone()),
            }
        }

        let Setting::Explicit(reference) = reference else {
            diagnostics.push(Diagnostic::new(
                block.origin.clone(),
                Problem::MissingRef {
                    kind: BlockKind::Definition,
                },
            ));
            return diagnostics;
        };

        let definition = Definition {
            reference: reference.clone(),
            origin: block.origin.clone(),
            tags,
        };
        if let Some(previous) = self.by_ref.insert(reference.clone(), definition) {
            diagnostics.push(Diagnostic::new(
                block.origin.clone(),
                Problem::DuplicateDefinition {
                    reference,
                    previous: previous.origin,
                },
            ));
        }
        diagnostics
    }
}

/// Well-formed, known tags of a block; everything else becomes a diagnostic.
fn usable_tags<'b>(block: &'b ParsedBlock, diagnostics: &mut Vec<Diagnostic>) -> Vec<&'b Tag> {
    let mut out = Vec::new();
    for tag in &block.tags {
        match tag {
            Err(e) => diagnostics.push(Diagnostic::new(e.origin.clone(), e.clone())),
            Ok(tag) => match &tag.kind {
                TagKind::Unknown(name) => diagnostics.push(Diagnostic::new(
                    tag.origin.clone(),
                    Problem::UnknownTag(name.clone()),
                )),
                _ => out.push(tag),
            },
        }
    }
    out
}

/// Usable tags with every `@include` replaced by the definition's tags.
fn expanded_tags(
    block: &ParsedBlock,
    definitions: &Definitions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Tag> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    for tag in usable_tags(block, diagnostics) {
        expand(tag, definitions, &mut stack, &mut out, diagnostics);
    }
    out
}

fn expand(
    tag: &Tag,
    definitions: &Definitions,
    stack: &mut Vec<String>,
    out: &mut Vec<Tag>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if tag.kind != TagKind::Include {
        out.push(tag.clone());
        return;
    }

    let reference = tag.body.as_str();
    if stack.iter().any(|r| r == reference) {
        diagnostics.push(Diagnostic::new(
            tag.origin.clone(),
            Problem::IncludeCycle(reference.to_string()),
        ));
        return;
    }
    let Some(definition) = definitions.get(reference) else {
        diagnostics.push(Diagnostic::new(
            tag.origin.clone(),
            Problem::UnresolvedInclude(reference.to_string()),
        ));
        return;
    };

    stack.push(reference.to_string());
    for inner in &definition.tags {
        expand(inner, definitions, stack, out, diagnostics);
    }
    stack.pop();
}

fn misplaced(tag: &Tag, kind: BlockKind) -> Diagnostic {
    Diagnostic::new(
        tag.origin.clone(),
        Problem::MisplacedTag {
            tag: tag.kind.name().to_string(),
            kind,
        },
    )
}

/// Warn about a missing display field.
fn require(
    field: &Setting<String>,
    name: &'static str,
    reference: &str,
    origin: &Origin,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !field.is_set() {
        diagnostics.push(Diagnostic::new(
            origin.clone(),
            Problem::MissingField {
                reference: reference.to_string(),
                field: name,
            },
        ));
    }
}

/// Assemble an `---ATOZAPI---` block.
pub fn assemble_endpoint(block: &ParsedBlock, definitions: &Definitions) -> Assembled<Endpoint> {
    let mut diagnostics = Vec::new();
    let tags = expanded_tags(block, definitions, &mut diagnostics);

    let mut reference = Setting::Unset;
    let mut name = Setting::Unset;
    let mut uri = Setting::Unset;
    let mut description = Setting::Unset;
    let mut parameters = SchemaBuilder::new();
    let mut returns = SchemaBuilder::new();

    for tag in &tags {
        match tag.kind {
            TagKind::Ref => reference.overlay(Setting::text(&tag.body)),
            TagKind::Name => name.overlay(Setting::text(&tag.body)),
            TagKind::Uri => uri.overlay(Setting::text(&tag.body)),
            TagKind::Description => description.overlay(Setting::text(&tag.body)),
            TagKind::Parameter | TagKind::Required | TagKind::Optional => parameters.declare(tag),
            TagKind::Return | TagKind::Success | TagKind::Failure => returns.declare(tag),
            _ => diagnostics.push(misplaced(tag, BlockKind::Endpoint)),
        }
    }

    let Setting::Explicit(reference) = reference else {
        diagnostics.push(Diagnostic::new(
            block.origin.clone(),
            Problem::MissingRef {
                kind: BlockKind::Endpoint,
            },
        ));
        return Assembled {
            entry: None,
            diagnostics,
        };
    };
    require(&name, "name", &reference, &block.origin, &mut diagnostics);
    require(&description, "description", &reference, &block.origin, &mut diagnostics);

    Assembled {
        entry: Some(Endpoint {
            name,
            reference,
            uri,
            description,
            parameters: parameters.finish(),
            returns: returns.finish(),
            sources: vec![block.origin.clone()],
        }),
        diagnostics,
    }
}

/// Assemble an `---ATOZOBJ---` block.
pub fn assemble_object(block: &ParsedBlock, definitions: &Definitions) -> Assembled<ObjectDoc> {
    let mut diagnostics = Vec::new();
    let tags = expanded_tags(block, definitions, &mut diagnostics);

    let mut reference = Setting::Unset;
    let mut name = Setting::Unset;
    let mut description = Setting::Unset;
    let mut properties = SchemaBuilder::new();

    for tag in &tags {
        match tag.kind {
            TagKind::Ref => reference.overlay(Setting::text(&tag.body)),
            TagKind::Name => name.overlay(Setting::text(&tag.body)),
            TagKind::Description => description.overlay(Setting::text(&tag.body)),
            TagKind::Property => properties.declare(tag),
            _ => diagnostics.push(misplaced(tag, BlockKind::Object)),
        }
    }

    let Setting::Explicit(reference) = reference else {
        diagnostics.push(Diagnostic::new(
            block.origin.clone(),
            Problem::MissingRef {
                kind: BlockKind::Object,
            },
        ));
        return Assembled {
            entry: None,
            diagnostics,
        };
    };
    require(&name, "name", &reference, &block.origin, &mut diagnostics);
    require(&description, "description", &reference, &block.origin, &mut diagnostics);

    Assembled {
        entry: Some(ObjectDoc {
            name,
            reference,
            description,
            properties: properties.finish(),
            sources: vec![block.origin.clone()],
        }),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Markers;
    use crate::diagnostics::Category;
    use crate::model::Flag;
    use crate::parser::parse_source;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn blocks(text: &str) -> Vec<ParsedBlock> {
        parse_source(Path::new("t.php"), text, &Markers::default()).blocks
    }

    fn endpoint(text: &str) -> Assembled<Endpoint> {
        assemble_endpoint(&blocks(text)[0], &Definitions::new())
    }

    const GET_USER: &str = "/**
 * ---ATOZAPI---
 * @name Get User
 * @ref /MyApp/User/Get
 * @description Fetch a user from the application.
 * @required {Integer} id The user id to lookup.
 * @return {Object} user An object representing the user.
 * @return {Integer} user.id The unique ID that represents this user in the system.
 * @return {String} user.name The user's name.
 * @return {String} user.email The user's email address.
 * ---ATOZEND---
 */";

    #[test]
    fn assembles_fixture_block() {
        let out = endpoint(GET_USER);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let ep = out.entry.unwrap();
        assert_eq!(ep.reference, "/MyApp/User/Get");
        assert_eq!(ep.name.as_str(), Some("Get User"));
        assert_eq!(ep.uri, Setting::Unset);
        assert_eq!(ep.description.as_str(), Some("Fetch a user from the application."));
        assert_eq!(ep.parameters.child("id").unwrap().flag, Setting::Explicit(Flag::Required));
        assert_eq!(ep.returns.child("user").unwrap().children.len(), 3);
        assert_eq!(ep.sources, vec![Origin::new("t.php", 2)]);
    }

    #[test]
    fn singletons_take_last_occurrence() {
        let out = endpoint(
            "---ATOZAPI---\n@ref /A\n@name First\n@uri /one\n@name Second\n@ref /B\n@uri /two\n@description D\n---ATOZEND---",
        );
        let ep = out.entry.unwrap();
        assert_eq!(ep.reference, "/B");
        assert_eq!(ep.name.as_str(), Some("Second"));
        assert_eq!(ep.uri.as_str(), Some("/two"));
    }

    #[test]
    fn missing_ref_drops_block() {
        let out = endpoint("---ATOZAPI---\n@name Nameless\n@description D\n---ATOZEND---");
        assert!(out.entry.is_none());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].problem.category(), Category::MissingRequiredField);
    }

    #[test]
    fn missing_name_and_description_warn() {
        let out = endpoint("---ATOZAPI---\n@ref /A\n---ATOZEND---");
        let ep = out.entry.unwrap();
        assert_eq!(ep.name, Setting::Unset);
        let fields: Vec<_> = out
            .diagnostics
            .iter()
            .map(|d| match &d.problem {
                Problem::MissingField { field, .. } => *field,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(fields, ["name", "description"]);
        assert!(out.diagnostics.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn bad_line_keeps_siblings() {
        let out = endpoint(
            "---ATOZAPI---\n@ref /A\n@name A\n@description D\n@return {Integer user.id\n@return {String} user.name\n---ATOZEND---",
        );
        let ep = out.entry.unwrap();
        assert!(ep.returns.lookup("user.name").is_some());
        assert!(ep.returns.lookup("user.id").is_none());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].origin.line, 5);
        assert_eq!(out.diagnostics[0].problem.category(), Category::TagSyntax);
    }

    #[test]
    fn unknown_and_misplaced_tags_warn() {
        let out = endpoint(
            "---ATOZAPI---\n@ref /A\n@name A\n@description D\n@since 1.0\n@property {String} x\n---ATOZEND---",
        );
        assert!(out.entry.is_some());
        let problems: Vec<_> = out.diagnostics.iter().map(|d| d.problem.clone()).collect();
        assert_eq!(
            problems,
            vec![
                Problem::UnknownTag("since".to_string()),
                Problem::MisplacedTag {
                    tag: "property".to_string(),
                    kind: BlockKind::Endpoint
                },
            ]
        );
    }

    #[test]
    fn include_splices_definition_in_place() {
        let all = blocks(
            "---ATOZDEF---
@ref /Defs/Auth
@required {Object} auth
@required {String,64} auth.key The API key.
---ATOZEND---
---ATOZAPI---
@name Lookup
@ref /User/Lookup
@description Look up.
@include /Defs/Auth
@required {Integer} id
---ATOZEND---",
        );
        let mut defs = Definitions::new();
        assert!(defs.insert_block(&all[0]).is_empty());
        let out = assemble_endpoint(&all[1], &defs);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let ep = out.entry.unwrap();
        let keys: Vec<_> = ep.parameters.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["auth", "id"]);
        assert_eq!(ep.parameters.lookup("auth.key").unwrap().limit, Setting::Explicit(64));
    }

    #[test]
    fn include_problems_are_line_scoped() {
        let all = blocks(
            "---ATOZDEF---\n@ref /Loop\n@include /Loop\n@return {Boolean} ok\n---ATOZEND---\n---ATOZAPI---\n@ref /A\n@name A\n@description D\n@include /Loop\n@include /Missing\n---ATOZEND---",
        );
        let mut defs = Definitions::new();
        defs.insert_block(&all[0]);
        let out = assemble_endpoint(&all[1], &defs);
        let ep = out.entry.unwrap();
        assert!(ep.returns.child("ok").is_some());
        let problems: Vec<_> = out.diagnostics.iter().map(|d| d.problem.clone()).collect();
        assert_eq!(
            problems,
            vec![
                Problem::IncludeCycle("/Loop".to_string()),
                Problem::UnresolvedInclude("/Missing".to_string()),
            ]
        );
    }

    #[test]
    fn definition_needs_ref_and_warns_on_redefinition() {
        let all = blocks(
            "---ATOZDEF---\n@return {Boolean} ok\n---ATOZEND---\n---ATOZDEF---\n@ref /D\n---ATOZEND---\n---ATOZDEF---\n@ref /D\n@return {String} error\n---ATOZEND---",
        );
        let mut defs = Definitions::new();
        let missing = defs.insert_block(&all[0]);
        assert!(matches!(missing[0].problem, Problem::MissingRef { .. }));
        assert!(defs.insert_block(&all[1]).is_empty());
        let dup = defs.insert_block(&all[2]);
        assert!(matches!(dup[0].problem, Problem::DuplicateDefinition { .. }));
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.get("/D").unwrap().tags.len(), 1);
    }

    #[test]
    fn assembles_object() {
        let all = blocks(
            "---ATOZOBJ---\n@name User\n@ref /Application/User\n@description A user.\n@property {Integer} id Unique ID.\n@property {String} email\n@uri /nope\n---ATOZEND---",
        );
        let out = assemble_object(&all[0], &Definitions::new());
        let obj = out.entry.unwrap();
        assert_eq!(obj.reference, "/Application/User");
        assert_eq!(obj.properties.children.len(), 2);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(matches!(out.diagnostics[0].problem, Problem::MisplacedTag { .. }));
    }
}
