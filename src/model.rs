//! Data model for assembled documentation: format-agnostic.

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A mergeable value: either never declared, or declared with a value.
///
/// Overlaying only ever replaces with `Explicit`, so absence can never erase
/// something an earlier declaration set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting<T> {
    Unset,
    Explicit(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Unset
    }
}

impl<T> Setting<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Setting::Explicit(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Setting::Unset => None,
            Setting::Explicit(v) => Some(v),
        }
    }

    /// Last-write-wins, except that `Unset` never replaces a value.
    pub fn overlay(&mut self, later: Setting<T>) {
        if let Setting::Explicit(v) = later {
            *self = Setting::Explicit(v);
        }
    }
}

impl Setting<String> {
    /// Blank text counts as not declared.
    pub fn text(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            Setting::Unset
        } else {
            Setting::Explicit(value.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_option().map(String::as_str)
    }
}

impl<T> From<Option<T>> for Setting<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Setting::Explicit(v),
            None => Setting::Unset,
        }
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// Where a block, tag or diagnostic came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Origin {
    pub file: PathBuf,
    pub line: usize,
}

impl Origin {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Origin {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Qualifier a field tag puts on the node it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Required,
    Optional,
    Success,
    Failure,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Required => "required",
            Flag::Optional => "optional",
            Flag::Success => "success",
            Flag::Failure => "failure",
        }
    }
}

/// One node of a parameter/return/property schema tree.
///
/// The root has an empty key. Children keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldNode {
    #[serde(rename = "name")]
    pub key: String,
    #[serde(rename = "type")]
    pub type_hint: Setting<String>,
    pub limit: Setting<u32>,
    pub flag: Setting<Flag>,
    pub description: Setting<String>,
    pub children: Vec<FieldNode>,
}

impl FieldNode {
    pub fn root() -> Self {
        FieldNode::default()
    }

    pub fn new(key: &str) -> Self {
        FieldNode {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn child(&self, key: &str) -> Option<&FieldNode> {
        self.children.iter().find(|c| c.key == key)
    }

    /// Child with `key`, created empty at the end if missing.
    pub fn child_entry(&mut self, key: &str) -> &mut FieldNode {
        let idx = match self.children.iter().position(|c| c.key == key) {
            Some(idx) => idx,
            None => {
                self.children.push(FieldNode::new(key));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Look up a dotted path below this node (`"user.id"`).
    pub fn lookup(&self, path: &str) -> Option<&FieldNode> {
        path.split('.').try_fold(self, |node, seg| node.child(seg))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Recursively overlay `later` onto this node, key by key.
    pub fn merge_from(&mut self, later: FieldNode) {
        self.type_hint.overlay(later.type_hint);
        self.limit.overlay(later.limit);
        self.flag.overlay(later.flag);
        self.description.overlay(later.description);
        for child in later.children {
            let key = child.key.clone();
            self.child_entry(&key).merge_from(child);
        }
    }
}

/// Serialize a schema root as the list of its top-level fields.
pub fn serialize_fields<S: Serializer>(root: &FieldNode, serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(root.children.len()))?;
    for child in &root.children {
        seq.serialize_element(child)?;
    }
    seq.end()
}

/// One documented API operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub name: Setting<String>,
    #[serde(rename = "ref")]
    pub reference: String,
    pub uri: Setting<String>,
    pub description: Setting<String>,
    #[serde(serialize_with = "serialize_fields")]
    pub parameters: FieldNode,
    #[serde(serialize_with = "serialize_fields")]
    pub returns: FieldNode,
    /// Every block that contributed to this endpoint, in registration order.
    pub sources: Vec<Origin>,
}

/// One documented data object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectDoc {
    pub name: Setting<String>,
    #[serde(rename = "ref")]
    pub reference: String,
    pub description: Setting<String>,
    #[serde(serialize_with = "serialize_fields")]
    pub properties: FieldNode,
    pub sources: Vec<Origin>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_keeps_value_when_later_unset() {
        let mut s = Setting::text("first");
        s.overlay(Setting::Unset);
        assert_eq!(s.as_str(), Some("first"));
        s.overlay(Setting::text("second"));
        assert_eq!(s.as_str(), Some("second"));
    }

    #[test]
    fn blank_text_is_unset() {
        assert_eq!(Setting::text("   "), Setting::Unset);
        assert_eq!(Setting::text(" x "), Setting::Explicit("x".to_string()));
    }

    #[test]
    fn child_entry_preserves_order() {
        let mut root = FieldNode::root();
        root.child_entry("b");
        root.child_entry("a");
        root.child_entry("b").description = Setting::text("again");
        let keys: Vec<_> = root.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(root.children[0].description.as_str(), Some("again"));
    }

    #[test]
    fn merge_from_recurses_by_key() {
        let mut earlier = FieldNode::root();
        earlier.child_entry("user").child_entry("id").description = Setting::text("The id");

        let mut later = FieldNode::root();
        let id = later.child_entry("user").child_entry("id");
        id.type_hint = Setting::text("Integer");
        later.child_entry("token");

        earlier.merge_from(later);
        let id = earlier.lookup("user.id").unwrap();
        assert_eq!(id.description.as_str(), Some("The id"));
        assert_eq!(id.type_hint.as_str(), Some("Integer"));
        assert!(earlier.child("token").is_some());
    }

    #[test]
    fn unset_serializes_as_null() {
        let node = FieldNode::new("id");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["name"], "id");
        assert!(json["type"].is_null());
        assert!(json["children"].as_array().unwrap().is_empty());
    }
}
