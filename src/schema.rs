//! Schema builder: grows a field tree from flat dotted-path declarations.
//!
//! `@return {Object} user ...` and `@return {Integer} user.id ...` land on the
//! same `user` node at different times. A path whose prefix was never
//! declared gets its intermediate nodes synthesized empty.

use crate::model::{FieldNode, Setting};
use crate::parser::tags::Tag;

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    root: FieldNode,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        SchemaBuilder::default()
    }

    /// Apply one field tag. Tags without a path are ignored.
    ///
    /// A repeated path overlays the earlier declaration: later explicit
    /// values win, empty ones leave what is there. A flagged tag also flags
    /// its top-level field unless that field already carries a flag.
    pub fn declare(&mut self, tag: &Tag) {
        let Some(path) = tag.path.as_deref() else {
            return;
        };
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return;
        };

        let top = self.root.child_entry(first);
        if let (Some(flag), false) = (tag.kind.flag(), top.flag.is_set()) {
            top.flag = Setting::Explicit(flag);
        }
        let node = segments.fold(top, |node, segment| node.child_entry(segment));

        node.type_hint.overlay(Setting::from(tag.type_hint.clone()));
        node.limit.overlay(Setting::from(tag.limit));
        node.flag.overlay(Setting::from(tag.kind.flag()));
        node.description.overlay(Setting::text(&tag.body));
    }

    pub fn finish(self) -> FieldNode {
        self.root
    }
}

/// Build one tree from tags in file order.
pub fn build<'t>(tags: impl IntoIterator<Item = &'t Tag>) -> FieldNode {
    let mut builder = SchemaBuilder::new();
    for tag in tags {
        builder.declare(tag);
    }
    builder.finish()
}
