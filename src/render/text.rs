//! Plain-text renderer: an indented listing for terminals and diffs.

use crate::model::{FieldNode, Setting};
use crate::registry::Catalog;
use crate::render::Renderer;
use anyhow::Result;

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, catalog: &Catalog) -> Result<String> {
        let mut out = String::new();

        for ep in catalog.endpoints.iter() {
            out.push_str(&format!("Action {}\n", ep.reference));
            write_scalar(&mut out, "Name", &ep.name);
            write_scalar(&mut out, "Uri", &ep.uri);
            write_scalar(&mut out, "Description", &ep.description);
            write_tree(&mut out, "Parameters", &ep.parameters);
            write_tree(&mut out, "Returns", &ep.returns);
            out.push('\n');
        }

        for obj in catalog.objects.iter() {
            out.push_str(&format!("Object {}\n", obj.reference));
            write_scalar(&mut out, "Name", &obj.name);
            write_scalar(&mut out, "Description", &obj.description);
            write_tree(&mut out, "Properties", &obj.properties);
            out.push('\n');
        }

        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

fn write_scalar(out: &mut String, label: &str, value: &Setting<String>) {
    if let Some(v) = value.as_str() {
        out.push_str(&format!("\t{}: {}\n", label, v));
    }
}

fn write_tree(out: &mut String, label: &str, root: &FieldNode) {
    if root.is_empty() {
        return;
    }
    out.push_str(&format!("\t{}:\n", label));
    for child in &root.children {
        write_node(out, child, 2);
    }
}

/// `id {Integer,64} [required] - The user id.`
fn write_node(out: &mut String, node: &FieldNode, depth: usize) {
    let mut line = "\t".repeat(depth);
    line.push_str(&node.key);
    match (node.type_hint.as_str(), node.limit.as_option()) {
        (Some(ty), Some(limit)) => line.push_str(&format!(" {{{},{}}}", ty, limit)),
        (Some(ty), None) => line.push_str(&format!(" {{{}}}", ty)),
        _ => {}
    }
    if let Some(flag) = node.flag.as_option() {
        line.push_str(&format!(" [{}]", flag.as_str()));
    }
    if let Some(desc) = node.description.as_str() {
        line.push_str(" - ");
        line.push_str(desc);
    }
    out.push_str(&line);
    out.push('\n');
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}
