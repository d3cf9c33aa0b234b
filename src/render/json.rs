//! JSON renderer: structured output for tooling integration.
//!
//! Shape: `{"actions": [...], "objects": [...]}`. Fields never declared are
//! `null`; schema trees are nested `children` arrays.

use crate::registry::Catalog;
use crate::render::Renderer;
use anyhow::{Context, Result};

pub struct JsonRenderer {
    pub pretty: bool,
}

impl Renderer for JsonRenderer {
    fn render(&self, catalog: &Catalog) -> Result<String> {
        let mut out = if self.pretty {
            serde_json::to_string_pretty(catalog)
        } else {
            serde_json::to_string(catalog)
        }
        .context("failed to serialize catalog")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
