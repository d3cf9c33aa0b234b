//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod text;

use crate::registry::Catalog;
use anyhow::{anyhow, Result};

/// Trait for rendering a Catalog into a specific output format.
pub trait Renderer {
    fn render(&self, catalog: &Catalog) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "json" => Ok(Box::new(json::JsonRenderer { pretty: true })),
        "json-compact" => Ok(Box::new(json::JsonRenderer { pretty: false })),
        "text" | "txt" => Ok(Box::new(text::TextRenderer)),
        _ => Err(anyhow!(
            "unknown format: {}. Use json, json-compact, or text",
            format
        )),
    }
}
