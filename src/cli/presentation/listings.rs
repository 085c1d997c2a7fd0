//! Tree and language listings: comfy-table with styled headings.

use crate::error::CmsError;
use crate::language::Language;
use crate::page::Page;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// One page of the tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub id: u64,
    pub depth: usize,
    pub name: String,
    pub page_layout: String,
    pub language_code: Option<String>,
    pub is_root: bool,
    pub is_language_root: bool,
    pub is_layoutpage: bool,
    pub cells: usize,
    pub elements: usize,
}

impl TreeRow {
    pub fn new(page: &Page, depth: usize, cells: usize, elements: usize) -> Self {
        Self {
            id: page.id.get(),
            depth,
            name: page.name.clone(),
            page_layout: page.page_layout.clone(),
            language_code: page.language_code.clone(),
            is_root: page.is_root(),
            is_language_root: page.is_language_root,
            is_layoutpage: page.is_layoutpage,
            cells,
            elements,
        }
    }

    fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.is_root {
            flags.push("root");
        }
        if self.is_language_root {
            flags.push("language root");
        }
        if self.is_layoutpage {
            flags.push("layout");
        }
        flags.join(", ")
    }
}

/// Format a section heading with bold/underline.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_tree_text(rows: &[TreeRow]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Page tree"));
    if rows.is_empty() {
        out.push_str("  No pages. Run `pagetree seed` first.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Page", "Id", "Layout", "Language", "Flags", "Cells", "Elements"]);
    for row in rows {
        table.add_row(vec![
            format!("{}{}", "  ".repeat(row.depth), row.name),
            row.id.to_string(),
            row.page_layout.clone(),
            row.language_code.clone().unwrap_or_else(|| "-".to_string()),
            row.flags(),
            row.cells.to_string(),
            row.elements.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_tree_json(rows: &[TreeRow]) -> Result<String, CmsError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

pub fn format_languages_text(languages: &[Language]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Languages"));
    if languages.is_empty() {
        out.push_str("  No languages.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Code", "Name", "Frontpage", "Layout", "Default", "Public"]);
    for language in languages {
        table.add_row(vec![
            language.code.clone(),
            language.name.clone(),
            language.frontpage_name.clone(),
            language.page_layout.clone(),
            yes_no(language.is_default),
            yes_no(language.is_public),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_languages_json(languages: &[Language]) -> Result<String, CmsError> {
    let rows: Vec<serde_json::Value> = languages
        .iter()
        .map(|l| {
            serde_json::json!({
                "id": l.id.get(),
                "code": l.code,
                "name": l.name,
                "frontpage_name": l.frontpage_name,
                "page_layout": l.page_layout,
                "default": l.is_default,
                "public": l.is_public,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
