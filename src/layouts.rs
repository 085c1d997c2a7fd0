//! Page layout and cell definitions
//!
//! Both files are optional. `page_layouts.yml` lists the layouts pages may use
//! and which cells each layout offers; `cells.yml` lists which element names
//! belong in each cell. Missing files are a valid state: no layout catalog means
//! any layout name is accepted, and no cell mapping selects the single
//! `maincontent` cell strategy during upgrade.

use crate::error::CmsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

pub const PAGE_LAYOUTS_FILE: &str = "page_layouts.yml";
pub const CELLS_FILE: &str = "cells.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayoutDef {
    pub name: String,
    #[serde(default)]
    pub cells: Vec<String>,
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub layoutpage: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDef {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<String>,
}

impl CellDef {
    pub fn element_names(&self) -> BTreeSet<&str> {
        self.elements.iter().map(String::as_str).collect()
    }
}

/// Cells a page layout supports, in `cells.yml` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCells {
    pub layout: String,
    pub cells: Vec<CellDef>,
}

/// Declarative layout -> cell -> element-name mapping used by the upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMapping {
    pub layouts: Vec<LayoutCells>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layouts {
    page_layouts: Option<Vec<PageLayoutDef>>,
    cells: Option<Vec<CellDef>>,
}

impl Layouts {
    /// No definitions at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(page_layouts: Option<Vec<PageLayoutDef>>, cells: Option<Vec<CellDef>>) -> Self {
        Self {
            page_layouts,
            cells,
        }
    }

    /// Load whichever of the two files exist in `dir`.
    pub fn load(dir: &Path) -> Result<Self, CmsError> {
        let page_layouts = read_optional(&dir.join(PAGE_LAYOUTS_FILE))?;
        let cells = read_optional(&dir.join(CELLS_FILE))?;
        debug!(
            dir = %dir.display(),
            page_layouts = page_layouts.is_some(),
            cells = cells.is_some(),
            "Loaded layout definitions"
        );
        Ok(Self {
            page_layouts,
            cells,
        })
    }

    pub fn page_layouts(&self) -> Option<&[PageLayoutDef]> {
        self.page_layouts.as_deref()
    }

    pub fn page_layout(&self, name: &str) -> Option<&PageLayoutDef> {
        self.page_layouts
            .as_ref()
            .and_then(|layouts| layouts.iter().find(|l| l.name == name))
    }

    /// Without a catalog every layout name is accepted.
    pub fn is_layout_defined(&self, name: &str) -> bool {
        match &self.page_layouts {
            Some(layouts) => layouts.iter().any(|l| l.name == name),
            None => true,
        }
    }

    /// The cell mapping, present only when `cells.yml` exists and at least one
    /// page layout declares cells.
    pub fn cell_mapping(&self) -> Option<CellMapping> {
        let cells = self.cells.as_ref()?;
        let page_layouts = self.page_layouts.as_ref()?;
        if page_layouts.iter().all(|l| l.cells.is_empty()) {
            return None;
        }

        let layouts = page_layouts
            .iter()
            .filter(|layout| !layout.cells.is_empty())
            .map(|layout| {
                for declared in &layout.cells {
                    if !cells.iter().any(|c| &c.name == declared) {
                        warn!(
                            layout = %layout.name,
                            cell = %declared,
                            "Page layout declares a cell missing from cells.yml"
                        );
                    }
                }
                LayoutCells {
                    layout: layout.name.clone(),
                    cells: cells
                        .iter()
                        .filter(|cell| layout.cells.contains(&cell.name))
                        .cloned()
                        .collect(),
                }
            })
            .collect();
        Some(CellMapping { layouts })
    }
}

fn read_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, CmsError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|e| CmsError::LayoutError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let parsed = serde_yaml::from_str(&raw).map_err(|e| CmsError::LayoutError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(parsed))
}
