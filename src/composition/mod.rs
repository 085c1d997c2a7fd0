//! Page composition: cells, elements and contents
//!
//! A page owns an ordered list of ungrouped elements and an ordered list of
//! cells; each cell owns an ordered list of elements; each element owns an
//! ordered list of contents; each content references one essence. Containers
//! hold the id order and every member carries its 1-based position, and both
//! are rewritten in the same transaction.

pub mod contents;
pub mod elements;

use crate::essence::EssenceRef;
use crate::store::Record;
use crate::types::{CellId, ContentId, ElementId, PageId};
use serde::{Deserialize, Serialize};

/// Name of the cell the upgrade creates when no cell mapping exists.
pub const MAIN_CONTENT_CELL: &str = "maincontent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub page_id: PageId,
    pub name: String,
    pub elements: Vec<ElementId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Cell {
    const TABLE: &'static str = "cell";

    fn record_id(&self) -> u64 {
        self.id.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub page_id: PageId,
    pub cell_id: Option<CellId>,
    pub name: String,
    pub position: u32,
    pub contents: Vec<ContentId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Element {
    const TABLE: &'static str = "element";

    fn record_id(&self) -> u64 {
        self.id.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub element_id: ElementId,
    pub name: String,
    pub position: u32,
    pub essence: EssenceRef,
}

impl Record for Content {
    const TABLE: &'static str = "content";

    fn record_id(&self) -> u64 {
        self.id.get()
    }
}

/// Where an element lives: directly on a page, or inside one of its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementScope {
    Page(PageId),
    Cell(CellId),
}
