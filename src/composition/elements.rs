//! Cells and elements.

use crate::composition::contents::delete_content_rows;
use crate::composition::{Cell, Element, ElementScope};
use crate::error::{CmsError, StorageError, ValidationError};
use crate::page::Page;
use crate::store::{abort, Store, Tx, TxResult};
use crate::types::{now_millis, CellId, ElementId, PageId};
use tracing::{debug, info};

impl Store {
    pub fn cell(&self, id: CellId) -> Result<Option<Cell>, StorageError> {
        self.get(id.get())
    }

    pub fn element(&self, id: ElementId) -> Result<Option<Element>, StorageError> {
        self.get(id.get())
    }

    pub fn require_element(&self, id: ElementId) -> Result<Element, StorageError> {
        self.require(id.get())
    }

    pub fn cells_of(&self, page: PageId) -> Result<Vec<Cell>, StorageError> {
        self.require_page(page)?
            .cells
            .iter()
            .map(|id| self.require(id.get()))
            .collect()
    }

    pub fn find_cell(&self, page: PageId, name: &str) -> Result<Option<Cell>, StorageError> {
        Ok(self.cells_of(page)?.into_iter().find(|c| c.name == name))
    }

    /// Elements placed directly on the page, in position order.
    pub fn ungrouped_elements(&self, page: PageId) -> Result<Vec<Element>, StorageError> {
        self.require_page(page)?
            .elements
            .iter()
            .map(|id| self.require(id.get()))
            .collect()
    }

    pub fn cell_elements(&self, cell: CellId) -> Result<Vec<Element>, StorageError> {
        self.require::<Cell>(cell.get())?
            .elements
            .iter()
            .map(|id| self.require(id.get()))
            .collect()
    }

    /// Every element of a page: ungrouped ones first, then cell by cell.
    pub fn elements_of_page(&self, page: PageId) -> Result<Vec<Element>, StorageError> {
        let mut out = self.ungrouped_elements(page)?;
        for cell in self.cells_of(page)? {
            out.extend(self.cell_elements(cell.id)?);
        }
        Ok(out)
    }

    pub fn create_cell(&self, page: PageId, name: &str) -> Result<Cell, CmsError> {
        if name.trim().is_empty() {
            return Err(ValidationError::single("Name can't be blank").into());
        }
        let id = CellId(self.next_id()?);
        let now = now_millis();
        let cell = Cell {
            id,
            page_id: page,
            name: name.to_string(),
            elements: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.transact(|tx| {
            let mut record: Page = tx.require(page.get())?;
            for existing in &record.cells {
                let other: Cell = tx.require(existing.get())?;
                if other.name == cell.name {
                    return Err(abort(ValidationError::single(format!(
                        "Page {} already has a cell named '{}'",
                        page, cell.name
                    ))));
                }
            }
            record.cells.push(id);
            record.updated_at = now;
            tx.put(&record)?;
            tx.put(&cell)
        })?;

        info!(cell_id = %id, page_id = %page, name = %name, "Created cell");
        Ok(cell)
    }

    /// Returns the cell and whether it was created.
    pub fn find_or_create_cell(&self, page: PageId, name: &str) -> Result<(Cell, bool), CmsError> {
        if let Some(cell) = self.find_cell(page, name)? {
            return Ok((cell, false));
        }
        Ok((self.create_cell(page, name)?, true))
    }

    /// Append a new element to a page or cell.
    pub fn create_element(&self, scope: ElementScope, name: &str) -> Result<Element, CmsError> {
        if name.trim().is_empty() {
            return Err(ValidationError::single("Name can't be blank").into());
        }
        let id = ElementId(self.next_id()?);
        let now = now_millis();

        let element = self.transact(|tx| {
            let page_id = scope_page(tx, scope)?;
            let mut ids = load_ids(tx, scope)?;
            ids.push(id);
            let element = Element {
                id,
                page_id,
                cell_id: scope_cell(scope),
                name: name.to_string(),
                position: ids.len() as u32,
                contents: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            tx.put(&element)?;
            store_ids(tx, scope, &ids, now)?;
            Ok(element)
        })?;

        debug!(element_id = %id, name = %name, position = element.position, "Created element");
        Ok(element)
    }

    /// Move an element within its page: between the ungrouped list and a cell,
    /// or to another position in the same container. `position` is 1-based and
    /// clamped; `None` appends.
    pub fn move_element(
        &self,
        id: ElementId,
        target: ElementScope,
        position: Option<u32>,
    ) -> Result<Element, CmsError> {
        self.transact(|tx| {
            let element: Element = tx.require(id.get())?;
            if scope_page(tx, target)? != element.page_id {
                return Err(abort(ValidationError::single(
                    "Elements can only be moved within their page",
                )));
            }
            let now = now_millis();
            detach_element(tx, &element, now)?;

            let mut ids = load_ids(tx, target)?;
            let index = match position {
                Some(p) => (p.max(1) as usize - 1).min(ids.len()),
                None => ids.len(),
            };
            ids.insert(index, id);
            store_ids(tx, target, &ids, now)?;
            tx.require(id.get())
        })
        .map_err(|e| {
            debug!(element_id = %id, error = %e, "Element move failed");
            e
        })
    }

    /// Move the page's ungrouped elements selected by `select` into `cell`,
    /// keeping their page order. Returns the moved ids.
    pub fn group_elements_into_cell<F>(
        &self,
        cell: CellId,
        select: F,
    ) -> Result<Vec<ElementId>, CmsError>
    where
        F: Fn(&Element) -> bool,
    {
        self.transact(|tx| {
            let record: Cell = tx.require(cell.get())?;
            let page: Page = tx.require(record.page_id.get())?;
            let mut moved = Vec::new();
            let mut kept = Vec::new();
            for element_id in &page.elements {
                let element: Element = tx.require(element_id.get())?;
                if select(&element) {
                    moved.push(*element_id);
                } else {
                    kept.push(*element_id);
                }
            }
            if moved.is_empty() {
                return Ok(moved);
            }
            let now = now_millis();
            let mut cell_ids = record.elements.clone();
            cell_ids.extend(moved.iter().copied());
            store_ids(tx, ElementScope::Page(page.id), &kept, now)?;
            store_ids(tx, ElementScope::Cell(cell), &cell_ids, now)?;
            Ok(moved)
        })
    }

    /// Delete an element with its contents and essences.
    pub fn delete_element(&self, id: ElementId) -> Result<(), CmsError> {
        self.transact(|tx| {
            let element: Element = tx.require(id.get())?;
            detach_element(tx, &element, now_millis())?;
            for content in &element.contents {
                delete_content_rows(tx, *content)?;
            }
            tx.delete::<Element>(id.get())
        })?;
        info!(element_id = %id, "Deleted element");
        Ok(())
    }

    /// Delete a cell. Its elements go back to the end of the page's ungrouped
    /// list in cell order.
    pub fn delete_cell(&self, id: CellId) -> Result<(), CmsError> {
        self.transact(|tx| {
            let cell: Cell = tx.require(id.get())?;
            let now = now_millis();
            let scope = ElementScope::Page(cell.page_id);
            let mut ids = load_ids(tx, scope)?;
            ids.extend(cell.elements.iter().copied());
            store_ids(tx, scope, &ids, now)?;

            let mut page: Page = tx.require(cell.page_id.get())?;
            page.cells.retain(|c| *c != id);
            page.updated_at = now;
            tx.put(&page)?;
            tx.delete::<Cell>(id.get())
        })?;
        info!(cell_id = %id, "Deleted cell");
        Ok(())
    }
}

fn scope_cell(scope: ElementScope) -> Option<CellId> {
    match scope {
        ElementScope::Page(_) => None,
        ElementScope::Cell(cell) => Some(cell),
    }
}

fn scope_of(element: &Element) -> ElementScope {
    match element.cell_id {
        Some(cell) => ElementScope::Cell(cell),
        None => ElementScope::Page(element.page_id),
    }
}

fn scope_page(tx: &Tx<'_>, scope: ElementScope) -> TxResult<PageId> {
    match scope {
        ElementScope::Page(page) => {
            tx.require::<Page>(page.get())?;
            Ok(page)
        }
        ElementScope::Cell(cell) => Ok(tx.require::<Cell>(cell.get())?.page_id),
    }
}

fn load_ids(tx: &Tx<'_>, scope: ElementScope) -> TxResult<Vec<ElementId>> {
    match scope {
        ElementScope::Page(page) => Ok(tx.require::<Page>(page.get())?.elements),
        ElementScope::Cell(cell) => Ok(tx.require::<Cell>(cell.get())?.elements),
    }
}

/// Write the container order and renumber every member to match it.
fn store_ids(tx: &Tx<'_>, scope: ElementScope, ids: &[ElementId], now: i64) -> TxResult<()> {
    match scope {
        ElementScope::Page(page) => {
            let mut record: Page = tx.require(page.get())?;
            record.elements = ids.to_vec();
            record.updated_at = now;
            tx.put(&record)?;
        }
        ElementScope::Cell(cell) => {
            let mut record: Cell = tx.require(cell.get())?;
            record.elements = ids.to_vec();
            record.updated_at = now;
            tx.put(&record)?;
        }
    }
    let cell = scope_cell(scope);
    for (index, id) in ids.iter().enumerate() {
        let mut element: Element = tx.require(id.get())?;
        let position = index as u32 + 1;
        if element.position != position || element.cell_id != cell {
            element.position = position;
            element.cell_id = cell;
            element.updated_at = now;
            tx.put(&element)?;
        }
    }
    Ok(())
}

/// Remove an element from its container and close the gap.
fn detach_element(tx: &Tx<'_>, element: &Element, now: i64) -> TxResult<()> {
    let scope = scope_of(element);
    let mut ids = load_ids(tx, scope)?;
    ids.retain(|id| *id != element.id);
    store_ids(tx, scope, &ids, now)
}
