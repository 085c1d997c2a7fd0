//! Page tree operations: creation, lookup and re-parenting.

use crate::error::{CmsError, StorageError, TreeError, ValidationError};
use crate::language::Language;
use crate::layouts::Layouts;
use crate::page::{NewPage, NewRootPage, Page};
use crate::store::{abort, Store, Tx, TxResult, UNIQ_GLOBAL_ROOT, UNIQ_LANGUAGE_ROOT};
use crate::types::{now_millis, LanguageId, PageId};
use std::collections::HashSet;
use tracing::{debug, info};

const ROOT_SLOT: &str = "installation";

impl Store {
    pub fn page(&self, id: PageId) -> Result<Option<Page>, StorageError> {
        self.get(id.get())
    }

    pub fn require_page(&self, id: PageId) -> Result<Page, StorageError> {
        self.require(id.get())
    }

    pub fn pages(&self) -> Result<Vec<Page>, StorageError> {
        self.scan()
    }

    pub fn root_page(&self) -> Result<Option<Page>, StorageError> {
        match self.unique_owner(UNIQ_GLOBAL_ROOT, ROOT_SLOT)? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// First page (in id order) with the given name and layout.
    pub fn find_page_by_name_and_layout(
        &self,
        name: &str,
        page_layout: &str,
    ) -> Result<Option<Page>, StorageError> {
        Ok(self
            .pages()?
            .into_iter()
            .find(|p| p.name == name && p.page_layout == page_layout))
    }

    pub fn language_root_for(&self, language: LanguageId) -> Result<Option<Page>, StorageError> {
        match self.unique_owner(UNIQ_LANGUAGE_ROOT, &language.to_string())? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    pub fn layoutpages(&self) -> Result<Vec<Page>, StorageError> {
        Ok(self.pages()?.into_iter().filter(|p| p.is_layoutpage).collect())
    }

    pub fn contentpages(&self) -> Result<Vec<Page>, StorageError> {
        Ok(self
            .pages()?
            .into_iter()
            .filter(Page::is_content_page)
            .collect())
    }

    pub fn pages_with_layout(&self, page_layout: &str) -> Result<Vec<Page>, StorageError> {
        Ok(self
            .pages()?
            .into_iter()
            .filter(|p| p.page_layout == page_layout)
            .collect())
    }

    /// Parent chain of a page, nearest first.
    pub fn ancestors(&self, id: PageId) -> Result<Vec<Page>, StorageError> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut next = self.require_page(id)?.parent;
        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                break;
            }
            let parent = self.require_page(parent_id)?;
            next = parent.parent;
            out.push(parent);
        }
        Ok(out)
    }

    /// All pages below `id`, depth first in child order.
    pub fn descendants(&self, id: PageId) -> Result<Vec<Page>, StorageError> {
        let mut out = Vec::new();
        let mut stack: Vec<PageId> = self.require_page(id)?.children.into_iter().rev().collect();
        let mut seen = HashSet::from([id]);
        while let Some(child_id) = stack.pop() {
            if !seen.insert(child_id) {
                continue;
            }
            let child = self.require_page(child_id)?;
            stack.extend(child.children.iter().rev().copied());
            out.push(child);
        }
        Ok(out)
    }

    /// The page itself when it is a language root, otherwise the nearest
    /// ancestor that is one.
    pub fn language_root_of(&self, page: &Page) -> Result<Option<Page>, StorageError> {
        if page.is_language_root {
            return Ok(Some(page.clone()));
        }
        Ok(self
            .ancestors(page.id)?
            .into_iter()
            .find(|p| p.is_language_root))
    }

    /// Validate and insert a page, linking it below its parent.
    pub fn create_page(&self, new: &NewPage, layouts: &Layouts) -> Result<Page, CmsError> {
        new.validate(layouts)?;
        let id = PageId(self.next_id()?);
        let now = now_millis();
        let page = Page {
            id,
            name: new.name.clone(),
            page_layout: new.page_layout.clone(),
            parent: new.parent,
            language: new.language,
            language_code: new.language_code.clone(),
            is_language_root: new.is_language_root,
            is_layoutpage: new.is_layoutpage,
            do_not_autogenerate: new.do_not_autogenerate,
            do_not_sweep: new.do_not_sweep,
            children: Vec::new(),
            elements: Vec::new(),
            cells: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.transact(|tx| {
            if let Some(language) = page.language {
                if tx.get::<Language>(language.get())?.is_none() {
                    return Err(abort(ValidationError::single("Language must exist")));
                }
                if page.is_language_root {
                    claim_language_root(tx, language, id)?;
                }
            }
            if let Some(parent_id) = page.parent {
                let mut parent: Page = tx.require(parent_id.get())?;
                parent.children.push(id);
                parent.updated_at = now;
                tx.put(&parent)?;
            }
            tx.put(&page)
        })?;

        info!(page_id = %id, name = %page.name, layout = %page.page_layout, "Created page");
        Ok(page)
    }

    /// Insert the global root page. Fails if a root already exists.
    pub fn create_root_page(&self, new: &NewRootPage) -> Result<Page, CmsError> {
        new.validate()?;
        let id = PageId(self.next_id()?);
        let now = now_millis();
        let page = Page {
            id,
            name: new.name.clone(),
            page_layout: new.page_layout.clone(),
            parent: None,
            language: None,
            language_code: None,
            is_language_root: false,
            is_layoutpage: false,
            do_not_autogenerate: true,
            do_not_sweep: true,
            children: Vec::new(),
            elements: Vec::new(),
            cells: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.transact(|tx| {
            if tx.unique_owner(UNIQ_GLOBAL_ROOT, ROOT_SLOT)?.is_some() {
                return Err(abort(ValidationError::single(
                    "A root page already exists",
                )));
            }
            tx.claim_unique(UNIQ_GLOBAL_ROOT, ROOT_SLOT, id.get())?;
            tx.put(&page)
        })?;

        info!(page_id = %id, "Created root page");
        Ok(page)
    }

    /// Find the root by name and layout, creating it when absent.
    pub fn find_or_create_root(&self, new: &NewRootPage) -> Result<(Page, bool), CmsError> {
        if let Some(existing) = self.find_page_by_name_and_layout(&new.name, &new.page_layout)? {
            debug!(page_id = %existing.id, "Root page already present");
            return Ok((existing, false));
        }
        Ok((self.create_root_page(new)?, true))
    }

    /// Find the frontpage of `language` by name and layout, creating it as the
    /// language root when absent. A created frontpage has no parent yet.
    pub fn find_or_create_frontpage(
        &self,
        language: &Language,
        layouts: &Layouts,
    ) -> Result<(Page, bool), CmsError> {
        if let Some(existing) =
            self.find_page_by_name_and_layout(&language.frontpage_name, &language.page_layout)?
        {
            debug!(page_id = %existing.id, "Frontpage already present");
            return Ok((existing, false));
        }
        Ok((self.create_page(&NewPage::frontpage(language), layouts)?, true))
    }

    /// Re-parent `child` below `parent`, appending it as the last child.
    /// The subtree of `child` moves along; cycles are rejected.
    pub fn attach(&self, child: PageId, parent: PageId) -> Result<(), CmsError> {
        let moved = self.transact(|tx| {
            if child == parent {
                return Err(abort(TreeError::Cycle { child, parent }));
            }
            let mut page: Page = tx.require(child.get())?;
            if page.parent == Some(parent) {
                return Ok(false);
            }
            if page.is_root() {
                return Err(abort(TreeError::RootMove(child)));
            }
            let mut target: Page = tx.require(parent.get())?;
            ensure_not_ancestor(tx, child, &target)?;

            let now = now_millis();
            if let Some(old_parent_id) = page.parent {
                let mut old_parent: Page = tx.require(old_parent_id.get())?;
                old_parent.children.retain(|c| *c != child);
                old_parent.updated_at = now;
                tx.put(&old_parent)?;
            }
            target.children.retain(|c| *c != child);
            target.children.push(child);
            target.updated_at = now;
            tx.put(&target)?;

            page.parent = Some(parent);
            page.updated_at = now;
            tx.put(&page)?;
            Ok(true)
        })?;

        if moved {
            info!(page_id = %child, parent_id = %parent, "Attached page");
        }
        Ok(())
    }

    /// Bulk reassignment used by the upgrade. Skips page validation and checks
    /// only that the language exists and that language roots stay unique.
    pub fn reassign_language_trusted(
        &self,
        page: PageId,
        language: &Language,
    ) -> Result<(), CmsError> {
        let language_id = language.id;
        let code = language.code.clone();
        self.transact(|tx| {
            if tx.get::<Language>(language_id.get())?.is_none() {
                return Err(abort(StorageError::not_found("language", language_id.get())));
            }
            let mut record: Page = tx.require(page.get())?;
            if record.is_language_root {
                if let Some(previous) = record.language.filter(|l| *l != language_id) {
                    tx.release_unique(UNIQ_LANGUAGE_ROOT, &previous.to_string(), page.get())?;
                }
                claim_language_root(tx, language_id, page)?;
            }
            record.language = Some(language_id);
            record.language_code = Some(code.clone());
            record.updated_at = now_millis();
            tx.put(&record)
        })?;
        debug!(page_id = %page, code = %language.code, "Reassigned page language");
        Ok(())
    }
}

fn claim_language_root(tx: &Tx<'_>, language: LanguageId, page: PageId) -> TxResult<()> {
    let key = language.to_string();
    if let Some(existing) = tx.unique_owner(UNIQ_LANGUAGE_ROOT, &key)? {
        if existing != page.get() {
            return Err(abort(ValidationError::single(format!(
                "Language {} already has a language root (page {})",
                language, existing
            ))));
        }
    }
    tx.claim_unique(UNIQ_LANGUAGE_ROOT, &key, page.get())
}

/// Walk up from `target`; `child` must not appear on the way to the top.
fn ensure_not_ancestor(tx: &Tx<'_>, child: PageId, target: &Page) -> TxResult<()> {
    let mut seen = HashSet::from([target.id]);
    let mut next = target.parent;
    while let Some(id) = next {
        if id == child {
            return Err(abort(TreeError::Cycle {
                child,
                parent: target.id,
            }));
        }
        if !seen.insert(id) {
            break;
        }
        let page: Page = tx.require(id.get())?;
        next = page.parent;
    }
    Ok(())
}
