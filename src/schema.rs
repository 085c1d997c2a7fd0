//! Schema migrations and integrity verification
//!
//! Applied migrations are recorded under `meta:schema_migrations`. Each one
//! runs at most once per store; `migrate` is called whenever a store is opened
//! by the CLI.

use crate::composition::{Cell, Content, Element};
use crate::error::{CmsError, StorageError};
use crate::essence::{Essence, EssenceKind, EssenceRecord};
use crate::language::Language;
use crate::page::Page;
use crate::store::{
    index_key, index_prefix_all, meta_key, table_prefix, unique_key, unique_prefix, Store,
    IDX_ATTACHMENT, IDX_PICTURE, UNIQ_ESSENCE_OWNER,
};
use crate::types::{CellId, ElementId, PageId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

const MIGRATIONS_KEY: &str = "schema_migrations";

/// A named, ordered schema change.
struct Migration {
    version: &'static str,
    run: fn(&Store) -> Result<(), CmsError>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "20160927205604_add_foreign_key_indices",
    run: add_foreign_key_indices,
}];

/// Versions applied to this store, oldest first.
pub fn applied_migrations(store: &Store) -> Result<Vec<String>, StorageError> {
    Ok(store
        .get_key::<Vec<String>>(&meta_key(MIGRATIONS_KEY))?
        .unwrap_or_default())
}

/// Run every pending migration. Returns the versions applied by this call.
pub fn migrate(store: &Store) -> Result<Vec<String>, CmsError> {
    let mut applied = applied_migrations(store)?;
    let mut ran = Vec::new();
    for migration in MIGRATIONS {
        if applied.iter().any(|v| v == migration.version) {
            continue;
        }
        info!(version = migration.version, "Running schema migration");
        (migration.run)(store)?;
        applied.push(migration.version.to_string());
        store.put_key(&meta_key(MIGRATIONS_KEY), &applied)?;
        ran.push(migration.version.to_string());
    }
    if ran.is_empty() {
        debug!("Schema is up to date");
    }
    Ok(ran)
}

/// Rebuild the essence owner index and the picture/attachment reverse
/// indices from the stored rows. Two contents sharing one essence abort the
/// migration, leaving the store for manual repair.
fn add_foreign_key_indices(store: &Store) -> Result<(), CmsError> {
    let mut owners: HashMap<String, u64> = HashMap::new();
    for content in store.scan::<Content>()? {
        let key = content.essence.owner_key();
        if let Some(other) = owners.insert(key.clone(), content.id.get()) {
            return Err(CmsError::Schema(format!(
                "Essence {} is referenced by contents {} and {}",
                content.essence, other, content.id
            )));
        }
    }
    for key in store.scan_keys(&unique_prefix(UNIQ_ESSENCE_OWNER))? {
        store.transact(|tx| tx.remove_key(&key))?;
    }
    for (key, content) in &owners {
        store.put_key(&unique_key(UNIQ_ESSENCE_OWNER, key), content)?;
    }

    for key in store.scan_keys(&index_prefix_all(IDX_PICTURE))? {
        store.transact(|tx| tx.remove_key(&key))?;
    }
    for key in store.scan_keys(&index_prefix_all(IDX_ATTACHMENT))? {
        store.transact(|tx| tx.remove_key(&key))?;
    }
    for essence in essences_of(store, EssenceKind::Picture)? {
        if let Some(picture) = essence.value.picture_id() {
            store.put_key(&index_key(IDX_PICTURE, picture, essence.id.get()), &())?;
        }
    }
    for essence in essences_of(store, EssenceKind::File)? {
        if let Some(attachment) = essence.value.attachment_id() {
            store.put_key(&index_key(IDX_ATTACHMENT, attachment, essence.id.get()), &())?;
        }
    }
    info!(owners = owners.len(), "Rebuilt essence indices");
    Ok(())
}

fn essences_of(store: &Store, kind: EssenceKind) -> Result<Vec<EssenceRecord>, StorageError> {
    store.scan_values(&table_prefix(&kind.table()))
}

/// Findings of [`verify`]. Empty means the store is consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub problems: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, message: String) {
        warn!(problem = %message, "Integrity check failed");
        self.problems.push(message);
    }
}

/// Check the structural invariants of the whole store.
pub fn verify(store: &Store) -> Result<IntegrityReport, StorageError> {
    let mut report = IntegrityReport::default();
    let languages = store.scan::<Language>()?;
    let pages: BTreeMap<PageId, Page> = store.pages()?.into_iter().map(|p| (p.id, p)).collect();

    let defaults = languages.iter().filter(|l| l.is_default).count();
    if defaults > 1 {
        report.problem(format!("{} default languages", defaults));
    }
    let language_ids: HashSet<_> = languages.iter().map(|l| l.id).collect();

    let roots: Vec<&Page> = pages.values().filter(|p| p.is_root()).collect();
    if roots.len() > 1 {
        report.problem(format!("{} global root pages", roots.len()));
    }

    let mut language_roots: HashMap<_, Vec<PageId>> = HashMap::new();
    for page in pages.values() {
        if page.is_language_root {
            if let Some(language) = page.language {
                language_roots.entry(language).or_default().push(page.id);
            }
        }
        if !page.is_root() {
            match page.language {
                None => report.problem(format!("Page {} has no language", page.id)),
                Some(language) if !language_ids.contains(&language) => report.problem(format!(
                    "Page {} references missing language {}",
                    page.id, language
                )),
                Some(_) => {}
            }
        }
        check_parent_links(&pages, page, &mut report);
    }
    for (language, ids) in language_roots {
        if ids.len() > 1 {
            report.problem(format!(
                "Language {} has {} language roots",
                language,
                ids.len()
            ));
        }
    }

    check_composition(store, &pages, &mut report)?;
    Ok(report)
}

fn check_parent_links(pages: &BTreeMap<PageId, Page>, page: &Page, report: &mut IntegrityReport) {
    if let Some(parent) = page.parent {
        match pages.get(&parent) {
            Some(p) if p.children.contains(&page.id) => {}
            Some(_) => report.problem(format!(
                "Page {} is missing from the children of page {}",
                page.id, parent
            )),
            None => report.problem(format!("Page {} has missing parent {}", page.id, parent)),
        }
    }
    for child in &page.children {
        if pages.get(child).and_then(|c| c.parent) != Some(page.id) {
            report.problem(format!(
                "Page {} lists child {} that does not point back",
                page.id, child
            ));
        }
    }

    let mut seen = HashSet::from([page.id]);
    let mut next = page.parent;
    while let Some(id) = next {
        if !seen.insert(id) {
            report.problem(format!("Page {} is part of a parent cycle", page.id));
            break;
        }
        next = pages.get(&id).and_then(|p| p.parent);
    }
}

fn check_composition(
    store: &Store,
    pages: &BTreeMap<PageId, Page>,
    report: &mut IntegrityReport,
) -> Result<(), StorageError> {
    let elements: HashMap<ElementId, Element> =
        store.scan::<Element>()?.into_iter().map(|e| (e.id, e)).collect();

    for page in pages.values() {
        check_positions(&elements, &page.elements, None, &format!("page {}", page.id), report);
        for cell_id in &page.cells {
            let Some(cell) = store.get::<Cell>(cell_id.get())? else {
                report.problem(format!("Page {} lists missing cell {}", page.id, cell_id));
                continue;
            };
            if cell.page_id != page.id {
                report.problem(format!("Cell {} belongs to page {}", cell.id, cell.page_id));
            }
            check_positions(
                &elements,
                &cell.elements,
                Some(cell.id),
                &format!("cell {}", cell.id),
                report,
            );
        }
    }

    let mut essences = HashSet::new();
    for element in elements.values() {
        for (index, content_id) in element.contents.iter().enumerate() {
            let Some(content) = store.content(*content_id)? else {
                report.problem(format!(
                    "Element {} lists missing content {}",
                    element.id, content_id
                ));
                continue;
            };
            if content.position as usize != index + 1 {
                report.problem(format!(
                    "Content {} has position {} instead of {}",
                    content.id,
                    content.position,
                    index + 1
                ));
            }
            if !essences.insert(content.essence) {
                report.problem(format!(
                    "Essence {} is owned by more than one content",
                    content.essence
                ));
            }
            let owner = store.unique_owner(UNIQ_ESSENCE_OWNER, &content.essence.owner_key())?;
            if owner != Some(content.id.get()) {
                report.problem(format!(
                    "Owner index of essence {} does not point at content {}",
                    content.essence, content.id
                ));
            }
            match store.essence(content.essence)? {
                Some(record) if record.kind() == content.essence.kind => {}
                _ => report.problem(format!(
                    "Content {} references missing essence {}",
                    content.id, content.essence
                )),
            }
        }
    }
    Ok(())
}

fn check_positions(
    elements: &HashMap<ElementId, Element>,
    ids: &[ElementId],
    cell: Option<CellId>,
    scope: &str,
    report: &mut IntegrityReport,
) {
    for (index, id) in ids.iter().enumerate() {
        let Some(element) = elements.get(id) else {
            report.problem(format!("{} lists missing element {}", scope, id));
            continue;
        };
        if element.position as usize != index + 1 {
            report.problem(format!(
                "Element {} in {} has position {} instead of {}",
                element.id,
                scope,
                element.position,
                index + 1
            ));
        }
        if element.cell_id != cell {
            report.problem(format!("Element {} is listed in {} but points elsewhere", element.id, scope));
        }
    }
}
