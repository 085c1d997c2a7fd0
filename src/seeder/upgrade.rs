//! Upgrade of legacy data
//!
//! Legacy pages carry a free-text `language_code` and keep all elements in one
//! flat list. The upgrade gives every such page a structured language and
//! sorts elements into cells. Each step is find-or-create, so a rerun (or a run
//! after a partial failure) picks up where the last one stopped. There is no
//! global rollback: failures are reported and the batch moves on.

use super::{SeedReport, Seeder};
use crate::composition::MAIN_CONTENT_CELL;
use crate::error::CmsError;
use crate::language::{capitalize, Language, NewLanguage};
use crate::page::Page;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// How elements were sorted into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStrategy {
    /// Cells and element names from `page_layouts.yml` and `cells.yml`
    Mapping,
    /// One `maincontent` cell per content page
    MainContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    pub seed: SeedReport,
    pub strategy: CellStrategy,
    pub languages_created: Vec<String>,
    pub pages_reassigned: usize,
    pub layoutpages_assigned: usize,
    pub cells_created: usize,
    pub elements_moved: usize,
    pub notices: Vec<String>,
    pub errors: Vec<String>,
}

impl UpgradeReport {
    fn new(seed: SeedReport, strategy: CellStrategy) -> Self {
        Self {
            seed,
            strategy,
            languages_created: Vec::new(),
            pages_reassigned: 0,
            layoutpages_assigned: 0,
            cells_created: 0,
            elements_moved: 0,
            notices: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.seed.is_success() && self.errors.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.seed.lines();
        for name in &self.languages_created {
            lines.push(format!("== Created language {}", name));
        }
        lines.push(format!(
            "== Assigned languages to {} pages and {} layout pages",
            self.pages_reassigned, self.layoutpages_assigned
        ));
        let strategy = match self.strategy {
            CellStrategy::Mapping => "cell mapping",
            CellStrategy::MainContent => "maincontent cell",
        };
        lines.push(format!(
            "== Created {} cells and moved {} elements ({})",
            self.cells_created, self.elements_moved, strategy
        ));
        if !self.errors.is_empty() {
            lines.push("WARNING! Some records could not be upgraded:".to_string());
            lines.extend(self.errors.iter().cloned());
        }
        lines.extend(self.notices.iter().cloned());
        lines
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

impl Seeder<'_> {
    /// Seed, then migrate legacy languages and flat element lists.
    pub fn upgrade(&self) -> UpgradeReport {
        let seed = self.seed();
        let mapping = self.layouts().cell_mapping();
        let strategy = if mapping.is_some() {
            CellStrategy::Mapping
        } else {
            CellStrategy::MainContent
        };
        let mut report = UpgradeReport::new(seed, strategy);
        info!(?strategy, "Upgrading");

        if let Err(e) = self.backfill_languages(&mut report) {
            report.errors.push(format!("Language backfill stopped: {}", e));
        }
        if let Err(e) = self.assign_layoutpages(&mut report) {
            report.errors.push(format!("Layout page assignment stopped: {}", e));
        }

        let cells = match mapping {
            Some(mapping) => mapping.layouts.iter().try_for_each(|layout| {
                for page in self.store().pages_with_layout(&layout.layout)? {
                    for cell in &layout.cells {
                        let names = Some(cell.element_names());
                        self.move_into_cell(&page, &cell.name, names, &mut report);
                    }
                }
                Ok::<(), CmsError>(())
            }),
            None => self.store().contentpages().map_err(CmsError::from).map(|pages| {
                for page in &pages {
                    self.move_into_cell(page, MAIN_CONTENT_CELL, None, &mut report);
                }
            }),
        };
        if let Err(e) = cells {
            report.errors.push(format!("Cell migration stopped: {}", e));
        }

        if report.is_success() {
            info!(
                cells = report.cells_created,
                elements = report.elements_moved,
                "Upgrade finished"
            );
        } else {
            warn!(errors = report.errors.len(), "Upgrade finished with errors");
        }
        report
    }

    /// Give every page with a legacy code the language of that code.
    fn backfill_languages(&self, report: &mut UpgradeReport) -> Result<(), CmsError> {
        for page in self.store().pages()? {
            let Some(code) = page.language_code.clone().filter(|c| !c.trim().is_empty()) else {
                continue;
            };
            let language = match self.language_for_code(&page, &code, report) {
                Ok(language) => language,
                Err(e) => {
                    report.errors.push(format!(
                        "Errors creating language {}: {}",
                        capitalize(&code),
                        e.messages().join(", ")
                    ));
                    continue;
                }
            };
            if page.language == Some(language.id) {
                continue;
            }
            match self.store().reassign_language_trusted(page.id, &language) {
                Ok(()) => report.pages_reassigned += 1,
                Err(e) => report.errors.push(format!(
                    "Errors assigning language {} to page {}: {}",
                    language.code,
                    page.name,
                    e.messages().join(", ")
                )),
            }
        }
        Ok(())
    }

    fn language_for_code(
        &self,
        page: &Page,
        code: &str,
        report: &mut UpgradeReport,
    ) -> Result<Language, CmsError> {
        if let Some(existing) = self.store().find_language_by_code(code)? {
            return Ok(existing);
        }
        let (frontpage_name, page_layout) = match self.store().language_root_of(page)? {
            Some(root) => (root.name, root.page_layout),
            None => {
                let defaults = &self.config().default_language;
                debug!(page_id = %page.id, "No language root, using configured frontpage");
                (defaults.frontpage_name.clone(), defaults.page_layout.clone())
            }
        };
        let (language, created) = self.store().find_or_create_language(&NewLanguage {
            code: code.to_string(),
            name: capitalize(code),
            frontpage_name,
            page_layout,
            is_default: false,
            is_public: true,
        })?;
        if created {
            report.languages_created.push(language.name.clone());
        }
        Ok(language)
    }

    /// Layout pages still without a language get the one named by their own
    /// legacy code. Pages with nothing to resolve from are skipped.
    fn assign_layoutpages(&self, report: &mut UpgradeReport) -> Result<(), CmsError> {
        for page in self.store().layoutpages()? {
            if page.language.is_some() {
                continue;
            }
            let resolved = match page.language_code.as_deref() {
                Some(code) if !code.trim().is_empty() => self.store().find_language_by_code(code)?,
                _ => None,
            };
            let Some(language) = resolved else {
                report.notices.push(format!(
                    "= Layout page {} has no language and was skipped",
                    page.name
                ));
                continue;
            };
            match self.store().reassign_language_trusted(page.id, &language) {
                Ok(()) => report.layoutpages_assigned += 1,
                Err(e) => report.errors.push(format!(
                    "Errors assigning language {} to layout page {}: {}",
                    language.code,
                    page.name,
                    e.messages().join(", ")
                )),
            }
        }
        Ok(())
    }

    /// Find or create the cell `name` on `page` and move the ungrouped
    /// elements named in `names` into it. `None` moves every element.
    fn move_into_cell(
        &self,
        page: &Page,
        name: &str,
        names: Option<BTreeSet<&str>>,
        report: &mut UpgradeReport,
    ) {
        let result = self
            .store()
            .find_or_create_cell(page.id, name)
            .and_then(|(cell, created)| {
                if created {
                    report.cells_created += 1;
                }
                self.store().group_elements_into_cell(cell.id, |element| {
                    names
                        .as_ref()
                        .map_or(true, |names| names.contains(element.name.as_str()))
                })
            });
        match result {
            Ok(moved) => {
                if !moved.is_empty() {
                    debug!(
                        page_id = %page.id,
                        cell = %name,
                        moved = moved.len(),
                        "Grouped elements"
                    );
                }
                report.elements_moved += moved.len();
            }
            Err(e) => {
                warn!(page_id = %page.id, cell = %name, error = %e, "Cell migration failed");
                report.errors.push(format!(
                    "Errors creating cell {} on page {}: {}",
                    name,
                    page.name,
                    e.messages().join(", ")
                ));
            }
        }
    }
}
