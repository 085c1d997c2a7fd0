//! Seeder
//!
//! Builds the minimum page structure an installation needs: the default
//! language, the global root page and the language's frontpage below the root.
//! Every step is find-or-create on natural keys, so running it again only
//! produces notices. Failures are collected into the report and never raised.

pub mod upgrade;

pub use upgrade::{CellStrategy, UpgradeReport};

use crate::config::CmsConfig;
use crate::error::CmsError;
use crate::language::Language;
use crate::layouts::Layouts;
use crate::page::{NewRootPage, Page};
use crate::store::Store;
use crate::types::{LanguageId, PageId};
use serde::Serialize;
use tracing::{info, warn};

pub const WARNING_HEADER: &str = "WARNING! Some pages could not be created:";
pub const SUCCESS_LINE: &str = "Success!";

/// Outcome of one seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// `== Created ...` lines, in creation order
    pub created: Vec<String>,
    /// `= ... was already present` lines
    pub notices: Vec<String>,
    /// `Errors creating ...` lines
    pub errors: Vec<String>,
    pub language: Option<LanguageId>,
    pub root: Option<PageId>,
    pub frontpage: Option<PageId>,
    /// Whether the frontpage was attached below the root in this run
    pub attached: bool,
}

impl SeedReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Report lines in output order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.created.clone();
        if !self.errors.is_empty() {
            lines.push(WARNING_HEADER.to_string());
            lines.extend(self.errors.iter().cloned());
        }
        lines.push(SUCCESS_LINE.to_string());
        lines.extend(self.notices.iter().cloned());
        lines
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

/// Seeds and upgrades one store with an explicit configuration.
pub struct Seeder<'a> {
    store: &'a Store,
    config: &'a CmsConfig,
    layouts: &'a Layouts,
}

impl<'a> Seeder<'a> {
    pub fn new(store: &'a Store, config: &'a CmsConfig, layouts: &'a Layouts) -> Self {
        Self {
            store,
            config,
            layouts,
        }
    }

    pub fn store(&self) -> &Store {
        self.store
    }

    pub fn config(&self) -> &CmsConfig {
        self.config
    }

    pub fn layouts(&self) -> &Layouts {
        self.layouts
    }

    /// Create whatever of language, root and frontpage is missing.
    pub fn seed(&self) -> SeedReport {
        info!(
            language = %self.config.default_language.code,
            translation = %self.config.default_translation,
            "Seeding"
        );
        let mut report = SeedReport::default();

        let language = self.seed_language(&mut report);
        let root = self.seed_root(&mut report);
        let frontpage = self.seed_frontpage(language.as_ref(), &mut report);

        report.language = language.as_ref().map(|l| l.id);
        report.root = root.as_ref().map(|p| p.id);
        report.frontpage = frontpage.as_ref().map(|p| p.id);

        if report.errors.is_empty() {
            if let (Some(root), Some(frontpage)) = (&root, &frontpage) {
                match self.store.attach(frontpage.id, root.id) {
                    Ok(()) => report.attached = true,
                    Err(e) => report.errors.push(format!(
                        "Errors attaching page {}: {}",
                        frontpage.name,
                        e.messages().join(", ")
                    )),
                }
            }
        }

        if report.errors.is_empty() {
            info!(created = report.created.len(), notices = report.notices.len(), "Seed finished");
        } else {
            warn!(errors = report.errors.len(), "Seed finished with errors");
        }
        report
    }

    fn seed_language(&self, report: &mut SeedReport) -> Option<Language> {
        let new = self.config.default_language.to_new_language();
        match self.store.find_or_create_language(&new) {
            Ok((language, true)) => {
                report
                    .created
                    .push(format!("== Created language {}", language.name));
                Some(language)
            }
            Ok((language, false)) => {
                report
                    .notices
                    .push(format!("= Language {} was already present", language.name));
                Some(language)
            }
            Err(e) => {
                report.errors.push(creation_error("language", &new.name, &e));
                None
            }
        }
    }

    fn seed_root(&self, report: &mut SeedReport) -> Option<Page> {
        let new = NewRootPage::default();
        record_page(&new.name, self.store.find_or_create_root(&new), report)
    }

    fn seed_frontpage(&self, language: Option<&Language>, report: &mut SeedReport) -> Option<Page> {
        let defaults = &self.config.default_language;
        let Some(language) = language else {
            report.errors.push(format!(
                "Errors creating page {}: Language can't be blank",
                defaults.frontpage_name
            ));
            return None;
        };
        record_page(
            &language.frontpage_name,
            self.store.find_or_create_frontpage(language, self.layouts),
            report,
        )
    }
}

fn record_page(
    name: &str,
    result: Result<(Page, bool), CmsError>,
    report: &mut SeedReport,
) -> Option<Page> {
    match result {
        Ok((page, true)) => {
            report.created.push(format!("== Created page {}", page.name));
            Some(page)
        }
        Ok((page, false)) => {
            report
                .notices
                .push(format!("= Page {} was already present", page.name));
            Some(page)
        }
        Err(e) => {
            report.errors.push(creation_error("page", name, &e));
            None
        }
    }
}

fn creation_error(what: &str, name: &str, err: &CmsError) -> String {
    format!("Errors creating {} {}: {}", what, name, err.messages().join(", "))
}
