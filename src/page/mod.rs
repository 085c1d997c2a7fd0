//! Pages
//!
//! Pages form one tree per language below a single global root. The root has no
//! language; every other page must carry one. Each language has exactly one
//! language-root page acting as its frontpage.

pub mod tree;

use crate::error::ValidationError;
use crate::language::Language;
use crate::layouts::Layouts;
use crate::store::Record;
use crate::types::{CellId, ElementId, LanguageId, PageId};
use serde::{Deserialize, Serialize};

pub const ROOT_NAME: &str = "Root";
pub const ROOT_LAYOUT: &str = "rootpage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub page_layout: String,
    pub parent: Option<PageId>,
    pub language: Option<LanguageId>,
    /// Free-text language code written by installations that predate the
    /// language table. Resolved into `language` by the upgrade.
    pub language_code: Option<String>,
    pub is_language_root: bool,
    pub is_layoutpage: bool,
    pub do_not_autogenerate: bool,
    pub do_not_sweep: bool,
    pub children: Vec<PageId>,
    /// Elements not grouped into a cell, in position order.
    pub elements: Vec<ElementId>,
    pub cells: Vec<CellId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Page {
    const TABLE: &'static str = "page";

    fn record_id(&self) -> u64 {
        self.id.get()
    }
}

impl Page {
    pub fn is_root(&self) -> bool {
        self.parent.is_none() && self.language.is_none() && self.page_layout == ROOT_LAYOUT
    }

    /// Pages holding editable content: neither layout pages nor the root.
    pub fn is_content_page(&self) -> bool {
        !self.is_layoutpage && !self.is_root()
    }
}

/// Attributes of a page that is not stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub name: String,
    pub page_layout: String,
    pub parent: Option<PageId>,
    pub language: Option<LanguageId>,
    pub language_code: Option<String>,
    pub is_language_root: bool,
    pub is_layoutpage: bool,
    pub do_not_autogenerate: bool,
    pub do_not_sweep: bool,
}

impl NewPage {
    pub fn new(name: impl Into<String>, page_layout: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_layout: page_layout.into(),
            parent: None,
            language: None,
            language_code: None,
            is_language_root: false,
            is_layoutpage: false,
            do_not_autogenerate: false,
            do_not_sweep: false,
        }
    }

    /// The language root of `language`.
    pub fn frontpage(language: &Language) -> Self {
        Self {
            language: Some(language.id),
            language_code: Some(language.code.clone()),
            is_language_root: true,
            do_not_autogenerate: true,
            do_not_sweep: true,
            ..Self::new(language.frontpage_name.clone(), language.page_layout.clone())
        }
    }

    pub fn in_language(mut self, language: &Language) -> Self {
        self.language = Some(language.id);
        self.language_code = Some(language.code.clone());
        self
    }

    pub fn below(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn layoutpage(mut self) -> Self {
        self.is_layoutpage = true;
        self
    }

    /// Checks applied to every page created through the interactive path.
    pub fn validate(&self, layouts: &Layouts) -> Result<(), ValidationError> {
        let mut messages = self.presence_messages();
        if self.language.is_none() {
            messages.push("Language can't be blank".to_string());
        }
        if !self.page_layout.trim().is_empty() && !layouts.is_layout_defined(&self.page_layout) {
            messages.push(format!("Page layout '{}' is not defined", self.page_layout));
        }
        ValidationError::check(messages)
    }

    fn presence_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.name.trim().is_empty() {
            messages.push("Name can't be blank".to_string());
        }
        if self.page_layout.trim().is_empty() {
            messages.push("Page layout can't be blank".to_string());
        }
        messages
    }
}

/// Attributes of the global root page. The root is the one page that never
/// carries a language, so it has its own constructor and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRootPage {
    pub name: String,
    pub page_layout: String,
}

impl Default for NewRootPage {
    fn default() -> Self {
        Self {
            name: ROOT_NAME.to_string(),
            page_layout: ROOT_LAYOUT.to_string(),
        }
    }
}

impl NewRootPage {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        if self.name.trim().is_empty() {
            messages.push("Name can't be blank".to_string());
        }
        if self.page_layout != ROOT_LAYOUT {
            messages.push(format!("Root page layout must be '{}'", ROOT_LAYOUT));
        }
        ValidationError::check(messages)
    }
}
