//! Essences: the typed values behind contents
//!
//! An essence is referenced from exactly one content by its (id, type) pair.
//! The set of types is closed; every variant shares the [`Essence`] capability
//! set so callers never need to know which one they hold.

pub mod variants;

pub use variants::{
    EssenceBoolean, EssenceFile, EssenceLink, EssencePicture, EssenceRichtext, EssenceText,
};

use crate::composition::{Content, Element};
use crate::error::{EssenceError, StorageError, ValidationError};
use crate::page::Page;
use crate::store::record_key;
use crate::types::{ElementId, EssenceId, PageId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LINK_TARGET: &str = "link_target";
pub const NEW_WINDOW_TARGET: &str = "blank";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EssenceKind {
    #[default]
    Text,
    Richtext,
    Picture,
    File,
    Link,
    Boolean,
}

impl EssenceKind {
    pub const ALL: [EssenceKind; 6] = [
        EssenceKind::Text,
        EssenceKind::Richtext,
        EssenceKind::Picture,
        EssenceKind::File,
        EssenceKind::Link,
        EssenceKind::Boolean,
    ];

    /// Stored type tag.
    pub fn type_name(self) -> &'static str {
        match self {
            EssenceKind::Text => "EssenceText",
            EssenceKind::Richtext => "EssenceRichtext",
            EssenceKind::Picture => "EssencePicture",
            EssenceKind::File => "EssenceFile",
            EssenceKind::Link => "EssenceLink",
            EssenceKind::Boolean => "EssenceBoolean",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }

    pub(crate) fn table(self) -> String {
        format!("essence:{}", self.type_name())
    }
}

impl fmt::Display for EssenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// The polymorphic (id, type) reference a content holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EssenceRef {
    pub id: EssenceId,
    pub kind: EssenceKind,
}

impl EssenceRef {
    pub fn new(id: EssenceId, kind: EssenceKind) -> Self {
        Self { id, kind }
    }

    pub fn storage_key(&self) -> String {
        record_key(&self.kind.table(), self.id.get())
    }

    /// Key of the (essence_type, essence_id) unique index.
    pub fn owner_key(&self) -> String {
        format!("{}:{}", self.kind.type_name(), self.id)
    }
}

impl fmt::Display for EssenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Capability set shared by every essence type.
pub trait Essence {
    fn kind(&self) -> EssenceKind;

    /// Attribute holding the primary value.
    fn ingredient_column(&self) -> &'static str;

    /// `None` for unset values and for attributes the type does not have.
    fn get_value(&self, key: &str) -> Option<String>;

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError>;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn ingredient(&self) -> Option<String> {
        self.get_value(self.ingredient_column())
    }

    fn set_ingredient(&mut self, value: &str) -> Result<(), EssenceError> {
        let column = self.ingredient_column();
        self.set_value(column, value)
    }

    /// True only when `link_target` is exactly `"blank"`. Types without a link
    /// target answer false.
    fn is_link_opened_in_new_window(&self) -> bool {
        self.get_value(LINK_TARGET).as_deref() == Some(NEW_WINDOW_TARGET)
    }

    /// Plain-text rendering of the ingredient, cut to `max_chars`.
    fn preview_text(&self, max_chars: usize) -> String {
        truncate_chars(&self.ingredient().unwrap_or_default(), max_chars)
    }
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// One value of the closed essence family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EssenceValue {
    Text(EssenceText),
    Richtext(EssenceRichtext),
    Picture(EssencePicture),
    File(EssenceFile),
    Link(EssenceLink),
    Boolean(EssenceBoolean),
}

impl EssenceValue {
    /// Empty value of the given type.
    pub fn empty(kind: EssenceKind) -> Self {
        match kind {
            EssenceKind::Text => EssenceValue::Text(EssenceText::default()),
            EssenceKind::Richtext => EssenceValue::Richtext(EssenceRichtext::default()),
            EssenceKind::Picture => EssenceValue::Picture(EssencePicture::default()),
            EssenceKind::File => EssenceValue::File(EssenceFile::default()),
            EssenceKind::Link => EssenceValue::Link(EssenceLink::default()),
            EssenceKind::Boolean => EssenceValue::Boolean(EssenceBoolean::default()),
        }
    }

    fn as_dyn(&self) -> &dyn Essence {
        match self {
            EssenceValue::Text(e) => e,
            EssenceValue::Richtext(e) => e,
            EssenceValue::Picture(e) => e,
            EssenceValue::File(e) => e,
            EssenceValue::Link(e) => e,
            EssenceValue::Boolean(e) => e,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn Essence {
        match self {
            EssenceValue::Text(e) => e,
            EssenceValue::Richtext(e) => e,
            EssenceValue::Picture(e) => e,
            EssenceValue::File(e) => e,
            EssenceValue::Link(e) => e,
            EssenceValue::Boolean(e) => e,
        }
    }

    /// Foreign picture id, for picture essences.
    pub fn picture_id(&self) -> Option<u64> {
        match self {
            EssenceValue::Picture(p) => p.picture_id,
            _ => None,
        }
    }

    /// Foreign attachment id, for file essences.
    pub fn attachment_id(&self) -> Option<u64> {
        match self {
            EssenceValue::File(f) => f.attachment_id,
            _ => None,
        }
    }
}

impl Essence for EssenceValue {
    fn kind(&self) -> EssenceKind {
        self.as_dyn().kind()
    }

    fn ingredient_column(&self) -> &'static str {
        self.as_dyn().ingredient_column()
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.as_dyn().get_value(key)
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        self.as_dyn_mut().set_value(key, value)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.as_dyn().validate()
    }

    fn preview_text(&self, max_chars: usize) -> String {
        self.as_dyn().preview_text(max_chars)
    }
}

/// A stored essence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssenceRecord {
    pub id: EssenceId,
    pub value: EssenceValue,
    pub created_at: i64,
    pub updated_at: i64,
}

impl EssenceRecord {
    pub fn essence_ref(&self) -> EssenceRef {
        EssenceRef::new(self.id, self.value.kind())
    }

    /// Page this essence is placed on: essence -> content -> element -> page.
    /// `None` while any link of that chain is missing.
    pub fn owning_page<L>(&self, lookup: &L) -> Result<Option<Page>, StorageError>
    where
        L: CompositionLookup + ?Sized,
    {
        let Some(content) = lookup.lookup_owning_content(self.essence_ref())? else {
            return Ok(None);
        };
        let Some(element) = lookup.lookup_element(content.element_id)? else {
            return Ok(None);
        };
        lookup.lookup_page(element.page_id)
    }
}

impl Essence for EssenceRecord {
    fn kind(&self) -> EssenceKind {
        self.value.kind()
    }

    fn ingredient_column(&self) -> &'static str {
        self.value.ingredient_column()
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.value.get_value(key)
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        self.value.set_value(key, value)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.value.validate()
    }

    fn preview_text(&self, max_chars: usize) -> String {
        self.value.preview_text(max_chars)
    }
}

/// Read access needed to walk from an essence up to its page.
pub trait CompositionLookup {
    fn lookup_owning_content(&self, essence: EssenceRef) -> Result<Option<Content>, StorageError>;
    fn lookup_element(&self, id: ElementId) -> Result<Option<Element>, StorageError>;
    fn lookup_page(&self, id: PageId) -> Result<Option<Page>, StorageError>;
}
