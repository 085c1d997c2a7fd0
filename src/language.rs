//! Languages
//!
//! One page tree exists per language. A language names the frontpage and page
//! layout its language root is created with.

use crate::error::{CmsError, StorageError, ValidationError};
use crate::store::{
    abort, unique_key, Record, Store, UNIQ_DEFAULT_LANGUAGE, UNIQ_LANGUAGE_CODE,
};
use crate::types::{now_millis, LanguageId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_SLOT: &str = "installation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: LanguageId,
    pub code: String,
    pub name: String,
    pub frontpage_name: String,
    pub page_layout: String,
    pub is_default: bool,
    pub is_public: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Language {
    const TABLE: &'static str = "language";

    fn record_id(&self) -> u64 {
        self.id.get()
    }
}

/// Attributes of a language that is not stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLanguage {
    pub code: String,
    pub name: String,
    pub frontpage_name: String,
    pub page_layout: String,
    pub is_default: bool,
    pub is_public: bool,
}

impl NewLanguage {
    /// Presence and format checks. Code uniqueness is enforced by the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        if self.name.trim().is_empty() {
            messages.push("Name can't be blank".to_string());
        }
        if self.code.trim().is_empty() {
            messages.push("Code can't be blank".to_string());
        } else if !is_valid_code(&self.code) {
            messages.push(format!("Code '{}' is not a valid language code", self.code));
        }
        if self.frontpage_name.trim().is_empty() {
            messages.push("Frontpage name can't be blank".to_string());
        }
        if self.page_layout.trim().is_empty() {
            messages.push("Page layout can't be blank".to_string());
        }
        ValidationError::check(messages)
    }
}

/// `en`, `de`, `pt-br`: two lowercase letters, optionally a region.
pub fn is_valid_code(code: &str) -> bool {
    let mut parts = code.splitn(2, '-');
    let lang = parts.next().unwrap_or_default();
    let lang_ok = lang.len() == 2 && lang.chars().all(|c| c.is_ascii_lowercase());
    match parts.next() {
        None => lang_ok,
        Some(region) => {
            lang_ok
                && (2..=3).contains(&region.len())
                && region.chars().all(|c| c.is_ascii_alphanumeric())
        }
    }
}

/// `"de"` -> `"De"`
pub fn capitalize(code: &str) -> String {
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

impl Store {
    pub fn language(&self, id: LanguageId) -> Result<Option<Language>, StorageError> {
        self.get(id.get())
    }

    pub fn languages(&self) -> Result<Vec<Language>, StorageError> {
        self.scan()
    }

    pub fn find_language_by_code(&self, code: &str) -> Result<Option<Language>, StorageError> {
        match self.unique_owner(UNIQ_LANGUAGE_CODE, code)? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    pub fn default_language(&self) -> Result<Option<Language>, StorageError> {
        match self.unique_owner(UNIQ_DEFAULT_LANGUAGE, DEFAULT_SLOT)? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// Validate and insert a language. A new default demotes the previous one.
    pub fn create_language(&self, new: &NewLanguage) -> Result<Language, CmsError> {
        new.validate()?;
        let id = LanguageId(self.next_id()?);
        let now = now_millis();
        let language = Language {
            id,
            code: new.code.clone(),
            name: new.name.clone(),
            frontpage_name: new.frontpage_name.clone(),
            page_layout: new.page_layout.clone(),
            is_default: new.is_default,
            is_public: new.is_public,
            created_at: now,
            updated_at: now,
        };

        self.transact(|tx| {
            if tx.unique_owner(UNIQ_LANGUAGE_CODE, &language.code)?.is_some() {
                return Err(abort(ValidationError::single(format!(
                    "Code '{}' has already been taken",
                    language.code
                ))));
            }
            tx.claim_unique(UNIQ_LANGUAGE_CODE, &language.code, id.get())?;
            if language.is_default {
                if let Some(previous) = tx.unique_owner(UNIQ_DEFAULT_LANGUAGE, DEFAULT_SLOT)? {
                    if let Some(mut old) = tx.get::<Language>(previous)? {
                        old.is_default = false;
                        old.updated_at = now;
                        tx.put(&old)?;
                    }
                }
                tx.put_key(&unique_key(UNIQ_DEFAULT_LANGUAGE, DEFAULT_SLOT), &id.get())?;
            }
            tx.put(&language)
        })?;

        info!(language_id = %id, code = %language.code, "Created language");
        Ok(language)
    }

    /// Find a language by code, creating it from `new` when absent.
    /// Returns the language and whether it was created.
    pub fn find_or_create_language(
        &self,
        new: &NewLanguage,
    ) -> Result<(Language, bool), CmsError> {
        if let Some(existing) = self.find_language_by_code(&new.code)? {
            debug!(code = %new.code, "Language already present");
            return Ok((existing, false));
        }
        Ok((self.create_language(new)?, true))
    }
}
