//! Error types for the page tree and composition store.

use crate::types::PageId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: u64 },

    #[error("Unique constraint violated on {index}: {key} is already taken")]
    UniqueViolation { index: &'static str, key: String },

    #[error("Corrupt record under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub fn not_found(table: &'static str, id: u64) -> Self {
        StorageError::NotFound { table, id }
    }
}

/// A record failed validation. Messages are kept verbatim for reports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", .messages.join(", "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// `Ok(())` when no messages were collected.
    pub fn check(messages: Vec<String>) -> Result<(), ValidationError> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self { messages })
        }
    }
}

/// Page tree structure errors
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Page {child} cannot be moved below itself or one of its descendants ({parent})")]
    Cycle { child: PageId, parent: PageId },

    #[error("The root page {0} cannot be moved")]
    RootMove(PageId),
}

/// Essence attribute errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EssenceError {
    #[error("{kind} has no attribute '{key}'")]
    UnknownAttribute { kind: &'static str, key: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Top-level error for library operations
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Essence error: {0}")]
    Essence(#[from] EssenceError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Layout definition error in {file}: {reason}")]
    LayoutError { file: String, reason: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CmsError {
    fn from(err: config::ConfigError) -> Self {
        CmsError::ConfigError(err.to_string())
    }
}

impl CmsError {
    /// Messages suitable for a report line. Validation errors keep each message.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CmsError::Validation(v) => v.messages.clone(),
            other => vec![other.to_string()],
        }
    }
}
