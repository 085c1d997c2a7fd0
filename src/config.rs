//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, the
//! workspace config files and `PAGETREE__*` environment variables, later layers
//! overriding earlier ones. The loaded [`CmsConfig`] is passed explicitly to
//! the seeder and the CLI; nothing reads configuration globally.

use crate::language::NewLanguage;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Language created by the seeder
    #[serde(default)]
    pub default_language: DefaultLanguageConfig,

    /// Locale tag for operator-facing strings
    #[serde(default = "default_translation")]
    pub default_translation: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub layouts: LayoutsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_translation() -> String {
    "en".to_string()
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            default_language: DefaultLanguageConfig::default(),
            default_translation: default_translation(),
            storage: StorageConfig::default(),
            layouts: LayoutsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The installation's default language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLanguageConfig {
    pub name: String,
    pub code: String,
    pub frontpage_name: String,
    pub page_layout: String,
}

impl Default for DefaultLanguageConfig {
    fn default() -> Self {
        Self {
            name: "English".to_string(),
            code: "en".to_string(),
            frontpage_name: "Index".to_string(),
            page_layout: "index".to_string(),
        }
    }
}

impl DefaultLanguageConfig {
    /// Attributes of the public default language this entry describes.
    pub fn to_new_language(&self) -> NewLanguage {
        NewLanguage {
            code: self.code.clone(),
            name: self.name.clone(),
            frontpage_name: self.frontpage_name.clone(),
            page_layout: self.page_layout.clone(),
            is_default: true,
            is_public: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory, relative to the workspace root unless absolute
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".pagetree/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutsConfig {
    /// Directory holding page_layouts.yml and cells.yml
    #[serde(default = "default_layouts_dir")]
    pub config_dir: PathBuf,
}

fn default_layouts_dir() -> PathBuf {
    PathBuf::from("config/pagetree")
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            config_dir: default_layouts_dir(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    DefaultLanguage(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValidationError::DefaultLanguage(msg) => write!(f, "default_language: {}", msg),
            ConfigValidationError::Storage(msg) => write!(f, "storage: {}", msg),
            ConfigValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl CmsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.default_language.to_new_language().validate() {
            errors.extend(
                e.messages
                    .into_iter()
                    .map(ConfigValidationError::DefaultLanguage),
            );
        }

        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ConfigValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ConfigValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Store path resolved against `workspace_root`.
    pub fn store_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.storage.store_path)
    }

    /// Layout definition directory resolved against `workspace_root`.
    pub fn layouts_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.layouts.config_dir)
    }
}
