//! Entry point for loading configuration.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::CmsConfig;
use config::{Config, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/<PAGETREE_ENV>.toml`,
    /// `PAGETREE__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<CmsConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: CmsConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            language = %config.default_language.code,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<CmsConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Global config file path, when a home or XDG config directory is known.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Path `init-config` writes to.
    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        workspace_file::base_config_path(workspace_root)
    }

    /// Serialized starter configuration.
    pub fn render_default() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&CmsConfig::default())
    }

    /// Build without any file or environment layer.
    pub fn defaults() -> Result<CmsConfig, ConfigError> {
        let config: Config = merge_policy::builder_with_defaults()?.build()?;
        config.try_deserialize()
    }
}
