//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("default_language.name", "English")?
        .set_default("default_language.code", "en")?
        .set_default("default_language.frontpage_name", "Index")?
        .set_default("default_language.page_layout", "index")?
        .set_default("default_translation", "en")?
        .set_default("storage.store_path", ".pagetree/store")?
        .set_default("layouts.config_dir", "config/pagetree")
}
