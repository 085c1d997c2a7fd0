//! Workspace config file source: config/config.toml and config/{env}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

pub const ENV_NAME_VAR: &str = "PAGETREE_ENV";

pub fn base_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join("config").join("config.toml")
}

/// Add workspace config files to builder.
/// Precedence: config/config.toml (base) then config/{PAGETREE_ENV}.toml (env-specific).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let env_name = std::env::var(ENV_NAME_VAR).unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_path = base_config_path(workspace_root);
    if base_path.exists() {
        builder = builder.add_source(File::from(base_path.as_path()).required(false));
    }

    let env_path = workspace_root
        .join("config")
        .join(format!("{}.toml", env_name));
    if env_path.exists() {
        builder = builder.add_source(File::from(env_path.as_path()).required(false));
    }

    Ok(builder)
}
