//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_languages_json, format_languages_text, format_tree_json, format_tree_text,
    format_upgrade_report, format_seed_report, format_verify_report, TreeRow,
};
use crate::config::{CmsConfig, ConfigLoader};
use crate::error::CmsError;
use crate::layouts::Layouts;
use crate::page::Page;
use crate::schema;
use crate::seeder::Seeder;
use crate::store::Store;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace and loaded configuration.
/// The store is opened per command so `init-config` works without one.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CmsConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CmsError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            CmsError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Open the store and bring its schema up to date.
    pub fn open_store(&self) -> Result<Store, CmsError> {
        let path = self.config.store_path(&self.workspace_root);
        std::fs::create_dir_all(&path).map_err(crate::error::StorageError::IoError)?;
        let store = Store::open(&path)?;
        let applied = schema::migrate(&store)?;
        if !applied.is_empty() {
            info!(migrations = ?applied, "Applied schema migrations");
        }
        Ok(store)
    }

    pub fn layouts(&self) -> Result<Layouts, CmsError> {
        Layouts::load(&self.config.layouts_dir(&self.workspace_root))
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, CmsError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        debug!(
            command = command.name(),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, CmsError> {
        match command {
            Commands::Seed { format } => {
                let store = self.open_store()?;
                let layouts = self.layouts()?;
                let report = Seeder::new(&store, &self.config, &layouts).seed();
                store.flush()?;
                format_seed_report(&report, format)
            }
            Commands::Upgrade { format } => {
                let store = self.open_store()?;
                let layouts = self.layouts()?;
                let report = Seeder::new(&store, &self.config, &layouts).upgrade();
                store.flush()?;
                format_upgrade_report(&report, format)
            }
            Commands::Migrate => {
                let path = self.config.store_path(&self.workspace_root);
                std::fs::create_dir_all(&path).map_err(crate::error::StorageError::IoError)?;
                let store = Store::open(&path)?;
                let applied = schema::migrate(&store)?;
                store.flush()?;
                if applied.is_empty() {
                    Ok("Schema is up to date".to_string())
                } else {
                    Ok(applied
                        .iter()
                        .map(|v| format!("== Applied migration {}", v))
                        .collect::<Vec<_>>()
                        .join("\n"))
                }
            }
            Commands::Verify { format } => {
                let store = self.open_store()?;
                let report = schema::verify(&store)?;
                format_verify_report(&report, format)
            }
            Commands::Tree { language, format } => {
                let store = self.open_store()?;
                let rows = tree_rows(&store, language.as_deref())?;
                if format == "json" {
                    format_tree_json(&rows)
                } else {
                    Ok(format_tree_text(&rows))
                }
            }
            Commands::Languages { format } => {
                let store = self.open_store()?;
                let languages = store.languages()?;
                if format == "json" {
                    format_languages_json(&languages)
                } else {
                    Ok(format_languages_text(&languages))
                }
            }
            Commands::InitConfig { force } => self.init_config(*force),
        }
    }

    fn init_config(&self, force: bool) -> Result<String, CmsError> {
        let path = ConfigLoader::workspace_config_path(&self.workspace_root);
        if path.exists() && !force {
            return Err(CmsError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        let rendered = ConfigLoader::render_default()
            .map_err(|e| CmsError::ConfigError(format!("Failed to render config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::StorageError::IoError)?;
        }
        std::fs::write(&path, rendered).map_err(crate::error::StorageError::IoError)?;
        info!(path = %path.display(), "Wrote configuration");
        Ok(format!("Wrote {}", path.display()))
    }
}

/// Pages in tree order with their depth. Pages not reachable from a
/// parentless page are listed last at depth 0.
pub fn tree_rows(store: &Store, language: Option<&str>) -> Result<Vec<TreeRow>, CmsError> {
    let language = match language {
        Some(code) => Some(store.find_language_by_code(code)?.ok_or_else(|| {
            CmsError::ConfigError(format!("Unknown language code '{}'", code))
        })?),
        None => None,
    };
    let pages = store.pages()?;
    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    let tops: Vec<&Page> = pages.iter().filter(|p| p.parent.is_none()).collect();
    for top in tops.into_iter().chain(pages.iter()) {
        if seen.contains(&top.id) {
            continue;
        }
        let mut stack = vec![(top.clone(), 0usize)];
        while let Some((page, depth)) = stack.pop() {
            if !seen.insert(page.id) {
                continue;
            }
            for child in page.children.iter().rev() {
                if let Some(child) = store.page(*child)? {
                    stack.push((child, depth + 1));
                }
            }
            let keep = match &language {
                Some(l) => page.language == Some(l.id) || page.is_root(),
                None => true,
            };
            if keep {
                let cells = store.cells_of(page.id)?.len();
                let elements = store.elements_of_page(page.id)?.len();
                rows.push(TreeRow::new(&page, depth, cells, elements));
            }
        }
    }
    Ok(rows)
}
