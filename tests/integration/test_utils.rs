//! Shared test utilities for integration tests
//!
//! Provides store fixtures, legacy-data builders and isolated XDG/HOME
//! environments for configuration tests.

use pagetree::language::{Language, NewLanguage};
use pagetree::page::Page;
use pagetree::store::Store;
use pagetree::types::{now_millis, LanguageId, PageId};
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const CAPTURED_VARS: [&str; 5] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "PAGETREE_ENV",
    "PAGETREE__DEFAULT_LANGUAGE__NAME",
    "PAGETREE__STORAGE__STORE_PATH",
];

/// Environment variable state to restore after test
struct EnvState {
    vars: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            vars: CAPTURED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME inside `test_dir` and no pagetree
/// overrides set. The original environment is restored afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().join("xdg");
    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_config_home).unwrap();
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_config_home.to_str().unwrap());
    for name in &CAPTURED_VARS[2..] {
        std::env::remove_var(name);
    }

    let result = f();

    env_state.restore();

    result
}

/// A store in a fresh temporary directory. Keep the `TempDir` alive.
pub fn temp_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("store")).unwrap();
    (dir, store)
}

pub fn german() -> NewLanguage {
    NewLanguage {
        code: "de".to_string(),
        name: "Deutsch".to_string(),
        frontpage_name: "Startseite".to_string(),
        page_layout: "start".to_string(),
        is_default: false,
        is_public: true,
    }
}

pub fn create_german(store: &Store) -> Language {
    store.create_language(&german()).unwrap()
}

/// Builder for pages written the way installations without a language table
/// stored them: a free-text code and no structured language.
pub struct LegacyPage {
    page: Page,
}

impl LegacyPage {
    pub fn new(store: &Store, name: &str, page_layout: &str) -> Self {
        let now = now_millis();
        Self {
            page: Page {
                id: PageId(store.next_id().unwrap()),
                name: name.to_string(),
                page_layout: page_layout.to_string(),
                parent: None,
                language: None,
                language_code: None,
                is_language_root: false,
                is_layoutpage: false,
                do_not_autogenerate: false,
                do_not_sweep: false,
                children: Vec::new(),
                elements: Vec::new(),
                cells: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn code(mut self, code: &str) -> Self {
        self.page.language_code = Some(code.to_string());
        self
    }

    pub fn language(mut self, language: LanguageId) -> Self {
        self.page.language = Some(language);
        self
    }

    pub fn below(mut self, parent: PageId) -> Self {
        self.page.parent = Some(parent);
        self
    }

    pub fn language_root(mut self) -> Self {
        self.page.is_language_root = true;
        self
    }

    pub fn layoutpage(mut self) -> Self {
        self.page.is_layoutpage = true;
        self
    }

    pub fn with_page(mut self, f: impl FnOnce(&mut Page)) -> Self {
        f(&mut self.page);
        self
    }

    /// Write the page and link it into its parent's children.
    pub fn insert(self, store: &Store) -> Page {
        if let Some(parent_id) = self.page.parent {
            let mut parent = store.require_page(parent_id).unwrap();
            parent.children.push(self.page.id);
            store.put(&parent).unwrap();
        }
        store.put(&self.page).unwrap();
        self.page
    }
}

/// Names of elements in position order.
pub fn element_names(elements: &[pagetree::composition::Element]) -> Vec<String> {
    elements.iter().map(|e| e.name.clone()).collect()
}

/// Positions of elements in list order.
pub fn positions(elements: &[pagetree::composition::Element]) -> Vec<u32> {
    elements.iter().map(|e| e.position).collect()
}
