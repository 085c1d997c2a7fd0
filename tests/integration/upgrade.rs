//! Upgrade of legacy installations: language backfill and cell migration

use crate::integration::test_utils::{
    create_german, element_names, positions, temp_store, LegacyPage,
};
use pagetree::composition::{ElementScope, MAIN_CONTENT_CELL};
use pagetree::config::CmsConfig;
use pagetree::layouts::{Layouts, CELLS_FILE, PAGE_LAYOUTS_FILE};
use pagetree::page::NewPage;
use pagetree::schema;
use pagetree::seeder::{CellStrategy, Seeder};
use pagetree::types::CellId;
use tempfile::TempDir;

const PAGE_LAYOUTS_YML: &str = r#"
- name: index
- name: start
- name: standard
  cells: [main, side]
"#;

const CELLS_YML: &str = r#"
- name: main
  elements: [headline, text]
- name: side
  elements: [teaser]
"#;

fn mapping_layouts() -> (TempDir, Layouts) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(PAGE_LAYOUTS_FILE), PAGE_LAYOUTS_YML).unwrap();
    std::fs::write(dir.path().join(CELLS_FILE), CELLS_YML).unwrap();
    let layouts = Layouts::load(dir.path()).unwrap();
    (dir, layouts)
}

#[test]
fn test_legacy_codes_become_languages() {
    let (_dir, store) = temp_store();
    let startseite = LegacyPage::new(&store, "Startseite", "start")
        .code("de")
        .language_root()
        .insert(&store);
    let kontakt = LegacyPage::new(&store, "Kontakt", "standard")
        .code("de")
        .below(startseite.id)
        .insert(&store);

    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let report = Seeder::new(&store, &config, &layouts).upgrade();

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.languages_created, vec!["De".to_string()]);
    assert_eq!(report.pages_reassigned, 2);

    let german = store.find_language_by_code("de").unwrap().unwrap();
    assert_eq!(german.name, "De");
    assert_eq!(german.frontpage_name, "Startseite");
    assert_eq!(german.page_layout, "start");
    assert!(german.is_public);
    assert!(!german.is_default);

    for id in [startseite.id, kontakt.id] {
        assert_eq!(store.require_page(id).unwrap().language, Some(german.id));
    }
    assert_eq!(
        store.language_root_for(german.id).unwrap().map(|p| p.id),
        Some(startseite.id)
    );
}

#[test]
fn test_legacy_page_without_root_uses_configured_frontpage() {
    let (_dir, store) = temp_store();
    LegacyPage::new(&store, "Accueil", "standard")
        .code("fr")
        .insert(&store);

    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let report = Seeder::new(&store, &config, &layouts).upgrade();

    assert_eq!(report.languages_created, vec!["Fr".to_string()]);
    let french = store.find_language_by_code("fr").unwrap().unwrap();
    assert_eq!(french.frontpage_name, config.default_language.frontpage_name);
    assert_eq!(french.page_layout, config.default_language.page_layout);
}

#[test]
fn test_unresolvable_layoutpage_is_skipped_with_notice() {
    let (_dir, store) = temp_store();
    let footer = LegacyPage::new(&store, "Footer", "footer")
        .layoutpage()
        .insert(&store);

    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let report = Seeder::new(&store, &config, &layouts).upgrade();

    assert!(report.errors.is_empty());
    assert!(report
        .notices
        .contains(&"= Layout page Footer has no language and was skipped".to_string()));
    assert_eq!(report.layoutpages_assigned, 0);
    assert!(store.require_page(footer.id).unwrap().language.is_none());
}

#[test]
fn test_mapping_upgrade_sorts_elements_into_cells() {
    let (_dir, store) = temp_store();
    let (_layouts_dir, layouts) = mapping_layouts();
    let startseite = LegacyPage::new(&store, "Startseite", "start")
        .code("de")
        .language_root()
        .insert(&store);
    let page = LegacyPage::new(&store, "Produkte", "standard")
        .code("de")
        .below(startseite.id)
        .insert(&store);
    for name in ["headline", "teaser", "text", "extra"] {
        store
            .create_element(ElementScope::Page(page.id), name)
            .unwrap();
    }

    let config = CmsConfig::default();
    let seeder = Seeder::new(&store, &config, &layouts);
    let report = seeder.upgrade();

    assert!(report.is_success(), "{:?} {:?}", report.seed.errors, report.errors);
    assert_eq!(report.strategy, CellStrategy::Mapping);
    assert_eq!(report.cells_created, 2);
    assert_eq!(report.elements_moved, 3);

    let cells = store.cells_of(page.id).unwrap();
    let names: Vec<&str> = cells.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["main", "side"]);

    let main = store.cell_elements(cells[0].id).unwrap();
    assert_eq!(element_names(&main), vec!["headline", "text"]);
    assert_eq!(positions(&main), vec![1, 2]);

    let side = store.cell_elements(cells[1].id).unwrap();
    assert_eq!(element_names(&side), vec!["teaser"]);
    assert_eq!(positions(&side), vec![1]);

    let ungrouped = store.ungrouped_elements(page.id).unwrap();
    assert_eq!(element_names(&ungrouped), vec!["extra"]);
    assert_eq!(positions(&ungrouped), vec![1]);

    // a rerun finds every cell and has nothing left to move
    let rerun = seeder.upgrade();
    assert_eq!(rerun.cells_created, 0);
    assert_eq!(rerun.elements_moved, 0);
    assert_eq!(rerun.pages_reassigned, 0);
    assert_eq!(store.cells_of(page.id).unwrap().len(), 2);

    schema::migrate(&store).unwrap();
    let integrity = schema::verify(&store).unwrap();
    assert!(integrity.is_clean(), "{:?}", integrity.problems);
}

#[test]
fn test_maincontent_upgrade_keeps_element_order() {
    let (_dir, store) = temp_store();
    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let seeder = Seeder::new(&store, &config, &layouts);
    seeder.seed();

    let german = create_german(&store);
    let page = store
        .create_page(
            &NewPage::new("Kontakt", "standard").in_language(&german),
            &layouts,
        )
        .unwrap();
    for name in ["a", "b", "c"] {
        store
            .create_element(ElementScope::Page(page.id), name)
            .unwrap();
    }
    let header = store
        .create_page(
            &NewPage::new("Header", "header")
                .in_language(&german)
                .layoutpage(),
            &layouts,
        )
        .unwrap();
    store
        .create_element(ElementScope::Page(header.id), "logo")
        .unwrap();

    let report = seeder.upgrade();
    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.strategy, CellStrategy::MainContent);
    assert_eq!(report.elements_moved, 3);

    let cells = store.cells_of(page.id).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].name, MAIN_CONTENT_CELL);
    let grouped = store.cell_elements(cells[0].id).unwrap();
    assert_eq!(element_names(&grouped), vec!["a", "b", "c"]);
    assert_eq!(positions(&grouped), vec![1, 2, 3]);
    assert!(store.ungrouped_elements(page.id).unwrap().is_empty());

    // layout pages and the root are not content pages
    assert!(store.cells_of(header.id).unwrap().is_empty());
    assert_eq!(store.ungrouped_elements(header.id).unwrap().len(), 1);
    let root = store.root_page().unwrap().unwrap();
    assert!(store.cells_of(root.id).unwrap().is_empty());
}

#[test]
fn test_failed_page_does_not_stop_the_batch() {
    let (_dir, store) = temp_store();
    let german = create_german(&store);
    let broken = LegacyPage::new(&store, "Broken", "standard")
        .language(german.id)
        .with_page(|p| p.cells.push(CellId(u64::MAX - 1)))
        .insert(&store);
    let fine = store
        .create_page(
            &NewPage::new("Fine", "standard").in_language(&german),
            &Layouts::none(),
        )
        .unwrap();
    store
        .create_element(ElementScope::Page(fine.id), "text")
        .unwrap();

    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let report = Seeder::new(&store, &config, &layouts).upgrade();

    assert!(!report.is_success());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Errors creating cell maincontent on page Broken"));
    assert!(report.render().contains("WARNING! Some records could not be upgraded:"));

    let cells = store.cells_of(fine.id).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(store.cell_elements(cells[0].id).unwrap().len(), 1);
    assert_eq!(store.require_page(broken.id).unwrap().cells.len(), 1);
}
