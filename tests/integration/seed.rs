//! Seeder behavior against a real on-disk store

use crate::integration::test_utils::temp_store;
use pagetree::config::CmsConfig;
use pagetree::layouts::{Layouts, PageLayoutDef};
use pagetree::schema;
use pagetree::seeder::{Seeder, SUCCESS_LINE, WARNING_HEADER};

fn layout(name: &str) -> PageLayoutDef {
    PageLayoutDef {
        name: name.to_string(),
        cells: vec![],
        elements: vec![],
        layoutpage: false,
    }
}

#[test]
fn test_seed_twice_creates_nothing_new() {
    let (_dir, store) = temp_store();
    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let seeder = Seeder::new(&store, &config, &layouts);

    let first = seeder.seed();
    let languages = store.languages().unwrap().len();
    let pages = store.pages().unwrap().len();

    let second = seeder.seed();
    assert_eq!(store.languages().unwrap().len(), languages);
    assert_eq!(store.pages().unwrap().len(), pages);
    assert!(second.created.is_empty());
    assert!(second.errors.is_empty());
    assert_eq!(second.notices.len(), 3);
    assert_eq!(first.root, second.root);
    assert_eq!(first.frontpage, second.frontpage);
    assert_eq!(second.lines()[0], SUCCESS_LINE);
}

#[test]
fn test_root_has_no_language_and_holds_frontpage() {
    let (_dir, store) = temp_store();
    let config = CmsConfig::default();
    let layouts = Layouts::none();
    let report = Seeder::new(&store, &config, &layouts).seed();
    assert!(report.attached);

    let root = store.root_page().unwrap().unwrap();
    assert_eq!(root.name, "Root");
    assert_eq!(root.page_layout, "rootpage");
    assert!(root.language.is_none());
    assert!(root.do_not_autogenerate && root.do_not_sweep);

    let language = store.default_language().unwrap().unwrap();
    let frontpage = store.language_root_for(language.id).unwrap().unwrap();
    assert_eq!(frontpage.name, config.default_language.frontpage_name);
    assert_eq!(frontpage.page_layout, config.default_language.page_layout);
    assert_eq!(frontpage.language, Some(language.id));
    assert!(frontpage.is_language_root);
    assert_eq!(frontpage.parent, Some(root.id));
    assert_eq!(root.children, vec![frontpage.id]);
}

#[test]
fn test_frontpage_failure_is_reported_and_not_attached() {
    let (_dir, store) = temp_store();
    let config = CmsConfig::default();
    let layouts = Layouts::new(Some(vec![layout("standard")]), None);
    let report = Seeder::new(&store, &config, &layouts).seed();

    assert_eq!(
        report.lines(),
        vec![
            "== Created language English".to_string(),
            "== Created page Root".to_string(),
            WARNING_HEADER.to_string(),
            "Errors creating page Index: Page layout 'index' is not defined".to_string(),
            SUCCESS_LINE.to_string(),
        ]
    );
    assert!(!report.attached);
    let root = store.root_page().unwrap().unwrap();
    assert!(root.children.is_empty());
    assert_eq!(store.pages().unwrap().len(), 1);
}

#[test]
fn test_invalid_language_config_blocks_frontpage() {
    let (_dir, store) = temp_store();
    let mut config = CmsConfig::default();
    config.default_language.code = "EN".to_string();
    let layouts = Layouts::none();
    let report = Seeder::new(&store, &config, &layouts).seed();

    assert_eq!(
        report.errors,
        vec![
            "Errors creating language English: Code 'EN' is not a valid language code".to_string(),
            "Errors creating page Index: Language can't be blank".to_string(),
        ]
    );
    assert!(report.language.is_none());
    assert!(report.root.is_some());
    assert!(!report.attached);
    assert!(store.languages().unwrap().is_empty());
}

#[test]
fn test_seed_uses_configured_language() {
    let (_dir, store) = temp_store();
    let mut config = CmsConfig::default();
    config.default_language.name = "Deutsch".to_string();
    config.default_language.code = "de".to_string();
    config.default_language.frontpage_name = "Startseite".to_string();
    config.default_language.page_layout = "start".to_string();
    let layouts = Layouts::new(Some(vec![layout("start")]), None);

    let report = Seeder::new(&store, &config, &layouts).seed();
    assert!(report.is_success());
    assert_eq!(report.created[0], "== Created language Deutsch");
    assert_eq!(report.created[2], "== Created page Startseite");

    let language = store.find_language_by_code("de").unwrap().unwrap();
    assert!(language.is_default);
    assert!(language.is_public);
}

#[test]
fn test_seeded_store_verifies_clean() {
    let (_dir, store) = temp_store();
    let config = CmsConfig::default();
    let layouts = Layouts::none();
    Seeder::new(&store, &config, &layouts).seed();
    schema::migrate(&store).unwrap();
    let report = schema::verify(&store).unwrap();
    assert!(report.is_clean(), "{:?}", report.problems);
}
