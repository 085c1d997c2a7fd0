//! Page tree: languages, roots and re-parenting

use crate::integration::test_utils::{create_german, german, temp_store};
use pagetree::error::{CmsError, TreeError};
use pagetree::language::{Language, NewLanguage};
use pagetree::layouts::Layouts;
use pagetree::page::{NewPage, NewRootPage, Page};
use pagetree::schema;
use pagetree::store::Store;
use pagetree::types::PageId;
use std::sync::{Arc, Barrier};
use std::thread;

fn child(store: &Store, language: &Language, name: &str, parent: PageId) -> Page {
    store
        .create_page(
            &NewPage::new(name, "standard")
                .in_language(language)
                .below(parent),
            &Layouts::none(),
        )
        .unwrap()
}

fn ids(pages: &[Page]) -> Vec<PageId> {
    pages.iter().map(|p| p.id).collect()
}

#[test]
fn test_attach_moves_whole_subtree() {
    let (_dir, store) = temp_store();
    let german = create_german(&store);
    let (front, _) = store
        .find_or_create_frontpage(&german, &Layouts::none())
        .unwrap();
    let produkte = child(&store, &german, "Produkte", front.id);
    let schuhe = child(&store, &german, "Schuhe", produkte.id);
    let stiefel = child(&store, &german, "Stiefel", schuhe.id);
    let archiv = child(&store, &german, "Archiv", front.id);

    store.attach(schuhe.id, archiv.id).unwrap();

    assert!(store.require_page(produkte.id).unwrap().children.is_empty());
    assert_eq!(store.require_page(archiv.id).unwrap().children, vec![schuhe.id]);
    assert_eq!(
        ids(&store.descendants(archiv.id).unwrap()),
        vec![schuhe.id, stiefel.id]
    );
    assert_eq!(
        ids(&store.ancestors(stiefel.id).unwrap()),
        vec![schuhe.id, archiv.id, front.id]
    );
    assert_eq!(
        store.language_root_of(&stiefel).unwrap().map(|p| p.id),
        Some(front.id)
    );

    let report = schema::verify(&store).unwrap();
    assert!(report.is_clean(), "{:?}", report.problems);
}

#[test]
fn test_attach_rejects_self_and_descendants() {
    let (_dir, store) = temp_store();
    let german = create_german(&store);
    let (front, _) = store
        .find_or_create_frontpage(&german, &Layouts::none())
        .unwrap();
    let a = child(&store, &german, "a", front.id);
    let b = child(&store, &german, "b", a.id);

    for (moved, target) in [(a.id, a.id), (a.id, b.id), (front.id, b.id)] {
        let err = store.attach(moved, target).unwrap_err();
        assert!(
            matches!(err, CmsError::Tree(TreeError::Cycle { .. })),
            "{moved} -> {target}: {err}"
        );
    }
    assert_eq!(store.require_page(a.id).unwrap().parent, Some(front.id));
    assert_eq!(store.require_page(b.id).unwrap().parent, Some(a.id));
}

#[test]
fn test_root_stays_put() {
    let (_dir, store) = temp_store();
    let german = create_german(&store);
    let root = store.create_root_page(&NewRootPage::default()).unwrap();
    let (front, _) = store
        .find_or_create_frontpage(&german, &Layouts::none())
        .unwrap();
    store.attach(front.id, root.id).unwrap();

    let err = store.attach(root.id, front.id).unwrap_err();
    assert!(matches!(err, CmsError::Tree(TreeError::RootMove(_))));
    assert!(store.require_page(root.id).unwrap().parent.is_none());
}

#[test]
fn test_attach_to_current_parent_keeps_child_order() {
    let (_dir, store) = temp_store();
    let german = create_german(&store);
    let (front, _) = store
        .find_or_create_frontpage(&german, &Layouts::none())
        .unwrap();
    let a = child(&store, &german, "a", front.id);
    let b = child(&store, &german, "b", front.id);

    store.attach(a.id, front.id).unwrap();
    assert_eq!(store.require_page(front.id).unwrap().children, vec![a.id, b.id]);
}

#[test]
fn test_duplicate_language_code_is_rejected() {
    let (_dir, store) = temp_store();
    create_german(&store);
    let err = store.create_language(&german()).unwrap_err();
    match err {
        CmsError::Validation(e) => {
            assert_eq!(e.messages, vec!["Code 'de' has already been taken".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.languages().unwrap().len(), 1);
}

#[test]
fn test_new_default_language_demotes_previous() {
    let (_dir, store) = temp_store();
    let mut first = german();
    first.is_default = true;
    let first = store.create_language(&first).unwrap();

    let english = store
        .create_language(&NewLanguage {
            code: "en".to_string(),
            name: "English".to_string(),
            frontpage_name: "Index".to_string(),
            page_layout: "index".to_string(),
            is_default: true,
            is_public: true,
        })
        .unwrap();

    assert_eq!(store.default_language().unwrap().unwrap().id, english.id);
    assert!(!store.language(first.id).unwrap().unwrap().is_default);
    let defaults = store
        .languages()
        .unwrap()
        .into_iter()
        .filter(|l| l.is_default)
        .count();
    assert_eq!(defaults, 1);
}

#[test]
fn test_concurrent_language_creation_has_one_winner() {
    let (_dir, store) = temp_store();
    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.create_language(&german()).is_ok()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(store.languages().unwrap().len(), 1);
}

#[test]
fn test_second_language_root_is_rejected() {
    let (_dir, store) = temp_store();
    let german = create_german(&store);
    store
        .find_or_create_frontpage(&german, &Layouts::none())
        .unwrap();

    let mut other = NewPage::frontpage(&german);
    other.name = "Zweite Startseite".to_string();
    let err = store.create_page(&other, &Layouts::none()).unwrap_err();
    assert!(matches!(err, CmsError::Validation(_)));
    assert_eq!(store.pages().unwrap().len(), 1);
}

#[test]
fn test_page_needs_a_stored_language() {
    let (_dir, store) = temp_store();
    let err = store
        .create_page(&NewPage::new("Lost", "standard"), &Layouts::none())
        .unwrap_err();
    assert!(err.to_string().contains("Language can't be blank"));
}
