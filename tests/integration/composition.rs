//! Cells, elements and contents on a stored page

use crate::integration::test_utils::{create_german, element_names, positions, temp_store};
use pagetree::composition::ElementScope;
use pagetree::error::{CmsError, StorageError};
use pagetree::essence::{Essence, EssenceKind, EssenceValue};
use pagetree::layouts::Layouts;
use pagetree::page::{NewPage, Page};
use pagetree::schema;
use pagetree::store::Store;

fn page(store: &Store) -> Page {
    let german = create_german(store);
    store
        .create_page(
            &NewPage::new("Produkte", "standard").in_language(&german),
            &Layouts::none(),
        )
        .unwrap()
}

#[test]
fn test_default_essence_is_text() {
    assert_eq!(EssenceKind::default(), EssenceKind::Text);
    let value = EssenceValue::empty(EssenceKind::default());
    assert_eq!(value.kind(), EssenceKind::Text);
    assert_eq!(value.ingredient_column(), "body");
}

#[test]
fn test_group_then_delete_cell_returns_elements() {
    let (_dir, store) = temp_store();
    let page = page(&store);
    for name in ["headline", "text", "teaser", "text"] {
        store
            .create_element(ElementScope::Page(page.id), name)
            .unwrap();
    }
    let main = store.create_cell(page.id, "main").unwrap();

    let moved = store
        .group_elements_into_cell(main.id, |e| e.name == "text")
        .unwrap();
    assert_eq!(moved.len(), 2);

    let grouped = store.cell_elements(main.id).unwrap();
    assert_eq!(element_names(&grouped), vec!["text", "text"]);
    assert_eq!(positions(&grouped), vec![1, 2]);
    assert!(grouped.iter().all(|e| e.cell_id == Some(main.id)));
    let rest = store.ungrouped_elements(page.id).unwrap();
    assert_eq!(element_names(&rest), vec!["headline", "teaser"]);
    assert_eq!(positions(&rest), vec![1, 2]);

    store.delete_cell(main.id).unwrap();
    assert!(store.cell(main.id).unwrap().is_none());
    assert!(store.cells_of(page.id).unwrap().is_empty());
    let back = store.ungrouped_elements(page.id).unwrap();
    assert_eq!(element_names(&back), vec!["headline", "teaser", "text", "text"]);
    assert_eq!(positions(&back), vec![1, 2, 3, 4]);
    assert!(back.iter().all(|e| e.cell_id.is_none()));
}

#[test]
fn test_move_between_cells_renumbers_both_sides() {
    let (_dir, store) = temp_store();
    let page = page(&store);
    let main = store.create_cell(page.id, "main").unwrap();
    let side = store.create_cell(page.id, "side").unwrap();
    let a = store.create_element(ElementScope::Cell(main.id), "a").unwrap();
    store.create_element(ElementScope::Cell(main.id), "b").unwrap();
    store.create_element(ElementScope::Cell(side.id), "x").unwrap();

    let moved = store
        .move_element(a.id, ElementScope::Cell(side.id), Some(99))
        .unwrap();
    assert_eq!(moved.position, 2);
    assert_eq!(moved.cell_id, Some(side.id));

    let main_elements = store.cell_elements(main.id).unwrap();
    assert_eq!(element_names(&main_elements), vec!["b"]);
    assert_eq!(positions(&main_elements), vec![1]);
    let side_elements = store.cell_elements(side.id).unwrap();
    assert_eq!(element_names(&side_elements), vec!["x", "a"]);
    assert_eq!(positions(&side_elements), vec![1, 2]);

    let report = schema::verify(&store).unwrap();
    assert!(report.is_clean(), "{:?}", report.problems);
}

#[test]
fn test_delete_element_removes_contents_and_essences() {
    let (_dir, store) = temp_store();
    let page = page(&store);
    let element = store
        .create_element(ElementScope::Page(page.id), "gallery")
        .unwrap();
    let keep = store
        .create_element(ElementScope::Page(page.id), "footer")
        .unwrap();
    let mut picture = EssenceValue::empty(EssenceKind::Picture);
    picture.set_value("picture_id", "7").unwrap();
    let (content, essence) = store.create_content(element.id, "image", picture).unwrap();
    store
        .create_content(element.id, "caption", EssenceValue::empty(EssenceKind::Text))
        .unwrap();

    store.delete_element(element.id).unwrap();

    assert!(store.element(element.id).unwrap().is_none());
    assert!(store.content(content.id).unwrap().is_none());
    assert!(store.essence(essence.essence_ref()).unwrap().is_none());
    assert!(store.content_for_essence(essence.essence_ref()).unwrap().is_none());
    assert!(store.essences_for_picture(7).unwrap().is_empty());
    assert_eq!(store.require_element(keep.id).unwrap().position, 1);
}

#[test]
fn test_content_positions_close_after_delete() {
    let (_dir, store) = temp_store();
    let page = page(&store);
    let element = store
        .create_element(ElementScope::Page(page.id), "article")
        .unwrap();
    let mut created = Vec::new();
    for name in ["title", "body", "link"] {
        let (content, _) = store
            .create_content(element.id, name, EssenceValue::empty(EssenceKind::Text))
            .unwrap();
        created.push(content);
    }

    store.delete_content(created[0].id).unwrap();
    let rest = store.contents_of(element.id).unwrap();
    let names: Vec<&str> = rest.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["body", "link"]);
    assert_eq!(rest.iter().map(|c| c.position).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_owned_essence_cannot_be_attached_again() {
    let (_dir, store) = temp_store();
    let page = page(&store);
    let first = store
        .create_element(ElementScope::Page(page.id), "first")
        .unwrap();
    let second = store
        .create_element(ElementScope::Page(page.id), "second")
        .unwrap();
    let loose = store
        .create_essence(EssenceValue::empty(EssenceKind::Boolean))
        .unwrap();

    let content = store
        .attach_existing_essence(first.id, "flag", loose.essence_ref())
        .unwrap();
    let err = store
        .attach_existing_essence(second.id, "flag", loose.essence_ref())
        .unwrap_err();
    assert!(matches!(
        err,
        CmsError::Storage(StorageError::UniqueViolation { .. })
    ));
    assert!(store.contents_of(second.id).unwrap().is_empty());
    assert_eq!(
        store
            .content_for_essence(loose.essence_ref())
            .unwrap()
            .map(|c| c.id),
        Some(content.id)
    );
}

#[test]
fn test_blank_names_are_rejected() {
    let (_dir, store) = temp_store();
    let page = page(&store);
    assert!(matches!(
        store.create_cell(page.id, " ").unwrap_err(),
        CmsError::Validation(_)
    ));
    assert!(matches!(
        store
            .create_element(ElementScope::Page(page.id), "")
            .unwrap_err(),
        CmsError::Validation(_)
    ));
}
