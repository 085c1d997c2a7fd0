//! Property tests: element positions stay contiguous under arbitrary edits

use crate::integration::test_utils::create_german;
use pagetree::composition::ElementScope;
use pagetree::layouts::Layouts;
use pagetree::page::NewPage;
use pagetree::schema;
use pagetree::store::Store;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create { container: usize },
    Move { element: usize, container: usize, position: Option<u32> },
    Delete { element: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3).prop_map(|container| Op::Create { container }),
        (0usize..16, 0usize..3, proptest::option::of(0u32..6)).prop_map(
            |(element, container, position)| Op::Move {
                element,
                container,
                position,
            }
        ),
        (0usize..16).prop_map(|element| Op::Delete { element }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_positions_stay_contiguous(ops in proptest::collection::vec(op(), 1..24)) {
        let store = Store::temporary().unwrap();
        let german = create_german(&store);
        let page = store
            .create_page(
                &NewPage::new("Produkte", "standard").in_language(&german),
                &Layouts::none(),
            )
            .unwrap();
        let main = store.create_cell(page.id, "main").unwrap();
        let side = store.create_cell(page.id, "side").unwrap();
        let containers = [
            ElementScope::Page(page.id),
            ElementScope::Cell(main.id),
            ElementScope::Cell(side.id),
        ];

        let mut live = Vec::new();
        for op in ops {
            match op {
                Op::Create { container } => {
                    let element = store
                        .create_element(containers[container], "text")
                        .unwrap();
                    live.push(element.id);
                }
                Op::Move { element, container, position } if !live.is_empty() => {
                    let id = live[element % live.len()];
                    store.move_element(id, containers[container], position).unwrap();
                }
                Op::Delete { element } if !live.is_empty() => {
                    let id = live.remove(element % live.len());
                    store.delete_element(id).unwrap();
                }
                _ => {}
            }
        }

        let mut total = 0;
        for scope in containers {
            let elements = match scope {
                ElementScope::Page(id) => store.ungrouped_elements(id).unwrap(),
                ElementScope::Cell(id) => store.cell_elements(id).unwrap(),
            };
            let positions: Vec<u32> = elements.iter().map(|e| e.position).collect();
            let expected: Vec<u32> = (1..=elements.len() as u32).collect();
            prop_assert_eq!(positions, expected);
            total += elements.len();
        }
        prop_assert_eq!(total, live.len());

        let report = schema::verify(&store).unwrap();
        prop_assert!(report.is_clean(), "{:?}", report.problems);
    }
}
