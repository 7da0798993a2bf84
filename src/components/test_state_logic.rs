use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::pagination::{PageNode, PaginationPlan};
use super::table::{ActionTone, CellValue, Column, RowAction, RowRecord, TableView};
use super::table_state::{
    self, SortDirection, TableQuery, on_header_click, on_page_change, on_search_change,
};

fn row(pairs: &[(&str, CellValue)]) -> RowRecord {
    pairs
        .iter()
        .map(|(key, value)| ((*key).into(), value.clone()))
        .collect()
}

fn inventory_rows() -> Vec<RowRecord> {
    vec![
        row(&[
            ("id", 1i64.into()),
            ("name", "Silk Scarf".into()),
            ("price", Decimal::new(18_000, 2).into()),
        ]),
        row(&[
            ("id", 2i64.into()),
            ("name", "Calf Tote".into()),
            ("price", Decimal::new(95_000, 2).into()),
        ]),
        row(&[
            ("id", 3i64.into()),
            ("name", "Calf Wallet".into()),
            ("price", Decimal::new(32_000, 2).into()),
        ]),
        row(&[
            ("id", 4i64.into()),
            ("name", "Gold Brooch".into()),
            ("price", Decimal::new(210_000, 2).into()),
        ]),
        row(&[
            ("id", 5i64.into()),
            ("name", "Calf Belt".into()),
            ("price", Decimal::new(21_000, 2).into()),
        ]),
    ]
}

fn id_of(record: &RowRecord) -> i64 {
    match record.get("id").expect("id cell") {
        CellValue::Number(value) => value.to_i64().expect("id fits"),
        other => panic!("unexpected id cell: {other:?}"),
    }
}

#[test]
fn sort_is_stable_across_equal_keys() {
    let table = TableView::new()
        .column(Column::new("id", "ID"))
        .column(Column::new("n", "Name"))
        .rows(vec![
            row(&[("id", 1i64.into()), ("n", "B".into())]),
            row(&[("id", 2i64.into()), ("n", "A".into())]),
            row(&[("id", 3i64.into()), ("n", "A".into())]),
        ]);

    let mut query = TableQuery::new();
    on_header_click(&mut query, "n");
    let snapshot = table.resolve(&query);
    let ids: Vec<i64> = snapshot.rows.iter().map(|record| id_of(record)).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn header_click_cycles_ascending_descending_cleared() {
    let mut query = TableQuery::new();

    on_header_click(&mut query, "price");
    let sort = query.sort.clone().expect("first click activates sort");
    assert_eq!(sort.direction, SortDirection::Ascending);

    on_header_click(&mut query, "price");
    let sort = query.sort.clone().expect("second click flips direction");
    assert_eq!(sort.direction, SortDirection::Descending);

    on_header_click(&mut query, "price");
    assert!(query.sort.is_none(), "third click clears the sort");

    on_header_click(&mut query, "price");
    on_header_click(&mut query, "name");
    let sort = query.sort.expect("switching columns restarts ascending");
    assert_eq!(sort.column.as_str(), "name");
    assert_eq!(sort.direction, SortDirection::Ascending);
}

#[test]
fn search_applies_before_pagination() {
    let table = TableView::new()
        .column(Column::new("name", "Name"))
        .rows(inventory_rows())
        .page_size(2);

    let mut query = TableQuery::new();
    on_search_change(&mut query, "calf");
    on_page_change(&mut query, 2);

    let snapshot = table.resolve(&query);
    assert_eq!(snapshot.total_matching, 3);
    assert_eq!(snapshot.page_count, 2);
    assert_eq!(snapshot.rows.len(), 1, "page 2 holds the lone remainder");
    assert_eq!(id_of(snapshot.rows[0]), 5);
}

#[test]
fn zero_matches_render_the_empty_state_not_pages() {
    let table = TableView::new()
        .column(Column::new("name", "Name"))
        .rows(inventory_rows());

    let mut query = TableQuery::new();
    on_search_change(&mut query, "no such product");

    let snapshot = table.resolve(&query);
    assert!(snapshot.is_empty);
    assert_eq!(snapshot.page_count, 1);
    assert_eq!(snapshot.rows.len(), 0);
    assert_eq!(snapshot.empty_message, "No data available");
    assert!(snapshot.pagination.page_numbers().is_empty());
    assert!(!snapshot.pagination.prev_enabled);
    assert!(!snapshot.pagination.next_enabled);
}

#[test]
fn page_is_clamped_when_filtering_shrinks_the_set() {
    let table = TableView::new()
        .column(Column::new("name", "Name"))
        .rows(inventory_rows())
        .page_size(2);

    let mut query = TableQuery::new();
    query.page = 3;
    query.search = "calf".to_string();

    let snapshot = table.resolve(&query);
    assert_eq!(snapshot.page, 2, "page 3 collapses onto the last real page");
    assert_eq!(snapshot.rows.len(), 1);
}

#[test]
fn search_matches_any_field_case_insensitively() {
    let table = TableView::new()
        .column(Column::new("name", "Name"))
        .column(Column::new("price", "Price"))
        .rows(inventory_rows());

    let mut query = TableQuery::new();
    on_search_change(&mut query, "2100");
    let snapshot = table.resolve(&query);
    assert_eq!(snapshot.total_matching, 1);
    assert_eq!(id_of(snapshot.rows[0]), 4);

    on_search_change(&mut query, "SILK");
    let snapshot = table.resolve(&query);
    assert_eq!(snapshot.total_matching, 1);
    assert_eq!(id_of(snapshot.rows[0]), 1);
}

#[test]
fn custom_render_changes_display_but_not_search() {
    let table = TableView::new()
        .column(
            Column::new("price", "Price")
                .render(|value, _| format!("${}", value.display())),
        )
        .rows(vec![row(&[("price", Decimal::new(18_000, 2).into())])]);

    let record = table.resolve(&TableQuery::new()).rows[0];
    assert_eq!(table.cell_text(record, "price"), "$180.00");

    // The filter sees the raw value, not the rendered one.
    let mut query = TableQuery::new();
    on_search_change(&mut query, "$180");
    assert_eq!(table.resolve(&query).total_matching, 0);
}

#[test]
fn sort_respects_per_column_and_global_gates() {
    let rows = vec![
        row(&[("name", "B".into()), ("note", "z".into())]),
        row(&[("name", "A".into()), ("note", "a".into())]),
    ];

    let unsortable_column = TableView::new()
        .column(Column::new("note", "Note").sortable(false))
        .rows(rows.clone());
    let mut query = TableQuery::new();
    on_header_click(&mut query, "note");
    let snapshot = unsortable_column.resolve(&query);
    assert_eq!(snapshot.rows[0].get("name"), Some(&"B".into()));

    let sorting_disabled = TableView::new()
        .column(Column::new("name", "Name"))
        .rows(rows)
        .sort_enabled(false);
    let mut query = TableQuery::new();
    on_header_click(&mut query, "name");
    let snapshot = sorting_disabled.resolve(&query);
    assert_eq!(snapshot.rows[0].get("name"), Some(&"B".into()));
}

#[test]
fn row_actions_receive_the_activated_row() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let table = TableView::new()
        .column(Column::new("name", "Name"))
        .rows(inventory_rows())
        .action(
            RowAction::new("Suspend", move |record| {
                assert_eq!(id_of(record), 2);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .tone(ActionTone::Danger)
            .icon("ban"),
        );

    let mut query = TableQuery::new();
    on_search_change(&mut query, "tote");
    let snapshot = table.resolve(&query);
    let action = &table.actions_for_rows()[0];
    assert_eq!(action.label(), "Suspend");
    action.activate(snapshot.rows[0]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn window_math_clamps_and_sizes_pages() {
    let window = table_state::resolve_window(5, 2, 1);
    assert_eq!((window.page_count, window.start, window.len), (3, 0, 2));

    let last = table_state::resolve_window(5, 2, 3);
    assert_eq!((last.start, last.len), (4, 1));

    let clamped = table_state::resolve_window(5, 2, 99);
    assert_eq!(clamped.page, 3);

    let empty = table_state::resolve_window(0, 2, 1);
    assert_eq!((empty.page_count, empty.page, empty.len), (1, 1, 0));
}

#[test]
fn pagination_plan_disables_arrows_at_the_edges() {
    let first = PaginationPlan::resolve(4, 1);
    assert!(!first.prev_enabled);
    assert!(first.next_enabled);
    assert_eq!(first.next_target, 2);

    let last = PaginationPlan::resolve(4, 4);
    assert!(last.prev_enabled);
    assert!(!last.next_enabled);
    assert_eq!(last.prev_target, 3);

    assert_eq!(first.page_numbers(), vec![1, 2, 3, 4]);
}

#[test]
fn pagination_plan_windows_large_page_counts() {
    let plan = PaginationPlan::resolve(20, 10);
    assert_eq!(plan.page_numbers(), vec![1, 9, 10, 11, 20]);
    let ellipses = plan
        .nodes
        .iter()
        .filter(|node| matches!(node, PageNode::Ellipsis))
        .count();
    assert_eq!(ellipses, 2);

    let small = PaginationPlan::resolve(7, 4);
    assert_eq!(small.page_numbers(), vec![1, 2, 3, 4, 5, 6, 7]);
}
