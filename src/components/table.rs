use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rust_decimal::Decimal;

use super::pagination::PaginationPlan;
use super::table_state::{self, SortDirection, TableQuery};

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Cheap-clone name of one table column ("sku", "price", "status", ...).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ColumnKey(Arc<str>);

impl ColumnKey {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ColumnKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ColumnKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColumnKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ColumnKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One cell of an opaque row record. The table never mutates these.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(Decimal),
    Flag(bool),
    Empty,
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Flag(value) => value.to_string(),
            Self::Empty => String::new(),
        }
    }

    /// Default relational comparison: like types compare natively, missing
    /// cells sort first, and mixed types fall back to their string forms.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(left), Self::Number(right)) => left.cmp(right),
            (Self::Flag(left), Self::Flag(right)) => left.cmp(right),
            (Self::Empty, Self::Empty) => Ordering::Equal,
            (Self::Empty, _) => Ordering::Less,
            (_, Self::Empty) => Ordering::Greater,
            (left, right) => left.display().cmp(&right.display()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

pub type RowRecord = BTreeMap<ColumnKey, CellValue>;

type CellRenderer = Arc<dyn Fn(&CellValue, &RowRecord) -> String + Send + Sync>;

/// Static metadata for one column: label, sortability, and an optional
/// custom render of the raw value.
#[derive(Clone)]
pub struct Column {
    pub(super) key: ColumnKey,
    pub(super) label: String,
    pub(super) sortable: bool,
    pub(super) render: Option<CellRenderer>,
}

impl Column {
    pub fn new(key: impl Into<ColumnKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            render: None,
        }
    }

    pub fn sortable(mut self, value: bool) -> Self {
        self.sortable = value;
        self
    }

    pub fn render(
        mut self,
        render: impl Fn(&CellValue, &RowRecord) -> String + Send + Sync + 'static,
    ) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn key(&self) -> &ColumnKey {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionTone {
    Neutral,
    Primary,
    Danger,
}

type ActivateHandler = Arc<dyn Fn(&RowRecord) + Send + Sync>;

/// Per-row action button ("Edit", "Suspend", "Delete", ...).
#[derive(Clone)]
pub struct RowAction {
    pub(super) label: String,
    pub(super) icon: Option<String>,
    pub(super) tone: ActionTone,
    pub(super) on_activate: ActivateHandler,
}

impl RowAction {
    pub fn new(label: impl Into<String>, handler: impl Fn(&RowRecord) + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            icon: None,
            tone: ActionTone::Neutral,
            on_activate: Arc::new(handler),
        }
    }

    pub fn icon(mut self, value: impl Into<String>) -> Self {
        self.icon = Some(value.into());
        self
    }

    pub fn tone(mut self, value: ActionTone) -> Self {
        self.tone = value;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn activate(&self, row: &RowRecord) {
        (self.on_activate)(row)
    }
}

/// Searchable, sortable, paginated view over an arbitrary homogeneous row
/// set. The caller keeps a `TableQuery` and calls `resolve` on every render.
pub struct TableView {
    columns: Vec<Column>,
    rows: Vec<RowRecord>,
    actions: Vec<RowAction>,
    page_size: usize,
    search_enabled: bool,
    sort_enabled: bool,
    empty_message: String,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

impl TableView {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            actions: Vec::new(),
            page_size: 10,
            search_enabled: true,
            sort_enabled: true,
            empty_message: "No data available".to_string(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = RowRecord>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn row(mut self, row: RowRecord) -> Self {
        self.rows.push(row);
        self
    }

    pub fn action(mut self, action: RowAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn page_size(mut self, value: usize) -> Self {
        self.page_size = value.max(1);
        self
    }

    pub fn search_enabled(mut self, value: bool) -> Self {
        self.search_enabled = value;
        self
    }

    pub fn sort_enabled(mut self, value: bool) -> Self {
        self.sort_enabled = value;
        self
    }

    pub fn empty_message(mut self, value: impl Into<String>) -> Self {
        self.empty_message = value.into();
        self
    }

    pub fn column_specs(&self) -> &[Column] {
        &self.columns
    }

    pub fn actions_for_rows(&self) -> &[RowAction] {
        &self.actions
    }

    /// Displayed text for one cell, through the column's custom render when
    /// it has one.
    pub fn cell_text(&self, row: &RowRecord, key: impl Borrow<str>) -> String {
        let key = key.borrow();
        let value = row.get(key).unwrap_or(&EMPTY_CELL);
        let render = self
            .columns
            .iter()
            .find(|column| column.key.as_str() == key)
            .and_then(|column| column.render.as_ref());
        match render {
            Some(render) => render(value, row),
            None => value.display(),
        }
    }

    /// Sort, then filter, then paginate — always in that order — and hand
    /// back the visible slice with its pagination plan.
    pub fn resolve(&self, query: &TableQuery) -> TableSnapshot<'_> {
        let mut visible: Vec<&RowRecord> = self.rows.iter().collect();

        if let Some(sort) = query.sort.as_ref() {
            if self.sort_enabled && self.column_is_sortable(&sort.column) {
                let key = &sort.column;
                let direction = sort.direction;
                // Vec::sort_by is stable: ties keep their source order.
                visible.sort_by(|left, right| {
                    let ordering = left
                        .get(key.as_str())
                        .unwrap_or(&EMPTY_CELL)
                        .compare(right.get(key.as_str()).unwrap_or(&EMPTY_CELL));
                    match direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                });
            }
        }

        if self.search_enabled {
            let needle = query.search.trim().to_lowercase();
            if !needle.is_empty() {
                // Naive search-everything filter over raw values, not
                // custom renders.
                visible.retain(|row| {
                    row.values()
                        .any(|value| value.display().to_lowercase().contains(&needle))
                });
            }
        }

        let window = table_state::resolve_window(visible.len(), self.page_size, query.page);
        let rows: Vec<&RowRecord> = visible
            .into_iter()
            .skip(window.start)
            .take(window.len)
            .collect();

        let is_empty = window.total_rows == 0;
        let pagination = if is_empty {
            PaginationPlan::empty()
        } else {
            PaginationPlan::resolve(window.page_count, window.page)
        };

        TableSnapshot {
            rows,
            page: window.page,
            page_count: window.page_count,
            total_matching: window.total_rows,
            is_empty,
            pagination,
            empty_message: &self.empty_message,
        }
    }

    fn column_is_sortable(&self, key: &ColumnKey) -> bool {
        self.columns
            .iter()
            .find(|column| &column.key == key)
            .is_some_and(|column| column.sortable)
    }
}

/// The visible page after one pass through the pipeline.
pub struct TableSnapshot<'a> {
    pub rows: Vec<&'a RowRecord>,
    pub page: usize,
    pub page_count: usize,
    pub total_matching: usize,
    pub is_empty: bool,
    pub pagination: PaginationPlan,
    pub empty_message: &'a str,
}
