use super::table::ColumnKey;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortState {
    pub column: ColumnKey,
    pub direction: SortDirection,
}

/// Caller-side view state for one table: 1-indexed page, free-text search,
/// and the active sort. Every table instance owns its own query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableQuery {
    pub page: usize,
    pub search: String,
    pub sort: Option<SortState>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
            sort: None,
        }
    }
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Header-click cycle: inactive column becomes ascending, ascending flips to
/// descending, and a third click clears the sort entirely. Any change jumps
/// back to the first page.
pub fn on_header_click(query: &mut TableQuery, key: impl Into<ColumnKey>) {
    let key = key.into();
    query.page = 1;
    query.sort = match query.sort.take() {
        Some(active) if active.column == key => match active.direction {
            SortDirection::Ascending => Some(SortState {
                column: key,
                direction: SortDirection::Descending,
            }),
            SortDirection::Descending => None,
        },
        _ => Some(SortState {
            column: key,
            direction: SortDirection::Ascending,
        }),
    };
}

pub fn on_search_change(query: &mut TableQuery, term: impl Into<String>) {
    query.search = term.into();
    query.page = 1;
}

pub fn on_page_change(query: &mut TableQuery, page: usize) {
    query.page = page.max(1);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageWindow {
    pub total_rows: usize,
    pub page_count: usize,
    pub page: usize,
    pub start: usize,
    pub len: usize,
}

/// Clamp the requested page into the filtered result and compute the visible
/// slice. An empty result still counts as one page so the empty-state row
/// has somewhere to render.
pub fn resolve_window(total_rows: usize, page_size: usize, requested_page: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let page_count = total_rows.div_ceil(page_size).max(1);
    let page = requested_page.clamp(1, page_count);
    let start = (page - 1) * page_size;
    let len = page_size.min(total_rows.saturating_sub(start));
    PageWindow {
        total_rows,
        page_count,
        page,
        start,
        len,
    }
}
