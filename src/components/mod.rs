mod pagination;
mod table;
mod table_state;

#[cfg(test)]
mod test_state_logic;

pub use pagination::{PageNode, PaginationPlan};
pub use table::{
    ActionTone, CellValue, Column, ColumnKey, RowAction, RowRecord, TableSnapshot, TableView,
};
pub use table_state::{
    PageWindow, SortDirection, SortState, TableQuery, on_header_click, on_page_change,
    on_search_change, resolve_window,
};
