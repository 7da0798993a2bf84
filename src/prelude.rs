pub use crate::api::{ApiError, ApiFailure, Role, SessionContext, SessionSnapshot, SubmitResponse};
pub use crate::components::{
    ActionTone, CellValue, Column, ColumnKey, PageNode, PaginationPlan, RowAction, RowRecord,
    SortDirection, SortState, TableQuery, TableSnapshot, TableView, on_header_click,
    on_page_change, on_search_change,
};
pub use crate::feedback::{ToastEntry, ToastKind, ToastManager, ToastPosition, ToastViewport};
pub use crate::form::{
    FieldInput, FieldKey, FieldMap, FieldRules, FieldValue, FormController, FormDraftStore,
    FormError, FormOptions, FormResult, FormSnapshot, InMemoryDraftStore, RuleSet, SubmitOutcome,
    SubmitState, ValidationMode, ValidationReport, field_map_to_json,
};
