mod binding;
mod controller;
mod draft;
mod rules;
mod validation;


pub use binding::FieldInput;
pub use controller::{
    FieldKey, FieldMap, FieldValue, FormController, FormError, FormId, FormOptions, FormResult,
    FormSnapshot, SubmitOutcome, SubmitState, ValidationMode, ValidationTicket, field_map_to_json,
};
pub use draft::{FormDraftStore, InMemoryDraftStore};
pub use rules::{FieldRules, RuleSet};
pub use validation::ValidationReport;
