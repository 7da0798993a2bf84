pub mod api;
pub mod components;
pub mod feedback;
pub mod form;
pub mod prelude;
