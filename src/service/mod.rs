//! CrudService: generic CRUD using the safe SQL builder.

mod crud;
mod validation;
pub use crud::{CrudService, UpdateOutcome};
pub use validation::{body_to_map, value_eq, RequestValidator};
