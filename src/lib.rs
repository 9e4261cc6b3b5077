//! Movie catalog: REST CRUD over movies, directors and genres stored in SQLite.

pub mod config;
pub mod error;
pub mod migration;
pub mod response;
pub mod sql;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{catalog, Catalog, EntityDef, Settings};
pub use error::{AppError, ConfigError};
pub use migration::apply_schema;
pub use state::AppState;
pub use store::{open_pool, open_pool_from_settings};
pub use routes::{app, common_routes_with_ready, entity_routes};
pub use service::{CrudService, UpdateOutcome};
