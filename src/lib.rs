//! Strata SDK: model-driven relational data access. Declarative filter and selection trees compile to
//! dialect-specific SQL; reads map JSON-aggregated relations back to nested objects; writes cascade
//! relation operations inside one transaction.

pub mod backend;
pub mod client;
pub mod error;
pub mod handlers;
pub mod query;
pub mod registry;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod value;

pub use backend::{Backend, Connection, Outcome, PgBackend, Row};
pub use client::Client;
pub use error::{AppError, BackendError, CompileError, RegistryError, SettingsError};
pub use query::{CreateArgs, FindFirstArgs, FindManyArgs, UpdateArgs};
pub use registry::{load_from_json_str, load_from_path, resolve, ModelDefinitions, Registry, ResolvedModel};
pub use routes::{common_routes_with_ready, data_routes};
pub use service::Reply;
pub use settings::Settings;
pub use sql::{Dialect, OracleDialect, PostgresDialect, Statement};
pub use state::AppState;
pub use value::Value;
