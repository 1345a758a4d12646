//! SQL synthesis: AST, compilers, dialects and statement assembly. Identifiers come from the registry
//! only; every value reaches SQL text through `Dialect::format_literal`.

pub mod ast;
mod builder;
pub mod dialect;
pub mod filter;
pub mod oracle;
pub mod order;
pub mod params;
pub mod postgres;
pub mod projection;
pub mod render;

pub use builder::*;
pub use dialect::{Dialect, InsertPlan, KeySource};
pub use filter::{compile_filter, FilterCompiler};
pub use oracle::OracleDialect;
pub use order::compile_order;
pub use params::PgBindValue;
pub use postgres::PostgresDialect;
pub use projection::ProjectionCompiler;
pub use render::Renderer;
