//! Caller-facing query and mutation descriptions, parsed from JSON into closed types.

pub mod args;
pub mod filter;
pub mod order;
pub mod relation_op;
pub mod selection;

pub use args::*;
pub use filter::*;
pub use order::*;
pub use relation_op::*;
pub use selection::*;
