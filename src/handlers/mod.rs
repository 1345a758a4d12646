//! HTTP handlers for the data endpoints.

pub mod data;
pub use data::*;
