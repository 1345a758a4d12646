pub mod common;
pub mod data;

pub use common::common_routes_with_ready;
pub use data::data_routes;
