//! Read and write services over a `Session`.

pub mod mapper;
mod read;
mod reply;
mod session;
mod write;

pub use mapper::{normalize_scalar, ResultMapper};
pub use read::{ReadPlan, ReadService};
pub use reply::Reply;
pub use session::Session;
pub use write::WriteService;
