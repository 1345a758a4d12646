//! Connection seam. The core issues `Statement`s through these traits and never touches a driver
//! directly; `postgres` implements them over a sqlx pool.

pub mod postgres;

use crate::error::BackendError;
use crate::sql::{Dialect, Statement};
use async_trait::async_trait;
use serde_json::{Map, Value as Json};

pub use postgres::PgBackend;

/// One result row keyed by column label.
pub type Row = Map<String, Json>;

/// Result of a statement run through `Connection::execute`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    /// Rows produced by the statement (e.g. a RETURNING clause).
    pub rows: Vec<Row>,
    /// Final values of OUT / IN OUT binds, keyed by bind name.
    pub out_binds: Row,
}

/// A connection checked out for the duration of one operation. Dropping it returns it to the pool;
/// a transaction still open at that point is rolled back, never left for the next caller.
#[async_trait]
pub trait Connection: Send {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, BackendError>;

    async fn execute(&mut self, statement: &Statement) -> Result<Outcome, BackendError>;

    async fn begin(&mut self) -> Result<(), BackendError>;

    async fn commit(&mut self) -> Result<(), BackendError>;

    async fn rollback(&mut self) -> Result<(), BackendError>;
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    async fn acquire(&self) -> Result<Box<dyn Connection>, BackendError>;

    /// Cheap round-trip used by readiness checks.
    async fn ping(&self) -> Result<(), BackendError>;
}
