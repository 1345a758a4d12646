//! One checked-out connection plus the SQL it has issued, for debug envelopes.

use crate::backend::{Backend, Connection, Outcome, Row};
use crate::error::{AppError, BackendError};
use crate::sql::{Dialect, Statement};

pub struct Session<'a> {
    conn: Box<dyn Connection>,
    dialect: &'a dyn Dialect,
    issued: Vec<String>,
}

impl<'a> Session<'a> {
    pub async fn open(backend: &'a dyn Backend) -> Result<Session<'a>, BackendError> {
        let conn = backend.acquire().await?;
        Ok(Session {
            conn,
            dialect: backend.dialect(),
            issued: Vec::new(),
        })
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, BackendError> {
        self.record(statement);
        self.conn.query(statement).await
    }

    pub async fn execute(&mut self, statement: &Statement) -> Result<Outcome, BackendError> {
        self.record(statement);
        self.conn.execute(statement).await
    }

    /// Opens the connection's transaction. The dialect decides whether a BEGIN appears in the log.
    pub async fn begin(&mut self) -> Result<(), BackendError> {
        if let Some(sql) = self.dialect.begin_transaction() {
            self.record(&Statement::new(sql));
        }
        self.conn.begin().await
    }

    pub async fn commit(&mut self) -> Result<(), BackendError> {
        self.record(&Statement::new("COMMIT"));
        self.conn.commit().await
    }

    pub async fn rollback(&mut self) -> Result<(), BackendError> {
        self.record(&Statement::new("ROLLBACK"));
        self.conn.rollback().await
    }

    /// Commit on success; on failure roll back first and then surface the original error.
    pub async fn settle<T>(&mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Ok(v) => {
                self.commit().await?;
                Ok(v)
            }
            Err(e) => {
                if let Err(rb) = self.rollback().await {
                    tracing::warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Every statement issued so far, joined with `;\n`.
    pub fn sql(&self) -> String {
        self.issued.join(";\n")
    }

    fn record(&mut self, statement: &Statement) {
        tracing::debug!(sql = %statement.sql, params = ?statement.params, "query");
        self.issued.push(statement.sql.clone());
    }
}
