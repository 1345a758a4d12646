//! Result of a data call: plain data, or the debug envelope `{ data, sql, error? }`.

use crate::error::AppError;
use serde::Serialize;

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Data(T),
    Debug {
        data: Option<T>,
        sql: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl<T> Reply<T> {
    /// Wrap an operation result. In debug mode backend failures become data; registry and compile
    /// errors are returned as errors regardless.
    pub fn settle(debug: bool, sql: String, result: Result<T, AppError>) -> Result<Reply<T>, AppError> {
        match (result, debug) {
            (Ok(data), false) => Ok(Reply::Data(data)),
            (Ok(data), true) => Ok(Reply::Debug {
                data: Some(data),
                sql,
                error: None,
            }),
            (Err(AppError::Backend(e)), true) => Ok(Reply::Debug {
                data: None,
                sql,
                error: Some(e.to_string()),
            }),
            (Err(e), _) => Err(e),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Reply::Data(d) => Some(d),
            Reply::Debug { data, .. } => data.as_ref(),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Reply::Data(d) => Some(d),
            Reply::Debug { data, .. } => data,
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, Reply::Debug { .. })
    }
}
