//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Problems with the model registry: raised at load time or before any SQL executes.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("missing model: {0}")]
    MissingModel(String),
    #[error("model {0} declares no primary key")]
    MissingPrimaryKey(String),
    #[error("relation {model}.{relation} targets unknown {target}")]
    MissingRelationTarget {
        model: String,
        relation: String,
        target: String,
    },
    #[error("invalid identifier in {model}: '{name}'")]
    InvalidIdentifier { model: String, name: String },
    #[error("{model}: '{name}' is declared both as a column and as a relation")]
    OverlappingName { model: String, name: String },
    #[error("{model}.{relation}: local column '{column}' is not declared")]
    UnknownFromColumn {
        model: String,
        relation: String,
        column: String,
    },
    #[error("{model}: output label '{label}' exceeds {max} bytes")]
    LabelTooLong { model: String, label: String, max: usize },
    #[error("registry load: {0}")]
    Load(String),
}

/// An environment setting that is present but unusable.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{key}: invalid value '{value}': {reason}")]
pub struct SettingsError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Raised while turning a query description into SQL text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("unsupported literal type: {0}")]
    UnsupportedLiteralType(String),
    #[error("operator '{op}' on {field}: {reason}")]
    UnsupportedOperand {
        op: String,
        field: String,
        reason: String,
    },
}

/// Failures reported by the connection layer.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("statement failed: {0}")]
    Statement(String),
    #[error("connection: {0}")]
    Connection(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Backend(BackendError::Sqlx(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Registry(RegistryError::MissingModel(_)) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Registry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "registry_error"),
            AppError::Compile(_) => (StatusCode::BAD_REQUEST, "compile_error"),
            AppError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
