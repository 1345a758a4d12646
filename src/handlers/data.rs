//! Data handlers: findMany, findFirst, create, update on `/:model/...`.

use crate::error::AppError;
use crate::query::{CreateArgs, FindFirstArgs, FindManyArgs, UpdateArgs};
use crate::response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    if !body.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

pub async fn find_many(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let mut args: FindManyArgs = parse_body(body)?;
    args.debug |= state.debug;
    let reply = state.client.find_many(&model, args).await?;
    Ok(response::rows(reply))
}

pub async fn find_first(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let mut args: FindFirstArgs = parse_body(body)?;
    args.debug |= state.debug;
    let reply = state.client.find_first(&model, args).await?;
    Ok(response::record(StatusCode::OK, reply))
}

pub async fn create(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let mut args: CreateArgs = parse_body(body)?;
    args.debug |= state.debug;
    let reply = state.client.create(&model, args).await?;
    Ok(response::record(StatusCode::CREATED, reply))
}

pub async fn update(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let mut args: UpdateArgs = parse_body(body)?;
    args.debug |= state.debug;
    let reply = state.client.update(&model, args).await?;
    Ok(response::rows(reply))
}
