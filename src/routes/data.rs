//! Data routes: one POST endpoint per operation, model name in the path. Raw SQL is not exposed.

use crate::handlers::data::{create, find_first, find_many, update};
use crate::state::AppState;
use axum::{routing::post, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 1024 * 1024;

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/:model/find-many", post(find_many))
        .route("/:model/find-first", post(find_first))
        .route("/:model/create", post(create))
        .route("/:model/update", post(update))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .with_state(state)
}
