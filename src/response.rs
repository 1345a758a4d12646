//! HTTP bodies for data replies: `{ data }` for one record, `{ data, meta: { count } }` for rows.
//! Debug envelopes bypass both and are returned as built.

use crate::service::Reply;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub count: usize,
}

/// One record (or `null`) under `data`, answered with `status`. Debug envelopes are always 200.
pub fn record<T: Serialize>(status: StatusCode, reply: Reply<T>) -> Response {
    match reply {
        Reply::Data(data) => (status, Json(Envelope { data, meta: None })).into_response(),
        debug => Json(debug).into_response(),
    }
}

/// Rows under `data` with their count under `meta`.
pub fn rows<T: Serialize>(reply: Reply<Vec<T>>) -> Response {
    match reply {
        Reply::Data(data) => {
            let meta = Some(Meta { count: data.len() });
            Json(Envelope { data, meta }).into_response()
        }
        debug => Json(debug).into_response(),
    }
}
