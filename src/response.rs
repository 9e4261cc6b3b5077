//! Response helpers: bare JSON rows, status messages and the structured error body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

pub fn ok_one(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(row))
}

pub fn ok_many(rows: Vec<Value>) -> (StatusCode, Json<Vec<Value>>) {
    (StatusCode::OK, Json(rows))
}

/// 201 with `"<Label> created"` and a Location header pointing at the new row.
pub fn created(label: &str, path_segment: &str, id: i64) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("/{}/{}", path_segment, id))],
        Json(format!("{} created", label)),
    )
        .into_response()
}

pub fn error_body(code: &str, message: String) -> ErrorBody {
    ErrorBody {
        error: ErrorDetail {
            code: code.to_string(),
            message,
        },
    }
}
