//! Entity CRUD handlers: list, create, read, update, delete.
//! One set of handlers serves every catalog entity; the path segment selects it.

use crate::config::{ColumnType, EntityDef};
use crate::error::AppError;
use crate::response::{created, ok_many, ok_one};
use crate::service::{body_to_map, CrudService, RequestValidator, UpdateOutcome};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn entity_for<'a>(state: &'a AppState, path_segment: &str) -> Result<&'a EntityDef, AppError> {
    state
        .catalog
        .entity_by_path(path_segment)
        .ok_or_else(|| AppError::UnknownResource(path_segment.to_string()))
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

/// Validated object body. Oversized bodies are 413; other rejections, malformed
/// JSON and non-object bodies are bad requests.
fn parse_body(entity: &EntityDef, payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = payload.map_err(rejection_to_error)?;
    let body = body_to_map(value)?;
    RequestValidator::validate(&body, entity)?;
    Ok(body)
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Query string value typed by the filtered column.
fn query_value_for_column(entity: &EntityDef, col: &str, s: &str) -> Result<Value, AppError> {
    let column_type = entity.column(col).map(|c| c.column_type).unwrap_or(ColumnType::Text);
    match column_type {
        ColumnType::Integer => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| AppError::BadRequest(format!("{} must be an integer", col))),
        ColumnType::Real => s
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| AppError::BadRequest(format!("{} must be a number", col))),
        ColumnType::Text => Ok(Value::String(s.to_string())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let mut filters: Vec<(String, Value)> = Vec::new();
    // Catalog order keeps the generated SQL stable.
    for col in &entity.filterable {
        if let Some(raw) = params.get(col) {
            filters.push((col.clone(), query_value_for_column(entity, col, raw)?));
        }
    }
    let rows = CrudService::list(&state.pool, &state.catalog, entity, &filters).await?;
    Ok(ok_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let body = parse_body(entity, payload)?;
    let id = CrudService::create(&state.pool, &state.catalog, entity, &body).await?;
    Ok(created(&entity.label, &entity.path_segment, id))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, &state.catalog, entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.label.clone()))?;
    Ok(ok_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let body = parse_body(entity, payload)?;
    match CrudService::update(&state.pool, &state.catalog, entity, id, &body).await? {
        UpdateOutcome::Missing => Err(AppError::UpdateMismatch),
        UpdateOutcome::Unchanged | UpdateOutcome::Updated => Ok(StatusCode::NO_CONTENT),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    if !CrudService::delete(&state.pool, &state.catalog, entity, id).await? {
        return Err(AppError::NotFound(entity.label.clone()));
    }
    Ok(StatusCode::NO_CONTENT)
}
