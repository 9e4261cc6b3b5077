//! Request body validation against an entity's writable columns.

use crate::config::{ColumnType, EntityDef};
use crate::error::AppError;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Accept a body only if every key is a writable column and every value fits the column type.
    /// The primary key is server-assigned and never accepted.
    pub fn validate(body: &Map<String, Value>, entity: &EntityDef) -> Result<(), AppError> {
        for (key, v) in body {
            let col = entity
                .column(key)
                .ok_or_else(|| AppError::Validation(format!("unknown field '{}' for {}", key, entity.label)))?;
            if col.primary_key {
                return Err(AppError::Validation(format!("{} is assigned by the server", key)));
            }
            if v.is_null() {
                if col.nullable {
                    continue;
                }
                return Err(AppError::Validation(format!("{} cannot be null", key)));
            }
            let ok = match col.column_type {
                ColumnType::Integer => v.is_i64(),
                ColumnType::Real => v.is_number(),
                ColumnType::Text => v.is_string(),
            };
            if !ok {
                return Err(AppError::Validation(format!(
                    "{} must be {}",
                    key,
                    col.column_type.json_name()
                )));
            }
        }
        Ok(())
    }
}

/// The body as an object map; anything else is a bad request.
pub fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Equality that treats 9 and 9.0 as the same stored value.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
