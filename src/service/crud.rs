//! Generic CRUD execution against SQLite, driven by the entity definition.

use crate::config::{Catalog, ColumnType, EntityDef, IncludeDef};
use crate::error::AppError;
use crate::service::validation::value_eq;
use crate::sql::{self, BindValue, IncludeSelect, QueryBuf};
use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

/// Result of a load-apply-save update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No row with that id.
    Missing,
    /// Row exists and every submitted value already matched.
    Unchanged,
    Updated,
}

pub struct CrudService;

impl CrudService {
    /// All rows ordered by id, narrowed by exact-match filters, with includes resolved.
    pub async fn list(
        pool: &SqlitePool,
        catalog: &Catalog,
        entity: &EntityDef,
        filters: &[(String, Value)],
    ) -> Result<Vec<Value>, AppError> {
        let includes = include_selects(catalog, entity);
        let q = sql::select_list(entity, filters, &includes);
        let mut conn = pool.acquire().await?;
        let rows = Self::fetch_all(&mut conn, &q).await?;
        rows.iter().map(|r| row_to_json(r, entity, &includes)).collect()
    }

    /// Fetch one row by primary key. Returns JSON object or None.
    pub async fn read(
        pool: &SqlitePool,
        catalog: &Catalog,
        entity: &EntityDef,
        id: i64,
    ) -> Result<Option<Value>, AppError> {
        let includes = include_selects(catalog, entity);
        let q = sql::select_by_id(entity, id, &includes);
        let mut conn = pool.acquire().await?;
        let row = Self::fetch_optional(&mut conn, &q).await?;
        row.map(|r| row_to_json(&r, entity, &includes)).transpose()
    }

    /// Insert one row from a validated body inside a transaction. Returns the new id.
    pub async fn create(
        pool: &SqlitePool,
        catalog: &Catalog,
        entity: &EntityDef,
        body: &Map<String, Value>,
    ) -> Result<i64, AppError> {
        let mut tx = begin_write(pool).await?;
        Self::check_references(&mut tx, catalog, entity, body).await?;
        let q = sql::insert(entity, body);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let id = bind(&q).execute(&mut *tx).await?.last_insert_rowid();
        tx.commit().await?;
        tracing::info!(entity = %entity.path_segment, id, "created");
        Ok(id)
    }

    /// Load by id, apply the submitted fields, save.
    pub async fn update(
        pool: &SqlitePool,
        catalog: &Catalog,
        entity: &EntityDef,
        id: i64,
        body: &Map<String, Value>,
    ) -> Result<UpdateOutcome, AppError> {
        let mut tx = begin_write(pool).await?;
        let Some(row) = Self::fetch_optional(&mut tx, &sql::select_by_id(entity, id, &[])).await? else {
            return Ok(UpdateOutcome::Missing);
        };
        let current = row_to_json(&row, entity, &[])?;
        let changed = body
            .iter()
            .any(|(k, v)| current.get(k).map_or(true, |cur| !value_eq(cur, v)));
        if !changed {
            return Ok(UpdateOutcome::Unchanged);
        }
        Self::check_references(&mut tx, catalog, entity, body).await?;
        Self::execute(&mut tx, &sql::update(entity, id, body)).await?;
        tx.commit().await?;
        tracing::info!(entity = %entity.path_segment, id, "updated");
        Ok(UpdateOutcome::Updated)
    }

    /// Delete by id. Returns false when the row does not exist; refuses while other rows reference it.
    pub async fn delete(
        pool: &SqlitePool,
        catalog: &Catalog,
        entity: &EntityDef,
        id: i64,
    ) -> Result<bool, AppError> {
        let id_value = Value::from(id);
        let mut tx = begin_write(pool).await?;
        if Self::fetch_optional(&mut tx, &sql::exists(entity, entity.pk(), &id_value))
            .await?
            .is_none()
        {
            return Ok(false);
        }
        for r in catalog.referrers(entity) {
            let q = sql::count_where(r.entity, r.column, &id_value);
            let count: i64 = Self::fetch_one(&mut tx, &q).await?.try_get(0)?;
            if count > 0 {
                return Err(AppError::Conflict(format!(
                    "{} {} is still referenced by {} row(s) in {}",
                    entity.label, id, count, r.entity.path_segment
                )));
            }
        }
        Self::execute(&mut tx, &sql::delete(entity, id)).await?;
        tx.commit().await?;
        tracing::info!(entity = %entity.path_segment, id, "deleted");
        Ok(true)
    }

    /// Every non-null foreign key in the body must point at an existing row.
    async fn check_references(
        conn: &mut SqliteConnection,
        catalog: &Catalog,
        entity: &EntityDef,
        body: &Map<String, Value>,
    ) -> Result<(), AppError> {
        for c in entity.writable_columns() {
            let Some(fk) = &c.references else { continue };
            let Some(val) = body.get(&c.name).filter(|v| !v.is_null()) else { continue };
            let Some(target) = catalog.entity_by_path(&fk.entity) else { continue };
            let Some(target_col) = target.column(&fk.column) else { continue };
            if Self::fetch_optional(conn, &sql::exists(target, target_col, val)).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "{} {} does not match any {}",
                    c.name, val, target.label
                )));
            }
        }
        Ok(())
    }

    async fn fetch_all(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<Vec<SqliteRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind(q).fetch_all(&mut *conn).await?)
    }

    async fn fetch_optional(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<Option<SqliteRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind(q).fetch_optional(&mut *conn).await?)
    }

    async fn fetch_one(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<SqliteRow, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind(q).fetch_one(&mut *conn).await?)
    }

    async fn execute(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind(q).execute(&mut *conn).await?.rows_affected())
    }
}

/// Write transaction holding the database write lock from its first statement.
/// Concurrent writers queue on the busy timeout instead of failing the lock upgrade.
async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

fn bind(q: &QueryBuf) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    q.params
        .iter()
        .fold(sqlx::query(&q.sql), |query, p| query.bind(BindValue::from(p)))
}

fn include_selects<'a>(catalog: &'a Catalog, entity: &'a EntityDef) -> Vec<IncludeSelect<'a>> {
    entity
        .includes
        .iter()
        .filter_map(|include| {
            catalog
                .entity_by_path(&include.related)
                .map(|related| IncludeSelect { include, related })
        })
        .collect()
}

fn row_to_json(row: &SqliteRow, entity: &EntityDef, includes: &[IncludeSelect<'_>]) -> Result<Value, AppError> {
    let mut map = Map::new();
    for c in &entity.columns {
        map.insert(c.name.clone(), cell_to_value(row, &c.name, c.column_type)?);
    }
    for inc in includes {
        map.insert(inc.include.name.clone(), include_to_value(row, inc.include)?);
    }
    Ok(Value::Object(map))
}

fn cell_to_value(row: &SqliteRow, name: &str, column_type: ColumnType) -> Result<Value, AppError> {
    let v = match column_type {
        ColumnType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
        ColumnType::Real => {
            let n = match row.try_get::<Option<f64>, _>(name) {
                Ok(n) => n,
                // REAL affinity can still hand back an INTEGER storage class.
                Err(sqlx::Error::ColumnDecode { .. }) => row.try_get::<Option<i64>, _>(name)?.map(|n| n as f64),
                Err(e) => return Err(e.into()),
            };
            n.and_then(serde_json::Number::from_f64).map(Value::Number)
        }
        ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
    };
    Ok(v.unwrap_or(Value::Null))
}

/// Nested object from the json_object subquery; a missing related row yields all-null fields.
fn include_to_value(row: &SqliteRow, include: &IncludeDef) -> Result<Value, AppError> {
    let Some(text) = row.try_get::<Option<String>, _>(include.name.as_str())? else {
        return Ok(Value::Object(
            include
                .fields
                .iter()
                .map(|f| (f.clone(), Value::Null))
                .collect(),
        ));
    };
    serde_json::from_str(&text).map_err(|e| AppError::Db(sqlx::Error::Decode(Box::new(e))))
}
