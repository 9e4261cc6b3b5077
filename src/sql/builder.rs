//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from an entity definition.

use crate::config::{ColumnDef, EntityDef, IncludeDef};
use serde_json::{Map, Value};

/// One include for reads: a correlated subquery producing a JSON object of `fields`.
pub struct IncludeSelect<'a> {
    pub include: &'a IncludeDef,
    pub related: &'a EntityDef,
}

const MAIN_ALIAS: &str = "main";

/// Quote identifier for SQLite (safe: only from the catalog).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Append a bound value and return its `?N` placeholder.
    fn push_param(&mut self, v: Value) -> String {
        self.params.push(v);
        format!("?{}", self.params.len())
    }
}

fn select_parts(entity: &EntityDef, includes: &[IncludeSelect<'_>]) -> Vec<String> {
    let mut parts: Vec<String> = entity
        .columns
        .iter()
        .map(|c| format!("{}.{}", MAIN_ALIAS, quoted(&c.name)))
        .collect();
    for inc in includes {
        let pairs = inc
            .include
            .fields
            .iter()
            .map(|f| format!("'{}', {}", f.replace('\'', "''"), quoted(f)))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!(
            "(SELECT json_object({}) FROM {} WHERE {} = {}.{}) AS {}",
            pairs,
            quoted(&inc.related.table_name),
            quoted(&inc.include.their_key),
            MAIN_ALIAS,
            quoted(&inc.include.our_key),
            quoted(&inc.include.name)
        ));
    }
    parts
}

/// SELECT list with optional exact-match filters joined by AND, ORDER BY pk.
/// Filters on columns the entity does not have are skipped.
pub fn select_list(entity: &EntityDef, filters: &[(String, Value)], includes: &[IncludeSelect<'_>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if entity.column(col).is_none() {
            continue;
        }
        let ph = q.push_param(val.clone());
        where_parts.push(format!("{}.{} = {}", MAIN_ALIAS, quoted(col), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {} {}{} ORDER BY {}.{}",
        select_parts(entity, includes).join(", "),
        quoted(&entity.table_name),
        MAIN_ALIAS,
        where_clause,
        MAIN_ALIAS,
        quoted(&entity.pk().name)
    );
    q
}

/// SELECT one row by primary key.
pub fn select_by_id(entity: &EntityDef, id: i64, includes: &[IncludeSelect<'_>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = {}",
        select_parts(entity, includes).join(", "),
        quoted(&entity.table_name),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(&entity.pk().name),
        ph
    );
    q
}

/// `SELECT 1` probe for existence of a row where `column = value`.
pub fn exists(entity: &EntityDef, column: &ColumnDef, value: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(value.clone());
    q.sql = format!(
        "SELECT 1 FROM {} WHERE {} = {} LIMIT 1",
        quoted(&entity.table_name),
        quoted(&column.name),
        ph
    );
    q
}

/// Number of rows of `entity` whose `column` equals `value`.
pub fn count_where(entity: &EntityDef, column: &ColumnDef, value: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(value.clone());
    q.sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = {}",
        quoted(&entity.table_name),
        quoted(&column.name),
        ph
    );
    q
}

/// INSERT the writable columns present in body; absent columns are left to their default (NULL).
pub fn insert(entity: &EntityDef, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&entity.table_name);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.writable_columns() {
        let Some(val) = body.get(&c.name) else { continue };
        placeholders.push(q.push_param(val.clone()));
        cols.push(quoted(&c.name));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    q
}

/// UPDATE by id: SET only writable columns present in body, and touch updated_at.
pub fn update(entity: &EntityDef, id: i64, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in entity.writable_columns() {
        let Some(val) = body.get(&c.name) else { continue };
        let ph = q.push_param(val.clone());
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    sets.push(format!("{} = CURRENT_TIMESTAMP", quoted("updated_at")));
    let id_ph = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(&entity.table_name),
        sets.join(", "),
        quoted(&entity.pk().name),
        id_ph
    );
    q
}

/// DELETE by id.
pub fn delete(entity: &EntityDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(Value::from(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quoted(&entity.table_name),
        quoted(&entity.pk().name),
        ph
    );
    q
}
