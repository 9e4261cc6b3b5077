//! Apply the catalog to the database: one table per entity, foreign keys and FK indexes.
//! Idempotent (IF NOT EXISTS); existing tables are never altered.

use crate::config::{Catalog, EntityDef};
use crate::error::{AppError, ConfigError};
use crate::sql::quoted;
use sqlx::SqlitePool;

/// Bookkeeping columns added to every table. Not exposed by the API.
const TIMESTAMP_COLUMNS: [(&str, &str); 2] = [
    ("created_at", "TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"),
    ("updated_at", "TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"),
];

/// CREATE TABLE and CREATE INDEX statements for one entity.
pub fn entity_ddl(catalog: &Catalog, entity: &EntityDef) -> Result<Vec<String>, ConfigError> {
    let mut col_defs = Vec::new();
    for c in &entity.columns {
        let mut def = format!("{} {}", quoted(&c.name), c.column_type.sql_type());
        if c.primary_key {
            // AUTOINCREMENT keeps ids from being reused after a delete.
            def.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(fk) = &c.references {
            let target = catalog
                .entity_by_path(&fk.entity)
                .ok_or_else(|| ConfigError::MissingReference {
                    kind: "entity",
                    id: fk.entity.clone(),
                })?;
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE RESTRICT",
                quoted(&target.table_name),
                quoted(&fk.column)
            ));
        }
        col_defs.push(def);
    }
    for (name, def_suffix) in TIMESTAMP_COLUMNS {
        if entity.column(name).is_none() {
            col_defs.push(format!("{} {}", quoted(name), def_suffix));
        }
    }

    let mut stmts = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(&entity.table_name),
        col_defs.join(", ")
    )];
    for c in entity.columns.iter().filter(|c| c.references.is_some()) {
        stmts.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quoted(&format!("idx_{}_{}", entity.table_name, c.name)),
            quoted(&entity.table_name),
            quoted(&c.name)
        ));
    }
    Ok(stmts)
}

/// Create every catalog table in dependency order.
pub async fn apply_schema(pool: &SqlitePool, catalog: &Catalog) -> Result<(), AppError> {
    for entity in &catalog.entities {
        for sql in entity_ddl(catalog, entity)? {
            tracing::debug!(sql = %sql, "ddl");
            sqlx::query(&sql).execute(pool).await?;
        }
    }
    tracing::info!(tables = catalog.entities.len(), "schema ready");
    Ok(())
}
