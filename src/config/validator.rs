//! Catalog validation: primary keys, referential integrity and path uniqueness.

use crate::config::types::{ColumnType, EntityDef};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(entities: &[EntityDef]) -> Result<(), ConfigError> {
    let mut seen: HashMap<&str, &EntityDef> = HashMap::new();
    let mut tables = HashSet::new();

    for e in entities {
        let pks: Vec<_> = e.columns.iter().filter(|c| c.primary_key).collect();
        match pks.as_slice() {
            [pk] if pk.column_type == ColumnType::Integer => {}
            [pk] => {
                return Err(ConfigError::InvalidPrimaryKey {
                    entity: e.path_segment.clone(),
                    column: pk.name.clone(),
                })
            }
            _ => {
                return Err(ConfigError::Validation(format!(
                    "{} must have exactly one primary key column",
                    e.path_segment
                )))
            }
        }

        let mut names = HashSet::new();
        for c in &e.columns {
            if !names.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate column {}.{}",
                    e.path_segment, c.name
                )));
            }
            // Targets must already be declared so tables can be created in order.
            if let Some(fk) = &c.references {
                let target = seen.get(fk.entity.as_str()).ok_or_else(|| ConfigError::MissingReference {
                    kind: "entity",
                    id: fk.entity.clone(),
                })?;
                // Delete checks compare referrers against the target's primary key.
                if !target.column(&fk.column).is_some_and(|t| t.primary_key) {
                    return Err(ConfigError::MissingReference {
                        kind: "primary key",
                        id: format!("{}.{}", fk.entity, fk.column),
                    });
                }
            }
        }

        for f in &e.filterable {
            if e.column(f).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "filter column",
                    id: format!("{}.{}", e.path_segment, f),
                });
            }
        }

        for inc in &e.includes {
            if e.column(&inc.our_key).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "include key",
                    id: format!("{}.{}", e.path_segment, inc.our_key),
                });
            }
            let related = seen.get(inc.related.as_str()).ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: inc.related.clone(),
            })?;
            for col in std::iter::once(&inc.their_key).chain(inc.fields.iter()) {
                if related.column(col).is_none() {
                    return Err(ConfigError::MissingReference {
                        kind: "column",
                        id: format!("{}.{}", inc.related, col),
                    });
                }
            }
        }

        if !tables.insert(e.table_name.as_str()) {
            return Err(ConfigError::Validation(format!("duplicate table {}", e.table_name)));
        }
        if seen.insert(e.path_segment.as_str(), e).is_some() {
            return Err(ConfigError::DuplicatePathSegment(e.path_segment.clone()));
        }
    }

    Ok(())
}
