//! Resolved catalog: validated entity definitions indexed for runtime lookup.

use crate::config::types::{ColumnDef, EntityDef};
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Catalog {
    /// Entities in dependency order (referenced tables first).
    pub entities: Vec<EntityDef>,
    index_by_path: HashMap<String, usize>,
}

/// A column of another entity that points at this one.
#[derive(Clone, Copy, Debug)]
pub struct Referrer<'a> {
    pub entity: &'a EntityDef,
    pub column: &'a ColumnDef,
}

impl Catalog {
    /// Validate definitions and build the path index.
    pub fn resolve(entities: Vec<EntityDef>) -> Result<Self, ConfigError> {
        validate(&entities)?;
        let index_by_path = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path_segment.clone(), i))
            .collect();
        Ok(Catalog {
            entities,
            index_by_path,
        })
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&EntityDef> {
        self.index_by_path.get(path).map(|&i| &self.entities[i])
    }

    /// Every (entity, column) whose foreign key targets `target`.
    pub fn referrers<'a>(&'a self, target: &EntityDef) -> Vec<Referrer<'a>> {
        self.entities
            .iter()
            .flat_map(|entity| {
                entity
                    .columns
                    .iter()
                    .filter(|c| {
                        c.references
                            .as_ref()
                            .is_some_and(|fk| fk.entity == target.path_segment)
                    })
                    .map(move |column| Referrer { entity, column })
            })
            .collect()
    }
}
