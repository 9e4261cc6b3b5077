//! The three catalog entities. Order matters: referenced entities come first.

use crate::config::types::{ColumnDef, ColumnType, EntityDef, IncludeDef};

pub fn genre() -> EntityDef {
    EntityDef {
        label: "Genre".into(),
        table_name: "genres".into(),
        path_segment: "genres".into(),
        columns: vec![
            ColumnDef::primary_key("id"),
            ColumnDef::nullable("name", ColumnType::Text),
        ],
        filterable: Vec::new(),
        includes: Vec::new(),
    }
}

pub fn director() -> EntityDef {
    EntityDef {
        label: "Director".into(),
        table_name: "directors".into(),
        path_segment: "directors".into(),
        columns: vec![
            ColumnDef::primary_key("id"),
            ColumnDef::nullable("name", ColumnType::Text),
        ],
        filterable: Vec::new(),
        includes: Vec::new(),
    }
}

pub fn movie() -> EntityDef {
    EntityDef {
        label: "Movie".into(),
        table_name: "movies".into(),
        path_segment: "movies".into(),
        columns: vec![
            ColumnDef::primary_key("id"),
            ColumnDef::nullable("title", ColumnType::Text),
            ColumnDef::nullable("description", ColumnType::Text),
            ColumnDef::nullable("trailer", ColumnType::Text),
            ColumnDef::nullable("year", ColumnType::Integer),
            ColumnDef::nullable("rating", ColumnType::Real),
            ColumnDef::foreign_key("genre_id", "genres", "id"),
            ColumnDef::foreign_key("director_id", "directors", "id"),
        ],
        filterable: vec!["director_id".into(), "genre_id".into()],
        includes: vec![
            name_only("genre", "genres", "genre_id"),
            name_only("director", "directors", "director_id"),
        ],
    }
}

fn name_only(name: &str, related: &str, our_key: &str) -> IncludeDef {
    IncludeDef {
        name: name.into(),
        related: related.into(),
        our_key: our_key.into(),
        their_key: "id".into(),
        fields: vec!["name".into()],
    }
}

/// All entities served by the API, in dependency order.
pub fn entities() -> Vec<EntityDef> {
    vec![genre(), director(), movie()]
}
