//! Entity definition types: tables, columns, foreign keys and read-only includes.

/// Storage type of a column. Drives DDL, body validation and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// SQLite type name used in CREATE TABLE.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// JSON type name used in validation messages.
    pub fn json_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "an integer",
            ColumnType::Real => "a number",
            ColumnType::Text => "a string",
        }
    }
}

/// Target of a foreign key column: related entity (by path segment) and its key column.
#[derive(Clone, Debug)]
pub struct ForeignKey {
    pub entity: String,
    pub column: String,
}

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    pub fn primary_key(name: &str) -> Self {
        ColumnDef {
            name: name.to_string(),
            column_type: ColumnType::Integer,
            primary_key: true,
            nullable: false,
            references: None,
        }
    }

    pub fn nullable(name: &str, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.to_string(),
            column_type,
            primary_key: false,
            nullable: true,
            references: None,
        }
    }

    pub fn foreign_key(name: &str, entity: &str, column: &str) -> Self {
        ColumnDef {
            references: Some(ForeignKey {
                entity: entity.to_string(),
                column: column.to_string(),
            }),
            ..ColumnDef::nullable(name, ColumnType::Integer)
        }
    }
}

/// Related entity embedded in reads as a nested object restricted to `fields`.
/// Example: movie -> `director: {name}` via movies.director_id = directors.id.
#[derive(Clone, Debug)]
pub struct IncludeDef {
    /// Key of the nested object in the serialized row.
    pub name: String,
    /// Path segment of the related entity.
    pub related: String,
    /// Our column used in the join (our FK).
    pub our_key: String,
    /// Their column used in the join (their PK).
    pub their_key: String,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct EntityDef {
    /// Singular display name used in status messages ("Movie created").
    pub label: String,
    pub table_name: String,
    pub path_segment: String,
    pub columns: Vec<ColumnDef>,
    /// Columns accepted as exact-match query filters on list.
    pub filterable: Vec<String>,
    pub includes: Vec<IncludeDef>,
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn pk(&self) -> &ColumnDef {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .unwrap_or_else(|| &self.columns[0])
    }

    /// Columns a request body may set (everything except the primary key).
    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.primary_key)
    }
}
