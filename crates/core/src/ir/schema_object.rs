use std::collections::BTreeMap;

use super::{DataType, Expr, Ident, QualifiedName, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaObject {
    Table(Table),
    Index(IndexDef),
    Sequence(Sequence),
    StoredProcedure(StoredProcedure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: QualifiedName,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub checks: Vec<CheckConstraint>,
    pub options: TableOptions,
}

impl Table {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: QualifiedName {
                schema: None,
                name: Ident::unquoted(name),
            },
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            options: TableOptions::default(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.fold() == name.to_lowercase())
    }

    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.fold() == name.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: Ident,
    pub data_type: DataType,
    pub not_null: bool,
    pub default: Option<Expr>,
    pub identity: Option<Identity>,
    pub generated: Option<GeneratedColumn>,
    pub collation: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

impl Column {
    pub fn is_identity(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_computed(&self) -> bool {
        self.generated.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub seed: i64,
    pub increment: i64,
    pub not_for_replication: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedColumn {
    pub expr: Expr,
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    pub name: Option<Ident>,
    pub columns: Vec<Ident>,
    pub clustered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: Option<Ident>,
    pub columns: Vec<Ident>,
    pub referenced_table: QualifiedName,
    pub referenced_columns: Vec<Ident>,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckConstraint {
    pub name: Option<Ident>,
    pub expr: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableOptions {
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub name: Option<Ident>,
    pub owner: IndexOwner,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
    pub where_clause: Option<Expr>,
    pub extra: BTreeMap<String, Value>,
}

impl IndexDef {
    pub fn is_clustered(&self) -> bool {
        matches!(self.extra.get(super::extra_keys::INDEX_CLUSTERED), Some(Value::Bool(true)))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.fold()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    pub name: Ident,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOwner {
    Table(QualifiedName),
}

impl IndexOwner {
    pub fn table_name(&self) -> &QualifiedName {
        match self {
            IndexOwner::Table(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub name: QualifiedName,
    pub data_type: Option<DataType>,
    pub increment: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub start: Option<i64>,
    pub cache: Option<i64>,
    pub cycle: bool,
}

/// A `CREATE`/`ALTER PROCEDURE` batch, kept as opaque T-SQL text and replaced
/// wholesale whenever its body changes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProcedure {
    pub name: QualifiedName,
    pub definition: String,
}
