use crate::{
    CheckConstraint, Column, DataType, Expr, ForeignKey, Identity, IndexDef, PrimaryKey,
    QualifiedName, Sequence, StoredProcedure, Table,
};

/// A single statement-granularity schema change. The generator turns a
/// sequence of these into phased, ordered DDL; the comparison engine never
/// orders them itself.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOp {
    // --- Table ---
    CreateTable(Table),
    DropTable(QualifiedName),

    // --- Column (scoped to a table) ---
    AddColumn {
        table: QualifiedName,
        column: Box<Column>,
    },
    DropColumn {
        table: QualifiedName,
        column: Box<Column>,
    },
    /// In-place `ALTER COLUMN`: the new shape is representable without
    /// dropping and recreating the column.
    AlterColumn {
        table: QualifiedName,
        before: Box<Column>,
        after: Box<Column>,
        changes: Vec<ColumnChange>,
    },
    /// The column's new shape can't be reached by `ALTER COLUMN` alone
    /// (type family change, identity toggle, or a large-object type):
    /// add the replacement under a temporary name, copy data across with
    /// dynamic SQL, drop the original, then rename into place.
    RebuildColumn {
        table: QualifiedName,
        before: Box<Column>,
        after: Box<Column>,
    },

    // --- Whole table (ordinal reorder that an indexed or computed column
    // depends on, where column order is otherwise unobservable): copy
    // through a temp table rather than touch columns one at a time.
    ReorderTable {
        table: QualifiedName,
        before: Box<Table>,
        after: Box<Table>,
    },

    // --- Index (scoped to a table) ---
    AddIndex {
        table: QualifiedName,
        index: IndexDef,
    },
    DropIndex {
        table: QualifiedName,
        name: Box<crate::Ident>,
    },

    // --- Foreign Key (scoped to a table) ---
    AddForeignKey {
        table: QualifiedName,
        fk: ForeignKey,
    },
    DropForeignKey {
        table: QualifiedName,
        name: crate::Ident,
    },

    // --- Check Constraint (scoped to a table) ---
    AddCheck {
        table: QualifiedName,
        check: CheckConstraint,
    },
    DropCheck {
        table: QualifiedName,
        name: crate::Ident,
    },

    // --- Primary Key ---
    SetPrimaryKey {
        table: QualifiedName,
        pk: PrimaryKey,
    },
    DropPrimaryKey {
        table: QualifiedName,
    },

    // --- Sequence ---
    CreateSequence(Sequence),
    DropSequence(QualifiedName),
    AlterSequence {
        name: QualifiedName,
        changes: Vec<SequenceChange>,
    },

    // --- Stored Procedure ---
    CreateOrAlterProcedure(StoredProcedure),
    DropProcedure(QualifiedName),
}

/// Field-level deltas for an `AlterColumn`/`RebuildColumn` pair. Carried
/// alongside the full before/after columns so the generator can render
/// either a minimal `ALTER COLUMN` or decide a rebuild is unavoidable
/// without recomputing the diff.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChange {
    SetType(DataType),
    SetNotNull(bool),
    SetDefault(Option<Expr>),
    SetIdentity(Option<Identity>),
    SetCollation(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceChange {
    SetType(DataType),
    SetIncrement(i64),
    SetMinValue(Option<i64>),
    SetMaxValue(Option<i64>),
    SetStart(i64),
    SetCache(Option<i64>),
    SetCycle(bool),
}
