//! The six concrete end-to-end scenarios the migration generator's test
//! suite is required to encode: a destructive type rebuild, a NOT NULL add
//! against a non-empty table, an identity toggle on a table's sole column, a
//! column reorder that a dependent index forces into a whole-table copy, and
//! a zero-column pass-through ordering. Cyclical FK trust restoration has its
//! own dedicated coverage in `minfold-core`'s `circular_fk_test.rs` plus the
//! `generator.rs` unit tests; this file focuses on what only the mssql
//! dialect's generated SQL can show.

use std::collections::BTreeMap;

use minfold_core::{
    Column, DataType, Dialect, DiffConfig, DiffEngine, Ident, IndexColumn, IndexDef, IndexOwner,
    PrimaryKey, QualifiedName, SortOrder, Statement, Table, TableOptions,
};
use minfold_dialect_mssql::MssqlDialect;

fn ident(value: &str) -> Ident {
    Ident::unquoted(value)
}

fn qualified(name: &str) -> QualifiedName {
    QualifiedName {
        schema: Some(ident("dbo")),
        name: ident(name),
    }
}

fn column(name: &str, data_type: DataType, not_null: bool) -> Column {
    Column {
        name: ident(name),
        data_type,
        not_null,
        default: None,
        identity: None,
        generated: None,
        collation: None,
        extra: BTreeMap::new(),
    }
}

fn base_table(name: &str, columns: Vec<Column>) -> Table {
    Table {
        name: qualified(name),
        columns,
        primary_key: None,
        foreign_keys: Vec::new(),
        checks: Vec::new(),
        options: TableOptions::default(),
    }
}

fn render(ops: &[minfold_core::DiffOp]) -> Vec<String> {
    let dialect = MssqlDialect;
    dialect
        .generate_ddl(ops)
        .expect("generate_ddl should succeed")
        .into_iter()
        .filter_map(|s| match s {
            Statement::Sql { sql, .. } => Some(sql),
            Statement::BatchBoundary => None,
        })
        .collect()
}

/// `Name VARCHAR(100) NULL` -> `Name TEXT NULL`. `text` never round-trips
/// through `ALTER COLUMN`, so it must classify as a rebuild and the
/// generated up script must drop and re-add rather than alter in place.
#[test]
fn varchar_to_text_is_a_rebuild_that_drops_and_readds() {
    let config = DiffConfig { enable_drop: true, ..DiffConfig::default() };
    let engine = DiffEngine::new(&config);

    let before = base_table(
        "widgets",
        vec![
            column("id", DataType::Int, true),
            column("name", DataType::VarChar { length: Some(100) }, false),
        ],
    );
    let after = base_table(
        "widgets",
        vec![
            column("id", DataType::Int, true),
            column("name", DataType::Text, false),
        ],
    );

    let ops = engine
        .diff(
            &[minfold_core::SchemaObject::Table(before)],
            &[minfold_core::SchemaObject::Table(after)],
        )
        .expect("diff should succeed");

    assert!(
        ops.iter().any(|op| matches!(op, minfold_core::DiffOp::RebuildColumn { .. })),
        "type family collapse into text must classify as Rebuild, got: {ops:?}"
    );

    let statements = render(&ops);
    let joined = statements.join("\n");
    assert!(joined.contains("ADD"), "rebuild must add a transitional column: {joined}");
    assert!(joined.contains("DROP COLUMN"), "rebuild must drop the original column: {joined}");
    assert!(joined.contains("sp_rename"), "rebuild must rename the replacement into place: {joined}");

    let down_ops = engine
        .diff(
            &[minfold_core::SchemaObject::Table(base_table(
                "widgets",
                vec![
                    column("id", DataType::Int, true),
                    column("name", DataType::Text, false),
                ],
            ))],
            &[minfold_core::SchemaObject::Table(base_table(
                "widgets",
                vec![
                    column("id", DataType::Int, true),
                    column("name", DataType::VarChar { length: Some(100) }, false),
                ],
            ))],
        )
        .expect("reverse diff should succeed");
    assert!(
        down_ops.iter().any(|op| matches!(op, minfold_core::DiffOp::RebuildColumn { .. })),
        "down direction must also classify as Rebuild"
    );
}

/// Adding `myColumn INT NOT NULL` to a table that already has rows. The
/// target schema carries no default of its own — the generator never knows
/// at generation time whether the table is empty, so it must synthesize a
/// placeholder default and name the constraint deterministically, exactly as
/// it would if the source schema had declared one.
#[test]
fn adding_not_null_column_carries_inline_default() {
    let table = qualified("orders");
    let new_column = column("my_column", DataType::Int, true);
    assert!(new_column.default.is_none(), "this test exercises synthesis, not pass-through");

    let ops = vec![minfold_core::DiffOp::AddColumn {
        table,
        column: Box::new(new_column),
    }];

    let statements = render(&ops);
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("ALTER TABLE [dbo].[orders] ADD [my_column] INT"));
    assert!(statements[0].contains("NOT NULL"));
    assert!(
        statements[0].contains("DEFAULT 0"),
        "NOT NULL add on a non-empty table must supply a default in the same statement: {}",
        statements[0]
    );
    assert!(
        statements[0].contains("CONSTRAINT [DF_orders_my_column_"),
        "synthesized default must be named deterministically like any other default constraint: {}",
        statements[0]
    );
}

/// `id INT IDENTITY` -> `id INT` where `id` is the table's only column. The
/// safe-wrapper protocol must preserve existing values through a
/// transitional column rather than losing them to a plain drop+add, and the
/// final column must land back under its original name.
#[test]
fn identity_toggle_on_sole_column_preserves_values_via_safe_wrapper() {
    let config = DiffConfig { enable_drop: true, ..DiffConfig::default() };
    let engine = DiffEngine::new(&config);

    let identity_column = Column {
        identity: Some(minfold_core::Identity { seed: 1, increment: 1, not_for_replication: false }),
        ..column("id", DataType::Int, true)
    };
    let plain_column = column("id", DataType::Int, true);

    let before = base_table("counters", vec![identity_column]);
    let after = base_table("counters", vec![plain_column]);

    let ops = engine
        .diff(
            &[minfold_core::SchemaObject::Table(before)],
            &[minfold_core::SchemaObject::Table(after)],
        )
        .expect("diff should succeed");
    assert!(ops.iter().any(|op| matches!(op, minfold_core::DiffOp::RebuildColumn { .. })));

    let statements = render(&ops);
    let joined = statements.join("\n");
    assert!(joined.contains("ADD"), "safe wrapper must add a transitional column: {joined}");
    assert!(
        joined.contains("UPDATE") && joined.contains("SET"),
        "dropping identity must copy existing values forward: {joined}"
    );
    assert!(joined.contains("DROP COLUMN [id]"), "original column must be dropped: {joined}");
    assert!(joined.contains("sp_rename") && joined.contains("'id'"), "replacement must land back under the original name: {joined}");
}

/// `[id, first_name, last_name]` -> `[id, last_name, first_name]` while an
/// index exists on `last_name`. The surviving columns' relative order
/// changed and a survivor is index-bearing, so this must be a whole-table
/// reorder, not a sequence of per-column alters.
#[test]
fn column_reorder_with_dependent_index_triggers_whole_table_reorder() {
    let config = DiffConfig { enable_drop: true, ..DiffConfig::default() };
    let engine = DiffEngine::new(&config);

    let before = base_table(
        "people",
        vec![
            column("id", DataType::Int, true),
            column("first_name", DataType::NVarChar { length: Some(50) }, false),
            column("last_name", DataType::NVarChar { length: Some(50) }, false),
        ],
    );
    let after = base_table(
        "people",
        vec![
            column("id", DataType::Int, true),
            column("last_name", DataType::NVarChar { length: Some(50) }, false),
            column("first_name", DataType::NVarChar { length: Some(50) }, false),
        ],
    );
    let index = IndexDef {
        name: Some(ident("ix_people_last_name")),
        owner: IndexOwner::Table(qualified("people")),
        columns: vec![IndexColumn { name: ident("last_name"), order: SortOrder::Asc }],
        unique: false,
        where_clause: None,
        extra: BTreeMap::new(),
    };

    let current = vec![
        minfold_core::SchemaObject::Table(before),
        minfold_core::SchemaObject::Index(index.clone()),
    ];
    let desired = vec![
        minfold_core::SchemaObject::Table(after),
        minfold_core::SchemaObject::Index(index),
    ];

    let ops = engine.diff(&current, &desired).expect("diff should succeed");
    assert!(
        ops.iter().any(|op| matches!(op, minfold_core::DiffOp::ReorderTable { .. })),
        "ordinal shift with an index-bearing survivor must trigger a whole-table reorder: {ops:?}"
    );

    let statements = render(&ops);
    let joined = statements.join("\n");
    assert!(joined.contains("INSERT INTO"), "reorder must copy data through a temp table: {joined}");
    assert!(joined.contains("SELECT"), "reorder copy must select from the original table: {joined}");
    assert!(joined.contains("DROP TABLE"), "original table must be dropped after the copy: {joined}");
    assert!(joined.contains("sp_rename"), "temp table must be renamed into the original's place: {joined}");
}

/// A table with exactly two data columns drops both of them while adding
/// one new column in the same diff. SQL Server forbids a zero-column
/// table, so the add must be ordered ahead of the drops.
#[test]
fn dropping_every_column_while_adding_one_orders_the_add_first() {
    let config = DiffConfig { enable_drop: true, ..DiffConfig::default() };
    let engine = DiffEngine::new(&config);

    let before = base_table(
        "legacy",
        vec![
            column("old_a", DataType::Int, true),
            column("old_b", DataType::Int, true),
        ],
    );
    let after = base_table("legacy", vec![column("new_c", DataType::Int, true)]);

    let ops = engine
        .diff(
            &[minfold_core::SchemaObject::Table(before)],
            &[minfold_core::SchemaObject::Table(after)],
        )
        .expect("diff should succeed");

    let add_index = ops
        .iter()
        .position(|op| matches!(op, minfold_core::DiffOp::AddColumn { .. }))
        .expect("new column must be added");
    let first_drop_index = ops
        .iter()
        .position(|op| matches!(op, minfold_core::DiffOp::DropColumn { .. }))
        .expect("old columns must be dropped");

    assert!(
        add_index < first_drop_index,
        "add must precede drops so the table never has zero data columns mid-script: {ops:?}"
    );

    let statements = render(&ops);
    let add_sql = statements
        .iter()
        .find(|sql| sql.contains("ADD [new_c]"))
        .expect("add of new_c must be rendered");
    assert!(
        add_sql.contains("DEFAULT 0"),
        "new_c is NOT NULL with no default of its own, so the add must synthesize one: {add_sql}"
    );
    assert!(
        add_sql.contains("CONSTRAINT [DF_legacy_new_c_"),
        "synthesized default must get a deterministic constraint name: {add_sql}"
    );
}

/// The primary key must be reasserted after a reorder. An unchanged PK is
/// carried inline in the reorder shell's `CREATE TABLE` rather than as a
/// separate `SetPrimaryKey` op — the shell table never exists without its
/// PK, so there is no window where it's missing.
#[test]
fn reorder_reestablishes_primary_key() {
    let config = DiffConfig { enable_drop: true, ..DiffConfig::default() };
    let engine = DiffEngine::new(&config);

    let pk = PrimaryKey { name: Some(ident("pk_people")), columns: vec![ident("id")], clustered: true };

    let mut before = base_table(
        "people",
        vec![
            column("id", DataType::Int, true),
            column("first_name", DataType::NVarChar { length: Some(50) }, false),
            column("last_name", DataType::NVarChar { length: Some(50) }, false),
        ],
    );
    before.primary_key = Some(pk.clone());
    let mut after = base_table(
        "people",
        vec![
            column("id", DataType::Int, true),
            column("last_name", DataType::NVarChar { length: Some(50) }, false),
            column("first_name", DataType::NVarChar { length: Some(50) }, false),
        ],
    );
    after.primary_key = Some(pk);
    let index = IndexDef {
        name: Some(ident("ix_people_last_name")),
        owner: IndexOwner::Table(qualified("people")),
        columns: vec![IndexColumn { name: ident("last_name"), order: SortOrder::Asc }],
        unique: false,
        where_clause: None,
        extra: BTreeMap::new(),
    };

    let current = vec![
        minfold_core::SchemaObject::Table(before),
        minfold_core::SchemaObject::Index(index.clone()),
    ];
    let desired = vec![minfold_core::SchemaObject::Table(after), minfold_core::SchemaObject::Index(index)];

    let ops = engine.diff(&current, &desired).expect("diff should succeed");
    assert!(
        ops.iter().any(|op| matches!(op, minfold_core::DiffOp::ReorderTable { .. })),
        "expected a reorder op: {ops:?}"
    );
    assert!(
        !ops.iter().any(|op| matches!(op, minfold_core::DiffOp::SetPrimaryKey { .. })),
        "an unchanged PK has no separate change to emit: {ops:?}"
    );

    let statements = render(&ops);
    let shell_create = statements
        .iter()
        .find(|sql| sql.contains("CREATE TABLE") && sql.contains("__minfold_reorder"))
        .expect("reorder shell CREATE TABLE statement");
    assert!(
        shell_create.contains("PRIMARY KEY"),
        "the reorder shell must carry the primary key inline, before the table can hold any rows: {shell_create}"
    );
}
