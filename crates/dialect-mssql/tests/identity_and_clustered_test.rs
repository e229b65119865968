use std::collections::BTreeMap;

use minfold_core::{
    Column, DataType, Dialect, DiffOp, Ident, Identity, IndexColumn, IndexDef, IndexOwner,
    QualifiedName, SortOrder, Statement, Table, TableOptions, Value, extra_keys,
};
use minfold_dialect_mssql::MssqlDialect;

#[test]
fn identity_clustered_and_not_for_replication_are_rendered() {
    let dialect = MssqlDialect;

    let table = Table {
        name: qualified(Some("dbo"), "users"),
        columns: vec![Column {
            name: Ident::unquoted("id"),
            data_type: DataType::BigInt,
            not_null: true,
            default: None,
            identity: Some(Identity {
                seed: 7,
                increment: 9,
                not_for_replication: true,
            }),
            generated: None,
            collation: None,
            extra: BTreeMap::new(),
        }],
        primary_key: None,
        foreign_keys: Vec::new(),
        checks: Vec::new(),
        options: TableOptions::default(),
    };

    let index = IndexDef {
        name: Some(Ident::unquoted("ix_users_id")),
        owner: IndexOwner::Table(qualified(Some("dbo"), "users")),
        columns: vec![IndexColumn {
            name: Ident::unquoted("id"),
            order: SortOrder::Asc,
        }],
        unique: true,
        where_clause: None,
        extra: BTreeMap::from([(
            extra_keys::INDEX_CLUSTERED.to_string(),
            Value::Bool(true),
        )]),
    };

    let statements = dialect
        .generate_ddl(&[
            DiffOp::CreateTable(table),
            DiffOp::AddIndex {
                table: qualified(Some("dbo"), "users"),
                index,
            },
        ])
        .expect("identity/clustered ops should be generated");

    assert_eq!(statements.len(), 3);
    assert!(matches!(statements[1], Statement::BatchBoundary));

    let first_sql = statement_sql(&statements[0]);
    assert!(
        first_sql.contains("IDENTITY(7,9) NOT FOR REPLICATION"),
        "expected IDENTITY with NOT FOR REPLICATION, got: {first_sql}"
    );

    let second_sql = statement_sql(&statements[2]);
    assert!(
        second_sql.starts_with("CREATE UNIQUE CLUSTERED INDEX"),
        "expected clustered index SQL, got: {second_sql}"
    );
}

fn statement_sql(statement: &Statement) -> &str {
    match statement {
        Statement::Sql { sql, .. } => sql,
        Statement::BatchBoundary => panic!("expected SQL statement"),
    }
}

fn qualified(schema: Option<&str>, name: &str) -> QualifiedName {
    QualifiedName {
        schema: schema.map(Ident::unquoted),
        name: Ident::unquoted(name),
    }
}
