use std::fmt::Write as _;

use minfold_core::{
    CheckConstraint, Column, ForeignKey, Ident, IndexDef, IndexOwner, PrimaryKey, QualifiedName,
    Result, SchemaObject, Sequence, StoredProcedure, Table, Value,
};

use minfold_core::extra_keys;

use crate::sql::{
    ensure_sql_terminated, render_data_type, render_expr, render_fk_action, render_ident,
    render_qualified_name,
};

/// Renders a schema object as the `CREATE` statement that would reproduce
/// it, used for `minfold export` and for the `CreateTable`/`AddIndex`/
/// `CreateSequence`/`CreateOrAlterProcedure` diff ops.
pub(crate) fn render_object(object: &SchemaObject) -> Result<String> {
    match object {
        SchemaObject::Table(table) => render_table(table),
        SchemaObject::Index(index) => render_index(index),
        SchemaObject::Sequence(sequence) => render_sequence(sequence),
        SchemaObject::StoredProcedure(procedure) => Ok(render_procedure(procedure)),
    }
}

pub(crate) fn render_table(table: &Table) -> Result<String> {
    let mut body_parts = Vec::new();

    for column in &table.columns {
        body_parts.push(render_column_definition(column));
    }
    if let Some(pk) = &table.primary_key {
        body_parts.push(render_primary_key(pk));
    }
    for fk in &table.foreign_keys {
        body_parts.push(render_foreign_key(fk));
    }
    for check in &table.checks {
        body_parts.push(render_check(check));
    }

    let mut sql = format!("CREATE TABLE {} (\n", render_qualified_name(&table.name));
    sql.push_str(
        &body_parts
            .iter()
            .map(|part| format!("    {part}"))
            .collect::<Vec<_>>()
            .join(",\n"),
    );
    sql.push_str("\n)");
    Ok(ensure_sql_terminated(&sql))
}

pub(crate) fn render_column_definition(column: &Column) -> String {
    let mut sql = format!("{} {}", render_ident(&column.name), render_data_type(&column.data_type));

    if let Some(default) = &column.default {
        if let Some(Value::String(name)) =
            column.extra.get(extra_keys::mssql::DEFAULT_CONSTRAINT_NAME)
        {
            write!(
                sql,
                " CONSTRAINT {} DEFAULT {}",
                render_ident(&Ident::unquoted(name.clone())),
                render_expr(default)
            )
            .expect("write to String");
        } else {
            write!(sql, " DEFAULT {}", render_expr(default)).expect("write to String");
        }
    }

    if let Some(identity) = &column.identity {
        write!(sql, " IDENTITY({},{})", identity.seed, identity.increment).expect("write to String");
        if identity.not_for_replication {
            sql.push_str(" NOT FOR REPLICATION");
        }
    }

    if let Some(generated) = &column.generated {
        write!(sql, " AS {}", render_expr(&generated.expr)).expect("write to String");
        if generated.persisted {
            sql.push_str(" PERSISTED");
        }
    }

    sql.push_str(if column.not_null { " NOT NULL" } else { " NULL" });

    if let Some(collation) = &column.collation {
        write!(sql, " COLLATE {}", collation.trim()).expect("write to String");
    }

    sql
}

pub(crate) fn render_foreign_key(foreign_key: &ForeignKey) -> String {
    let mut sql = String::new();
    if let Some(name) = &foreign_key.name {
        write!(sql, "CONSTRAINT {} ", render_ident(name)).expect("write to String");
    }
    write!(
        sql,
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        foreign_key.columns.iter().map(render_ident).collect::<Vec<_>>().join(", "),
        render_qualified_name(&foreign_key.referenced_table),
        foreign_key.referenced_columns.iter().map(render_ident).collect::<Vec<_>>().join(", "),
    )
    .expect("write to String");

    if let Some(on_delete) = foreign_key.on_delete {
        write!(sql, " ON DELETE {}", render_fk_action(on_delete)).expect("write to String");
    }
    if let Some(on_update) = foreign_key.on_update {
        write!(sql, " ON UPDATE {}", render_fk_action(on_update)).expect("write to String");
    }
    sql
}

pub(crate) fn render_check(check: &CheckConstraint) -> String {
    if let Some(name) = &check.name {
        format!("CONSTRAINT {} CHECK ({})", render_ident(name), render_expr(&check.expr))
    } else {
        format!("CHECK ({})", render_expr(&check.expr))
    }
}

pub(crate) fn render_primary_key(pk: &PrimaryKey) -> String {
    let mut sql = String::new();
    if let Some(name) = &pk.name {
        write!(sql, "CONSTRAINT {} ", render_ident(name)).expect("write to String");
    }
    write!(
        sql,
        "PRIMARY KEY {}({})",
        if pk.clustered { "CLUSTERED " } else { "NONCLUSTERED " },
        pk.columns.iter().map(render_ident).collect::<Vec<_>>().join(", "),
    )
    .expect("write to String");
    sql
}

pub(crate) fn render_index(index: &IndexDef) -> Result<String> {
    let IndexOwner::Table(table) = &index.owner;
    let name = index
        .name
        .clone()
        .unwrap_or_else(|| Ident::unquoted(format!("IX_{}", table.name.value)));

    let mut sql = String::from("CREATE ");
    if index.unique {
        sql.push_str("UNIQUE ");
    }
    if index.is_clustered() {
        sql.push_str("CLUSTERED ");
    } else {
        sql.push_str("NONCLUSTERED ");
    }
    write!(
        sql,
        "INDEX {} ON {} ({})",
        render_ident(&name),
        render_qualified_name(table),
        index
            .columns
            .iter()
            .map(|c| format!(
                "{} {}",
                render_ident(&c.name),
                match c.order {
                    minfold_core::SortOrder::Asc => "ASC",
                    minfold_core::SortOrder::Desc => "DESC",
                }
            ))
            .collect::<Vec<_>>()
            .join(", "),
    )
    .expect("write to String");

    if let Some(predicate) = &index.where_clause {
        write!(sql, " WHERE {}", render_expr(predicate)).expect("write to String");
    }

    Ok(ensure_sql_terminated(&sql))
}

pub(crate) fn render_sequence(sequence: &Sequence) -> Result<String> {
    let mut sql = format!("CREATE SEQUENCE {}", render_qualified_name(&sequence.name));
    if let Some(data_type) = &sequence.data_type {
        write!(sql, " AS {}", render_data_type(data_type)).expect("write to String");
    }
    if let Some(start) = sequence.start {
        write!(sql, " START WITH {start}").expect("write to String");
    }
    if let Some(increment) = sequence.increment {
        write!(sql, " INCREMENT BY {increment}").expect("write to String");
    }
    if let Some(min_value) = sequence.min_value {
        write!(sql, " MINVALUE {min_value}").expect("write to String");
    }
    if let Some(max_value) = sequence.max_value {
        write!(sql, " MAXVALUE {max_value}").expect("write to String");
    }
    if let Some(cache) = sequence.cache {
        write!(sql, " CACHE {cache}").expect("write to String");
    }
    sql.push_str(if sequence.cycle { " CYCLE" } else { " NO CYCLE" });
    Ok(ensure_sql_terminated(&sql))
}

/// Stored procedures are kept as opaque text; rendering for export just
/// reflows the source back out unchanged.
pub(crate) fn render_procedure(procedure: &StoredProcedure) -> String {
    ensure_sql_terminated(&procedure.definition)
}

pub(crate) fn drop_table_sql(name: &QualifiedName) -> String {
    ensure_sql_terminated(&format!("DROP TABLE {}", render_qualified_name(name)))
}
