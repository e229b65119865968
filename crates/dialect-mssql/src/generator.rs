use std::fmt::Write as _;

use minfold_core::{
    Column, ColumnChange, DataType, DiffOp, Expr, ForeignKey, GenerateError, Ident, Literal,
    QualifiedName, Result, Statement, Table, Value,
};

use crate::naming;
use crate::sql::{ensure_sql_terminated, escape_sql_literal, render_data_type, render_expr, render_ident, render_qualified_name};
use crate::to_sql;

const GENERATOR_TARGET: &str = "mssql ddl generator";

pub(crate) fn generate_ddl(dialect_name: &str, ops: &[DiffOp]) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();

    // The trust-restoration protocol for re-added foreign keys is a
    // two-pass affair: every constraint is added WITH NOCHECK first (so a
    // cycle of re-added FKs never deadlocks on each other's existence), then
    // every one of them is dropped and recreated WITH CHECK once the whole
    // batch exists. A plain `ALTER TABLE ... CHECK CONSTRAINT` does not
    // reliably clear `is_not_trusted`; drop/recreate is the only reliable
    // path.
    let mut pending_trust: Vec<(QualifiedName, ForeignKey, Ident)> = Vec::new();

    for op in ops {
        emit_op(dialect_name, op, &mut statements, &mut pending_trust)?;
    }

    for (table, fk, name) in pending_trust {
        append_sql(
            &mut statements,
            format!("ALTER TABLE {} DROP CONSTRAINT {};", render_qualified_name(&table), render_ident(&name)),
        );

        let mut definition = to_sql::render_foreign_key(&fk);
        if fk.name.is_none() {
            definition = format!("CONSTRAINT {} {definition}", render_ident(&name));
        }
        append_sql(
            &mut statements,
            format!("ALTER TABLE {} WITH CHECK ADD {definition};", render_qualified_name(&table)),
        );
    }

    Ok(statements)
}

fn emit_op(
    dialect_name: &str,
    op: &DiffOp,
    out: &mut Vec<Statement>,
    pending_trust: &mut Vec<(QualifiedName, ForeignKey, Ident)>,
) -> Result<()> {
    match op {
        DiffOp::CreateTable(table) => {
            append_sql(out, to_sql::render_table(table)?);
        }
        DiffOp::DropTable(name) => {
            append_sql(out, to_sql::drop_table_sql(name));
        }
        DiffOp::AddColumn { table, column } => {
            append_sql(out, render_add_column(table, column));
        }
        DiffOp::DropColumn { table, column } => {
            emit_drop_column(table, column, out);
        }
        DiffOp::AlterColumn { table, before, after, changes } => {
            for statement in render_alter_column(table, before, after, changes) {
                append_sql(out, statement);
            }
        }
        DiffOp::RebuildColumn { table, before, after } => {
            for statement in render_rebuild_column(table, before, after) {
                append_sql(out, statement);
            }
        }
        DiffOp::ReorderTable { table, before, after } => {
            for statement in render_reorder_table(table, before, after) {
                append_sql(out, statement);
            }
        }
        DiffOp::AddIndex { index, .. } => {
            append_sql(out, to_sql::render_index(index)?);
        }
        DiffOp::DropIndex { table, name } => {
            append_sql(
                out,
                format!(
                    "DROP INDEX {} ON {};",
                    render_ident(name),
                    render_qualified_name(table)
                ),
            );
        }
        DiffOp::AddForeignKey { table, fk } => {
            emit_foreign_key_with_nocheck(table, fk, out, pending_trust);
        }
        DiffOp::DropForeignKey { table, name } => {
            append_sql(
                out,
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {};",
                    render_qualified_name(table),
                    render_ident(name)
                ),
            );
        }
        DiffOp::AddCheck { table, check } => {
            append_sql(
                out,
                format!(
                    "ALTER TABLE {} ADD {};",
                    render_qualified_name(table),
                    to_sql::render_check(check)
                ),
            );
        }
        DiffOp::DropCheck { table, name } => {
            append_sql(
                out,
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {};",
                    render_qualified_name(table),
                    render_ident(name)
                ),
            );
        }
        DiffOp::SetPrimaryKey { table, pk } => {
            append_sql(
                out,
                format!(
                    "ALTER TABLE {} ADD {};",
                    render_qualified_name(table),
                    to_sql::render_primary_key(pk)
                ),
            );
        }
        DiffOp::DropPrimaryKey { table } => {
            emit_drop_primary_key(table, out);
        }
        DiffOp::CreateSequence(sequence) => {
            append_sql(out, to_sql::render_sequence(sequence)?);
        }
        DiffOp::DropSequence(name) => {
            append_sql(
                out,
                format!("DROP SEQUENCE {};", render_qualified_name(name)),
            );
        }
        DiffOp::AlterSequence { name, changes } => {
            append_sql(out, render_alter_sequence(name, changes));
        }
        DiffOp::CreateOrAlterProcedure(procedure) => {
            append_sql(out, render_create_or_alter_procedure(&procedure.definition));
        }
        DiffOp::DropProcedure(name) => {
            append_sql(
                out,
                format!("DROP PROCEDURE {};", render_qualified_name(name)),
            );
        }
    }

    let _ = dialect_name;
    Ok(())
}

/// `DROP COLUMN` fails on SQL Server if a default constraint still
/// references the column, so the constraint is always dropped first.
fn emit_drop_column(table: &QualifiedName, column: &Column, out: &mut Vec<Statement>) {
    if column.default.is_some() {
        let name = default_constraint_name(table, column);
        append_sql(
            out,
            format!(
                "ALTER TABLE {} DROP CONSTRAINT {};",
                render_qualified_name(table),
                render_ident(&name)
            ),
        );
    }
    append_sql(
        out,
        format!(
            "ALTER TABLE {} DROP COLUMN {};",
            render_qualified_name(table),
            render_ident(&column.name)
        ),
    );
}

fn default_constraint_name(table: &QualifiedName, column: &Column) -> Ident {
    match column.extra.get(minfold_core::extra_keys::mssql::DEFAULT_CONSTRAINT_NAME) {
        Some(Value::String(name)) => Ident::unquoted(name.clone()),
        _ => {
            let normalized_default = column.default.as_ref().map(render_expr);
            Ident::unquoted(naming::default_constraint_name(
                table,
                &column.name,
                normalized_default.as_deref(),
            ))
        }
    }
}

/// `ALTER TABLE ... ADD <col> ... NOT NULL` is rejected outright against a
/// populated table unless the new column carries a default in the same
/// statement, and the generator has no way to know at generation time
/// whether the target table holds any rows. A `NOT NULL` column with no
/// default of its own is therefore always given a deterministic
/// placeholder value here, named the same way every other default
/// constraint in this generator is.
fn render_add_column(table: &QualifiedName, column: &Column) -> String {
    let mut column = column.clone();
    if column.not_null && column.default.is_none() {
        column.default = placeholder_default(&column.data_type);
    }
    if column.default.is_some() {
        let name = default_constraint_name(table, &column);
        column.extra.insert(
            minfold_core::extra_keys::mssql::DEFAULT_CONSTRAINT_NAME.to_string(),
            Value::String(name.value),
        );
    }
    format!(
        "ALTER TABLE {} ADD {};",
        render_qualified_name(table),
        to_sql::render_column_definition(&column)
    )
}

/// A type-appropriate zero value for [`render_add_column`]'s synthesized
/// default. `rowversion` is server-assigned and never takes a user
/// default; an opaque `Custom` type is left alone since there's no safe
/// way to guess its shape.
fn placeholder_default(data_type: &DataType) -> Option<Expr> {
    use DataType::*;
    match data_type {
        Bit => Some(Expr::Literal(Literal::Boolean(false))),
        TinyInt | SmallInt | Int | BigInt | Decimal { .. } | Numeric { .. } | Money | SmallMoney
        | Real | Float { .. } => Some(Expr::Literal(Literal::Integer(0))),
        Char { .. } | VarChar { .. } | NChar { .. } | NVarChar { .. } | Text | NText => {
            Some(Expr::Literal(Literal::String(String::new())))
        }
        Binary { .. } | VarBinary { .. } | Image => Some(Expr::Raw("0x".to_string())),
        Date => Some(Expr::Raw("'1900-01-01'".to_string())),
        Time { .. } => Some(Expr::Raw("'00:00:00'".to_string())),
        DateTime | DateTime2 { .. } | SmallDateTime | DateTimeOffset { .. } => {
            Some(Expr::Raw("'1900-01-01T00:00:00'".to_string()))
        }
        UniqueIdentifier => Some(Expr::Raw("'00000000-0000-0000-0000-000000000000'".to_string())),
        Xml => Some(Expr::Raw("''".to_string())),
        RowVersion | Custom(_) => None,
    }
}

/// `ALTER COLUMN` carries type, nullability and collation; a default lives
/// in its own constraint object and is drop-then-added separately.
fn render_alter_column(
    table: &QualifiedName,
    before: &Column,
    after: &Column,
    changes: &[ColumnChange],
) -> Vec<String> {
    let mut statements = Vec::new();

    let shape_changed = changes
        .iter()
        .any(|change| matches!(change, ColumnChange::SetType(_) | ColumnChange::SetNotNull(_) | ColumnChange::SetCollation(_)));

    if shape_changed {
        let mut sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            render_qualified_name(table),
            render_ident(&after.name),
            render_data_type(&after.data_type)
        );
        sql.push_str(if after.not_null { " NOT NULL" } else { " NULL" });
        if let Some(collation) = &after.collation {
            write!(sql, " COLLATE {}", collation.trim()).expect("write to String");
        }
        statements.push(ensure_sql_terminated(&sql));
    }

    if changes.iter().any(|change| matches!(change, ColumnChange::SetDefault(_))) {
        if before.default.is_some() {
            let name = default_constraint_name(table, before);
            statements.push(ensure_sql_terminated(&format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                render_qualified_name(table),
                render_ident(&name)
            )));
        }
        if let Some(new_default) = &after.default {
            let name = default_constraint_name(table, after);
            statements.push(ensure_sql_terminated(&format!(
                "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {} FOR {}",
                render_qualified_name(table),
                render_ident(&name),
                render_expr(new_default),
                render_ident(&after.name)
            )));
        }
    }

    statements
}

/// Rebuild protocol for a column whose new shape can't be reached by
/// `ALTER COLUMN` alone: add the replacement under a transitional name,
/// copy data across, drop the original, rename into place. An identity
/// column can't carry copied values (SQL Server assigns them on insert),
/// so an identity target skips the copy step and lets the server
/// sequence the column instead.
fn render_rebuild_column(table: &QualifiedName, before: &Column, after: &Column) -> Vec<String> {
    let mut statements = Vec::new();
    let temp_name = Ident::quoted(naming::rebuild_temp_column_name(table, &after.name));
    let table_sql = render_qualified_name(table);

    let mut add_sql = format!("{} {}", render_ident(&temp_name), render_data_type(&after.data_type));
    if let Some(identity) = &after.identity {
        write!(add_sql, " IDENTITY({},{})", identity.seed, identity.increment).expect("write to String");
    }
    add_sql.push_str(" NULL");
    statements.push(ensure_sql_terminated(&format!(
        "ALTER TABLE {table_sql} ADD {add_sql}"
    )));

    if after.identity.is_none() {
        statements.push(ensure_sql_terminated(&format!(
            "UPDATE {table_sql} SET {} = CAST({} AS {})",
            render_ident(&temp_name),
            render_ident(&before.name),
            render_data_type(&after.data_type)
        )));
    }

    if after.not_null {
        let mut sql = format!(
            "ALTER TABLE {table_sql} ALTER COLUMN {} {}",
            render_ident(&temp_name),
            render_data_type(&after.data_type)
        );
        sql.push_str(" NOT NULL");
        statements.push(ensure_sql_terminated(&sql));
    }

    if before.default.is_some() {
        let name = default_constraint_name(table, before);
        statements.push(ensure_sql_terminated(&format!(
            "ALTER TABLE {table_sql} DROP CONSTRAINT {}",
            render_ident(&name)
        )));
    }

    statements.push(ensure_sql_terminated(&format!(
        "ALTER TABLE {table_sql} DROP COLUMN {}",
        render_ident(&before.name)
    )));

    statements.push(render_sp_rename_column(table, &temp_name, &after.name));

    if let Some(new_default) = &after.default {
        let name = default_constraint_name(table, after);
        statements.push(ensure_sql_terminated(&format!(
            "ALTER TABLE {table_sql} ADD CONSTRAINT {} DEFAULT {} FOR {}",
            render_ident(&name),
            render_expr(new_default),
            render_ident(&after.name)
        )));
    }

    statements
}

/// Whole-table reorder: a column's ordinal position isn't reachable
/// through any `ALTER TABLE` verb, so the table is copied through a
/// same-shape replacement in the desired column order. Identity columns
/// are copied verbatim under `SET IDENTITY_INSERT ON` so surrogate keys
/// survive the swap.
fn render_reorder_table(table: &QualifiedName, before: &Table, after: &Table) -> Vec<String> {
    let mut statements = Vec::new();
    let temp_table = QualifiedName {
        schema: table.schema.clone(),
        name: Ident::quoted(naming::reorder_temp_table_name(table)),
    };

    // Foreign keys are never embedded in the temp shell: the diff engine
    // already emits them as standalone `AddForeignKey` ops (dropping any
    // inbound ones from other tables first), the same protocol a brand
    // new table's FKs go through, so a reorder never has to reason about
    // whether a referenced table exists yet.
    let mut shell = after.clone();
    shell.name = temp_table.clone();
    shell.foreign_keys.clear();
    statements.push(
        to_sql::render_table(&shell).unwrap_or_else(|_| {
            ensure_sql_terminated(&format!(
                "-- unable to render reorder shell for {}",
                render_qualified_name(table)
            ))
        }),
    );

    let has_identity = after.columns.iter().any(|c| c.identity.is_some());
    let column_list = after
        .columns
        .iter()
        .map(|c| render_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    if has_identity {
        statements.push(ensure_sql_terminated(&format!(
            "SET IDENTITY_INSERT {} ON",
            render_qualified_name(&temp_table)
        )));
    }

    statements.push(ensure_sql_terminated(&format!(
        "INSERT INTO {} ({column_list}) SELECT {column_list} FROM {}",
        render_qualified_name(&temp_table),
        render_qualified_name(table)
    )));

    if has_identity {
        statements.push(ensure_sql_terminated(&format!(
            "SET IDENTITY_INSERT {} OFF",
            render_qualified_name(&temp_table)
        )));
    }

    statements.push(to_sql::drop_table_sql(table));
    statements.push(render_sp_rename_table(&temp_table, &table.name));

    let _ = before;
    statements
}

fn render_sp_rename_column(table: &QualifiedName, from: &Ident, to: &Ident) -> String {
    let target = format!("{}.{}", sp_rename_table_target(table), from.value);
    render_sp_rename(&target, &to.value, Some("COLUMN"))
}

fn render_sp_rename_table(temp_table: &QualifiedName, final_name: &Ident) -> String {
    render_sp_rename(&sp_rename_table_target(temp_table), &final_name.value, None)
}

fn render_sp_rename(target: &str, new_name: &str, kind: Option<&str>) -> String {
    let escaped_target = escape_sql_literal(target);
    let escaped_new_name = escape_sql_literal(new_name);
    match kind {
        Some(kind) => format!("EXEC sp_rename '{escaped_target}', '{escaped_new_name}', '{kind}';"),
        None => format!("EXEC sp_rename '{escaped_target}', '{escaped_new_name}';"),
    }
}

fn sp_rename_table_target(table: &QualifiedName) -> String {
    if let Some(schema) = &table.schema {
        format!("{}.{}", schema.value, table.name.value)
    } else {
        table.name.value.clone()
    }
}

/// Re-added foreign keys are added untrusted first so a cycle of mutually
/// referencing constraints never blocks on each other, then trusted in a
/// second pass once the whole phase's batch exists (see
/// [`generate_ddl`]).
fn emit_foreign_key_with_nocheck(
    table: &QualifiedName,
    fk: &ForeignKey,
    out: &mut Vec<Statement>,
    pending_trust: &mut Vec<(QualifiedName, ForeignKey, Ident)>,
) {
    let name = fk
        .name
        .clone()
        .unwrap_or_else(|| Ident::unquoted(format!("FK_{}_{}", table.name.value, fk.columns[0].value)));

    let mut definition = to_sql::render_foreign_key(fk);
    if fk.name.is_none() {
        definition = format!("CONSTRAINT {} {definition}", render_ident(&name));
    }

    append_sql(
        out,
        format!(
            "ALTER TABLE {} WITH NOCHECK ADD {definition};",
            render_qualified_name(table)
        ),
    );

    if !fk_not_enforced(fk) {
        pending_trust.push((table.clone(), fk.clone(), name));
    }
}

/// A foreign key marked not-enforced stays `WITH NOCHECK` forever: it never
/// gets a second-pass `WITH CHECK CHECK CONSTRAINT`.
fn fk_not_enforced(fk: &ForeignKey) -> bool {
    matches!(
        fk.extra.get(minfold_core::extra_keys::FK_NOT_ENFORCED),
        Some(minfold_core::Value::Bool(true))
    )
}

/// `DropPrimaryKey` carries no constraint name (SQL Server assigns one
/// automatically when a table is created without `CONSTRAINT ... PRIMARY
/// KEY`), so the name is resolved from the catalog at execution time via
/// dynamic SQL rather than threaded through the diff.
fn emit_drop_primary_key(table: &QualifiedName, out: &mut Vec<Statement>) {
    let escaped_table = escape_sql_literal(&sp_rename_table_target(table));
    let sql = format!(
        "DECLARE @pk_name sysname = (SELECT kc.name FROM sys.key_constraints kc \
         WHERE kc.parent_object_id = OBJECT_ID(N'{escaped_table}') AND kc.type = 'PK'); \
         EXEC('ALTER TABLE {} DROP CONSTRAINT ' + QUOTENAME(@pk_name));",
        render_qualified_name(table)
    );
    append_sql(out, sql);
}

fn render_alter_sequence(name: &QualifiedName, changes: &[minfold_core::SequenceChange]) -> String {
    use minfold_core::SequenceChange;

    let mut sql = format!("ALTER SEQUENCE {}", render_qualified_name(name));
    for change in changes {
        match change {
            SequenceChange::SetType(_) => {
                // SQL Server cannot alter a sequence's base type in place;
                // a type change is expected to arrive as drop+create.
            }
            SequenceChange::SetIncrement(value) => {
                write!(sql, " INCREMENT BY {value}").expect("write to String");
            }
            SequenceChange::SetMinValue(Some(value)) => {
                write!(sql, " MINVALUE {value}").expect("write to String");
            }
            SequenceChange::SetMinValue(None) => sql.push_str(" NO MINVALUE"),
            SequenceChange::SetMaxValue(Some(value)) => {
                write!(sql, " MAXVALUE {value}").expect("write to String");
            }
            SequenceChange::SetMaxValue(None) => sql.push_str(" NO MAXVALUE"),
            SequenceChange::SetStart(value) => {
                write!(sql, " RESTART WITH {value}").expect("write to String");
            }
            SequenceChange::SetCache(Some(value)) => {
                write!(sql, " CACHE {value}").expect("write to String");
            }
            SequenceChange::SetCache(None) => sql.push_str(" NO CACHE"),
            SequenceChange::SetCycle(true) => sql.push_str(" CYCLE"),
            SequenceChange::SetCycle(false) => sql.push_str(" NO CYCLE"),
        }
    }
    ensure_sql_terminated(&sql)
}

/// `CREATE OR ALTER PROCEDURE` is the idempotent form SQL Server supports
/// since 2016; the stored definition is kept as the author wrote it
/// (`CREATE PROCEDURE` or `CREATE PROC`), so the leading keywords are
/// rewritten rather than assumed.
fn render_create_or_alter_procedure(definition: &str) -> String {
    let trimmed = definition.trim_start();
    let lower = trimmed.to_ascii_lowercase();

    let rewritten = if lower.starts_with("create or alter") {
        trimmed.to_string()
    } else if let Some(rest) = lower.strip_prefix("create procedure") {
        format!("CREATE OR ALTER PROCEDURE{}", &trimmed[trimmed.len() - rest.len()..])
    } else if let Some(rest) = lower.strip_prefix("create proc") {
        format!("CREATE OR ALTER PROC{}", &trimmed[trimmed.len() - rest.len()..])
    } else {
        format!("CREATE OR ALTER PROCEDURE {trimmed}")
    };

    ensure_sql_terminated(&rewritten)
}

fn append_sql(out: &mut Vec<Statement>, sql: String) {
    if matches!(out.last(), Some(Statement::Sql { .. })) {
        out.push(Statement::BatchBoundary);
    }
    out.push(sql_statement(sql));
}

fn sql_statement(sql: String) -> Statement {
    Statement::Sql {
        sql: ensure_sql_terminated(&sql),
        transactional: true,
        context: None,
    }
}

#[allow(dead_code)]
fn unsupported_diff_op(dialect_name: &str, op: &DiffOp, target: impl Into<String>) -> minfold_core::Error {
    GenerateError::UnsupportedDiffOp {
        diff_op: diff_op_tag(op).to_string(),
        target: target.into(),
        dialect: dialect_name.to_string(),
    }
    .into()
}

fn diff_op_tag(op: &DiffOp) -> &'static str {
    match op {
        DiffOp::CreateTable(_) => "CreateTable",
        DiffOp::DropTable(_) => "DropTable",
        DiffOp::AddColumn { .. } => "AddColumn",
        DiffOp::DropColumn { .. } => "DropColumn",
        DiffOp::AlterColumn { .. } => "AlterColumn",
        DiffOp::RebuildColumn { .. } => "RebuildColumn",
        DiffOp::ReorderTable { .. } => "ReorderTable",
        DiffOp::AddIndex { .. } => "AddIndex",
        DiffOp::DropIndex { .. } => "DropIndex",
        DiffOp::AddForeignKey { .. } => "AddForeignKey",
        DiffOp::DropForeignKey { .. } => "DropForeignKey",
        DiffOp::AddCheck { .. } => "AddCheck",
        DiffOp::DropCheck { .. } => "DropCheck",
        DiffOp::SetPrimaryKey { .. } => "SetPrimaryKey",
        DiffOp::DropPrimaryKey { .. } => "DropPrimaryKey",
        DiffOp::CreateSequence(_) => "CreateSequence",
        DiffOp::DropSequence(_) => "DropSequence",
        DiffOp::AlterSequence { .. } => "AlterSequence",
        DiffOp::CreateOrAlterProcedure(_) => "CreateOrAlterProcedure",
        DiffOp::DropProcedure(_) => "DropProcedure",
    }
}
