use crate::{DiffOp, QualifiedName};

/// The thirteen named phases a migration script is organized into. Listed
/// in execution order; a phase with no ops in it is omitted entirely from
/// the rendered script rather than leaving an empty, titled gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    DropForeignKeys,
    DropProcedures,
    DropIndexes,
    DropPrimaryKeys,
    DropTables,
    DropSequences,
    CreateSequences,
    CreateTables,
    AlterTableColumns,
    RecreatePrimaryKeys,
    RecreateIndexes,
    RecreateForeignKeys,
    CreateOrAlterProcedures,
}

impl Phase {
    pub const ORDER: [Phase; 13] = [
        Phase::DropForeignKeys,
        Phase::DropProcedures,
        Phase::DropIndexes,
        Phase::DropPrimaryKeys,
        Phase::DropTables,
        Phase::DropSequences,
        Phase::CreateSequences,
        Phase::CreateTables,
        Phase::AlterTableColumns,
        Phase::RecreatePrimaryKeys,
        Phase::RecreateIndexes,
        Phase::RecreateForeignKeys,
        Phase::CreateOrAlterProcedures,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Phase::DropForeignKeys => "Drop foreign keys",
            Phase::DropProcedures => "Drop stored procedures",
            Phase::DropIndexes => "Drop indexes",
            Phase::DropPrimaryKeys => "Drop primary keys",
            Phase::DropTables => "Drop tables",
            Phase::DropSequences => "Drop sequences",
            Phase::CreateSequences => "Create sequences",
            Phase::CreateTables => "Create tables",
            Phase::AlterTableColumns => "Alter table columns",
            Phase::RecreatePrimaryKeys => "Recreate primary keys",
            Phase::RecreateIndexes => "Recreate indexes",
            Phase::RecreateForeignKeys => "Recreate foreign keys",
            Phase::CreateOrAlterProcedures => "Create or alter stored procedures",
        }
    }

    fn of(op: &DiffOp) -> Phase {
        match op {
            DiffOp::DropForeignKey { .. } => Phase::DropForeignKeys,
            DiffOp::DropProcedure(_) => Phase::DropProcedures,
            DiffOp::DropIndex { .. } => Phase::DropIndexes,
            DiffOp::DropPrimaryKey { .. } => Phase::DropPrimaryKeys,
            DiffOp::DropTable(_) => Phase::DropTables,
            DiffOp::DropSequence(_) => Phase::DropSequences,
            DiffOp::CreateSequence(_) | DiffOp::AlterSequence { .. } => Phase::CreateSequences,
            DiffOp::CreateTable(_) => Phase::CreateTables,
            DiffOp::AddColumn { .. }
            | DiffOp::DropColumn { .. }
            | DiffOp::AlterColumn { .. }
            | DiffOp::RebuildColumn { .. }
            | DiffOp::ReorderTable { .. }
            | DiffOp::AddCheck { .. }
            | DiffOp::DropCheck { .. } => Phase::AlterTableColumns,
            DiffOp::SetPrimaryKey { .. } => Phase::RecreatePrimaryKeys,
            DiffOp::AddIndex { .. } => Phase::RecreateIndexes,
            DiffOp::AddForeignKey { .. } => Phase::RecreateForeignKeys,
            DiffOp::CreateOrAlterProcedure(_) => Phase::CreateOrAlterProcedures,
        }
    }
}

/// Sub-order within the `Alter table columns` phase, per table. The default
/// shape is: structural drops first (so nothing downstream references a
/// column about to disappear), then rebuilds and reorders (each
/// self-contained, copy-based operations), then in-place alters, then
/// additions last. The differ itself reverses add/drop for a given table
/// when dropping first would momentarily leave it with zero columns (see
/// `diff_table_body`), so column and check ops are kept in the relative
/// order the differ emitted them in rather than re-sorted here — only
/// check-constraint ops are pinned to the outer edges of that order.
fn column_op_rank(op: &DiffOp) -> u8 {
    match op {
        DiffOp::DropCheck { .. } => 0,
        DiffOp::AddColumn { .. }
        | DiffOp::DropColumn { .. }
        | DiffOp::RebuildColumn { .. }
        | DiffOp::ReorderTable { .. }
        | DiffOp::AlterColumn { .. } => 1,
        DiffOp::AddCheck { .. } => 2,
        _ => 1,
    }
}

fn table_of(op: &DiffOp) -> Option<&QualifiedName> {
    match op {
        DiffOp::AddColumn { table, .. }
        | DiffOp::DropColumn { table, .. }
        | DiffOp::AlterColumn { table, .. }
        | DiffOp::RebuildColumn { table, .. }
        | DiffOp::ReorderTable { table, .. }
        | DiffOp::AddIndex { table, .. }
        | DiffOp::DropIndex { table, .. }
        | DiffOp::AddForeignKey { table, .. }
        | DiffOp::DropForeignKey { table, .. }
        | DiffOp::AddCheck { table, .. }
        | DiffOp::DropCheck { table, .. }
        | DiffOp::SetPrimaryKey { table, .. }
        | DiffOp::DropPrimaryKey { table } => Some(table),
        DiffOp::CreateTable(t) => Some(&t.name),
        DiffOp::DropTable(name) => Some(name),
        _ => None,
    }
}

/// Stable sort of a flat op list into phase order, preserving the relative
/// order the differ produced within a phase except for the `Alter table
/// columns` phase, which additionally groups by table and sub-orders by
/// [`column_op_rank`].
#[must_use]
pub fn sort_diff_ops(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut indexed: Vec<(usize, DiffOp)> = ops.into_iter().enumerate().collect();

    indexed.sort_by(|(a_index, a_op), (b_index, b_op)| {
        let a_phase = Phase::of(a_op);
        let b_phase = Phase::of(b_op);
        a_phase
            .cmp(&b_phase)
            .then_with(|| {
                if a_phase == Phase::AlterTableColumns {
                    let a_table = table_of(a_op).map(QualifiedName::fold);
                    let b_table = table_of(b_op).map(QualifiedName::fold);
                    a_table
                        .cmp(&b_table)
                        .then_with(|| column_op_rank(a_op).cmp(&column_op_rank(b_op)))
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .then_with(|| a_index.cmp(b_index))
    });

    indexed.into_iter().map(|(_, op)| op).collect()
}

/// Groups an already-sorted op list by phase, in phase order, dropping any
/// phase with nothing in it.
#[must_use]
pub fn group_by_phase(ops: Vec<DiffOp>) -> Vec<(Phase, Vec<DiffOp>)> {
    let sorted = sort_diff_ops(ops);
    Phase::ORDER
        .into_iter()
        .map(|phase| {
            let ops_in_phase: Vec<DiffOp> = sorted
                .iter()
                .filter(|op| Phase::of(op) == phase)
                .cloned()
                .collect();
            (phase, ops_in_phase)
        })
        .filter(|(_, ops)| !ops.is_empty())
        .collect()
}
