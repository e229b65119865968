use crate::DiffOp;

#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    pub ops: Vec<DiffOp>,
    pub diagnostics: DiffDiagnostics,
}

impl DiffOutcome {
    #[must_use]
    pub fn new(ops: Vec<DiffOp>, diagnostics: DiffDiagnostics) -> Self {
        Self { ops, diagnostics }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiffDiagnostics {
    pub skipped_ops: Vec<SkippedOpDiagnostic>,
}

impl DiffDiagnostics {
    /// Builds a diagnostics report from the full op list the differ would
    /// have emitted with drops enabled and the op list actually emitted
    /// with them suppressed.
    #[must_use]
    pub fn from_enable_drop(full_ops: &[DiffOp], emitted_ops: &[DiffOp]) -> Self {
        let mut unmatched_emitted = emitted_ops.to_vec();
        let mut skipped_ops = Vec::new();

        for op in full_ops {
            let Some(kind) = skipped_op_kind(op) else {
                continue;
            };

            if let Some(position) = unmatched_emitted
                .iter()
                .position(|emitted_op| emitted_op == op)
            {
                unmatched_emitted.remove(position);
                continue;
            }

            skipped_ops.push(SkippedOpDiagnostic {
                kind,
                op: op.clone(),
            });
        }

        Self { skipped_ops }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skipped_ops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOpDiagnostic {
    pub kind: SkippedOpKind,
    pub op: DiffOp,
}

/// Destructive op shapes a caller may opt to suppress (`enable_drop: false`)
/// rather than execute. Suppressing one of these never blocks the rest of
/// the migration; it just leaves the corresponding object behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkippedOpKind {
    DropTable,
    DropColumn,
    DropIndex,
    DropForeignKey,
    DropCheck,
    DropPrimaryKey,
    DropSequence,
    DropProcedure,
}

pub const SUPPRESSED_OP_KINDS: [SkippedOpKind; 8] = [
    SkippedOpKind::DropTable,
    SkippedOpKind::DropColumn,
    SkippedOpKind::DropIndex,
    SkippedOpKind::DropForeignKey,
    SkippedOpKind::DropCheck,
    SkippedOpKind::DropPrimaryKey,
    SkippedOpKind::DropSequence,
    SkippedOpKind::DropProcedure,
];

#[must_use]
pub fn skipped_op_kind(op: &DiffOp) -> Option<SkippedOpKind> {
    SUPPRESSED_OP_KINDS
        .into_iter()
        .find(|kind| kind.matches(op))
}

/// True when `op` is a drop half of a modify pair — a same-named `Add*`
/// (or `SetPrimaryKey`/`CreateSequence`) for the same table also appears in
/// `full_ops`. SQL Server has no in-place `ALTER CHECK`/`ALTER FOREIGN
/// KEY`/`ALTER SEQUENCE` for every property, so a modify is expressed as
/// drop-then-add even though nothing is actually being removed; suppressing
/// the drop half under `enable_drop: false` would leave a stray duplicate
/// or a dangling reference instead of preventing data loss.
#[must_use]
pub fn has_paired_add(op: &DiffOp, full_ops: &[DiffOp]) -> bool {
    match op {
        DiffOp::DropCheck { table, name } => full_ops.iter().any(|other| {
            matches!(
                other,
                DiffOp::AddCheck { table: t, check }
                    if t == table && check.name.as_ref() == Some(name)
            )
        }),
        DiffOp::DropForeignKey { table, name } => full_ops.iter().any(|other| {
            matches!(
                other,
                DiffOp::AddForeignKey { table: t, fk }
                    if t == table && fk.name.as_ref() == Some(name)
            )
        }),
        DiffOp::DropPrimaryKey { table } => full_ops.iter().any(|other| {
            matches!(other, DiffOp::SetPrimaryKey { table: t, .. } if t == table)
        }),
        DiffOp::DropIndex { table, name } => full_ops.iter().any(|other| {
            matches!(
                other,
                DiffOp::AddIndex { table: t, index }
                    if t == table && index.name.as_ref() == Some(name.as_ref())
            )
        }),
        DiffOp::DropSequence(name) => full_ops.iter().any(|other| {
            matches!(other, DiffOp::CreateSequence(sequence) if &sequence.name == name)
        }),
        _ => false,
    }
}

impl SkippedOpKind {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::DropTable => "DROP TABLE",
            Self::DropColumn => "DROP COLUMN",
            Self::DropIndex => "DROP INDEX",
            Self::DropForeignKey => "DROP FOREIGN KEY",
            Self::DropCheck => "DROP CHECK",
            Self::DropPrimaryKey => "DROP PRIMARY KEY",
            Self::DropSequence => "DROP SEQUENCE",
            Self::DropProcedure => "DROP PROCEDURE",
        }
    }

    fn matches(self, op: &DiffOp) -> bool {
        match self {
            Self::DropTable => matches!(op, DiffOp::DropTable(_)),
            Self::DropColumn => matches!(op, DiffOp::DropColumn { .. }),
            Self::DropIndex => matches!(op, DiffOp::DropIndex { .. }),
            Self::DropForeignKey => matches!(op, DiffOp::DropForeignKey { .. }),
            Self::DropCheck => matches!(op, DiffOp::DropCheck { .. }),
            Self::DropPrimaryKey => matches!(op, DiffOp::DropPrimaryKey { .. }),
            Self::DropSequence => matches!(op, DiffOp::DropSequence(_)),
            Self::DropProcedure => matches!(op, DiffOp::DropProcedure(_)),
        }
    }
}
