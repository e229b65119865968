/// Identifies which generator phase and object a rendered statement came
/// from, so a failed execution can be reported with useful context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementContext {
    pub phase: String,
    pub object: Option<String>,
}

impl StatementContext {
    pub fn new(phase: impl Into<String>, object: Option<String>) -> Self {
        Self {
            phase: phase.into(),
            object,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Sql {
        sql: String,
        transactional: bool,
        context: Option<StatementContext>,
    },
    BatchBoundary,
}

impl Statement {
    pub fn sql(sql: impl Into<String>, context: StatementContext) -> Self {
        Statement::Sql {
            sql: sql.into(),
            transactional: true,
            context: Some(context),
        }
    }

    pub fn non_transactional(sql: impl Into<String>, context: StatementContext) -> Self {
        Statement::Sql {
            sql: sql.into(),
            transactional: false,
            context: Some(context),
        }
    }
}
