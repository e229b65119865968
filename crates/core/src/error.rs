use std::{error::Error as StdError, path::PathBuf};

use crate::StatementContext;

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: Option<usize>,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{column}", self.line),
            None => write!(f, "{}", self.line),
        }
    }
}

fn format_location(location: Option<&SourceLocation>) -> String {
    location
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(
        "parse statement[{statement_index}] failed: {source_sql} (source_location={})",
        format_location(source_location.as_ref())
    )]
    StatementConversion {
        statement_index: usize,
        source_sql: String,
        source_location: Option<SourceLocation>,
        #[source]
        source: BoxedError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("diff target `{target}` failed: {operation}")]
    ObjectComparison { target: String, operation: String },

    /// Two schema objects that should uniquely resolve against one another
    /// (by case-folded name) matched more than once, or not at all, leaving
    /// the comparison unable to produce a coherent set of operations.
    #[error("incoherent diff: {detail}")]
    IncoherentDiff { detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("generate dialect `{dialect}` target `{target}` failed for op `{diff_op}`")]
    UnsupportedDiffOp {
        diff_op: String,
        target: String,
        dialect: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(
        "execute statement[{statement_index}] failed after {executed_statements} successes: {sql} (source_location={})",
        format_location(source_location.as_ref())
    )]
    StatementFailed {
        statement_index: usize,
        sql: String,
        executed_statements: usize,
        source_location: Option<SourceLocation>,
        statement_context: Option<Box<StatementContext>>,
        #[source]
        source: BoxedError,
    },
}

impl ExecutionError {
    #[allow(clippy::too_many_arguments)]
    pub fn statement_failed(
        statement_index: usize,
        sql: impl Into<String>,
        executed_statements: usize,
        source_location: Option<SourceLocation>,
        statement_context: Option<StatementContext>,
        source: impl Into<BoxedError>,
    ) -> Self {
        Self::StatementFailed {
            statement_index,
            sql: sql.into(),
            executed_statements,
            source_location,
            statement_context: statement_context.map(Box::new),
            source: source.into(),
        }
    }
}

/// Failures raised while pulling the current schema snapshot out of the
/// target server, before any comparison has taken place.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to connect to target server: {source}")]
    Connect {
        #[source]
        source: BoxedError,
    },
    #[error("failed to export current schema: {source}")]
    SchemaExport {
        #[source]
        source: BoxedError,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("{operation} `{path}` failed: {source}")]
pub struct IoFailure {
    pub operation: String,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl IoFailure {
    pub fn new(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),
    #[error("generate error: {0}")]
    Generate(#[from] GenerateError),
    #[error("execute error: {0}")]
    Execute(#[from] ExecutionError),
    #[error("schema load error: {0}")]
    Loader(#[from] LoaderError),
    #[error("I/O failure: {0}")]
    Io(#[from] IoFailure),
    /// The desired schema and the current schema are already identical;
    /// there is nothing to migrate.
    #[error("no changes to migrate")]
    NoChangesToMigrate,
}

pub type Result<T> = std::result::Result<T, Error>;
