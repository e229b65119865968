mod adapter;
mod config;
mod dialect;
mod diff;
mod error;
mod executor;
mod ir;
mod log;
mod migration;
mod orchestrator;
mod ordering;
mod plan;
mod renderer;
mod statement;

pub use adapter::{DatabaseAdapter, Transaction};
pub use config::{ConnectionConfig, Version};
pub use executor::Executor;
pub use migration::{MigrationScript, generate_migration};
pub use orchestrator::{Mode, Orchestrator, OrchestratorOptions, OrchestratorOutput};
pub use ordering::{Phase, group_by_phase, sort_diff_ops};
pub use plan::{DdlPlan, DdlPlanner, build_ddl_plan};
pub use renderer::Renderer;
pub use dialect::Dialect;
pub use diff::{
    ColumnChange, ColumnPlan, DEFAULT_EQUIVALENCE_POLICY, DefaultEquivalencePolicy, DiffConfig,
    DiffDiagnostics, DiffEngine, DiffOp, DiffOutcome, EquivalencePolicy,
    EquivalencePolicyContractError, SequenceChange, SkippedOpDiagnostic, SkippedOpKind,
    check_name_collisions, classify_column_change, custom_types_equivalent, exprs_equivalent,
    table_requires_reorder, verify_equivalence_policy_contract,
};
pub use error::{
    DiffError, Error, ExecutionError, GenerateError, IoFailure, LoaderError, ParseError, Result,
    SourceLocation,
};
pub use log::{LogEvent, LogLevel, LogSink, NoopLogSink, NOOP_LOG_SINK};
pub use ir::{
    BinaryOperator, CheckConstraint, Column, ComparisonOp, DataType, Expr, ForeignKey,
    ForeignKeyAction, GeneratedColumn, Ident, Identity, IndexColumn, IndexDef, IndexOwner, IsTest,
    Literal, PrimaryKey, QualifiedName, SchemaObject, Sequence, SetQuantifier, SortOrder, SubQuery,
    StoredProcedure, Table, TableOptions, UnaryOperator, Value, WindowSpec, extra_keys,
    float_total_cmp, value_total_eq,
};
pub use statement::{Statement, StatementContext};
