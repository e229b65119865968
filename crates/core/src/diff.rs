mod enable_drop;
pub mod engine;
pub mod policy;
mod rebuild;
pub mod types;

pub use enable_drop::{DiffDiagnostics, DiffOutcome, SkippedOpDiagnostic, SkippedOpKind};
pub use engine::{DiffEngine, check_name_collisions};
pub use policy::{
    DEFAULT_EQUIVALENCE_POLICY, DefaultEquivalencePolicy, DiffConfig, EquivalencePolicy,
    EquivalencePolicyContractError, custom_types_equivalent, exprs_equivalent,
    verify_equivalence_policy_contract,
};
pub use rebuild::{ColumnPlan, classify_column_change, table_requires_reorder};
pub use types::{ColumnChange, DiffOp, SequenceChange};
