pub mod expr;
pub mod ident;
pub mod schema_object;
pub mod types;

pub use expr::*;
pub use ident::*;
pub use schema_object::*;
pub use types::*;

/// String keys used in `extra: BTreeMap<String, Value>` bags on IR nodes to
/// carry SQL Server specific flags that don't warrant a dedicated field.
pub mod extra_keys {
    pub const TABLE_PRIMARY_KEY_CLUSTERED: &str = "mssql.primary_key_clustered";
    pub const INDEX_CLUSTERED: &str = "mssql.index_clustered";
    pub const COLUMN_IDENTITY_NOT_FOR_REPLICATION: &str = "mssql.identity_not_for_replication";
    pub const TABLE_SOURCE_SQL: &str = "mssql.source_sql";
    /// Marks a foreign key as `WITH NOCHECK` permanently rather than as the
    /// transient add-state of the two-pass trust-restoration protocol: the
    /// differ must not emit `WITH CHECK CHECK CONSTRAINT` for it even when
    /// the rest of the new FK set is trusted.
    pub const FK_NOT_ENFORCED: &str = "mssql.fk_not_enforced";

    pub mod mssql {
        pub const DEFAULT_CONSTRAINT_NAME: &str = "mssql.default_constraint_name";
    }
}
