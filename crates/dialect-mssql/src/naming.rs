use sha2::{Digest, Sha256};

use minfold_core::{Ident, QualifiedName};

/// Stable, deterministic identifier suffix for auxiliary objects the
/// generator invents on the fly (transitional rebuild columns, reorder
/// temp tables, unnamed default constraints): a SHA-256 hash of the
/// case-folded parts that identify what the object is *for*, so the same
/// rebuild always produces the same name and two runs of the generator
/// against the same diff never disagree.
fn deterministic_suffix(parts: &[&str]) -> String {
    let joined = parts.join("|").to_lowercase();
    let digest = Sha256::digest(joined.as_bytes());
    digest[..4].iter().map(|byte| format!("{byte:02x}")).collect()
}

fn sanitize(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    cleaned.chars().take(48).collect()
}

/// Name for a default constraint the source schema left unnamed. SQL
/// Server always names default constraints internally; rendering one
/// explicitly keeps `up`/`down` drops addressable by name without a round
/// trip to the catalog. The suffix folds in the normalized default
/// expression text alongside the table and column, so two different
/// defaults landing on the same column across regenerations never collide
/// under one constraint name.
pub fn default_constraint_name(table: &QualifiedName, column: &Ident, normalized_default: Option<&str>) -> String {
    let suffix = deterministic_suffix(&[
        &table.fold(),
        &column.fold(),
        normalized_default.unwrap_or(""),
        "default",
    ]);
    format!("DF_{}_{}_{suffix}", sanitize(&table.name.value), sanitize(&column.value))
}

/// Transitional name for the replacement column in the rebuild protocol:
/// add under this name, copy data in, drop the original, then
/// `sp_rename` this into the original name.
pub fn rebuild_temp_column_name(table: &QualifiedName, column: &Ident) -> String {
    let suffix = deterministic_suffix(&[&table.fold(), &column.fold(), "rebuild"]);
    format!("__minfold_rebuild_{}_{suffix}", sanitize(&column.value))
}

/// Transitional name for the replacement table in the whole-table reorder
/// protocol.
pub fn reorder_temp_table_name(table: &QualifiedName) -> String {
    let suffix = deterministic_suffix(&[&table.fold(), "reorder"]);
    format!("__minfold_reorder_{}_{suffix}", sanitize(&table.name.value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_yields_same_name() {
        let table = QualifiedName::in_schema("dbo", "orders");
        let column = Ident::unquoted("total");
        assert_eq!(
            default_constraint_name(&table, &column, Some("0")),
            default_constraint_name(&table, &column, Some("0"))
        );
    }

    #[test]
    fn different_columns_yield_different_names() {
        let table = QualifiedName::in_schema("dbo", "orders");
        assert_ne!(
            rebuild_temp_column_name(&table, &Ident::unquoted("a")),
            rebuild_temp_column_name(&table, &Ident::unquoted("b"))
        );
    }

    #[test]
    fn different_default_values_on_the_same_column_yield_different_names() {
        let table = QualifiedName::in_schema("dbo", "orders");
        let column = Ident::unquoted("status");
        assert_ne!(
            default_constraint_name(&table, &column, Some("0")),
            default_constraint_name(&table, &column, Some("1"))
        );
    }
}
