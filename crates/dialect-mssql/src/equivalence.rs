use minfold_core::{EquivalencePolicy, Expr};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MssqlEquivalencePolicy;

pub(crate) static MSSQL_EQUIVALENCE_POLICY: MssqlEquivalencePolicy = MssqlEquivalencePolicy;

impl EquivalencePolicy for MssqlEquivalencePolicy {
    fn is_equivalent_expr(&self, left: &Expr, right: &Expr) -> bool {
        let Some(left_canonical) = canonical_expr(left) else {
            return false;
        };
        let Some(right_canonical) = canonical_expr(right) else {
            return false;
        };

        left_canonical == right_canonical
    }

    fn is_equivalent_custom_type(&self, left: &str, right: &str) -> bool {
        canonical_type_name(left) == canonical_type_name(right)
    }
}

/// Normalization owns structural expression canonicalization in T-SQL. This
/// policy is only a residual safety valve for `Expr::Raw` spellings that
/// remain textually different after normalization - most commonly a
/// built-in function the catalog spells in a different case than the
/// desired-schema file (`getdate()` vs `GETDATE()`).
fn canonical_expr(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Raw(raw) => Some(canonical_raw_expr(raw)),
        Expr::Paren(inner) => canonical_expr(inner),
        _ => None,
    }
}

fn canonical_raw_expr(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    canonicalize_builtin_calls(&collapsed)
}

/// SQL Server's catalog always reports built-in niladic functions
/// lower-cased with their parens (`getdate()`, `newid()`,
/// `sysdatetime()`) regardless of how a hand-written schema file spells
/// them. Folding known built-ins to lower case here means a schema file
/// spelled `GETDATE()` compares equal to the catalog's `getdate()` without
/// the differ rewriting every DEFAULT clause to match.
const CASE_INSENSITIVE_BUILTINS: &[&str] = &[
    "getdate()",
    "getutcdate()",
    "sysdatetime()",
    "sysutcdatetime()",
    "sysdatetimeoffset()",
    "newid()",
    "newsequentialid()",
    "current_timestamp",
    "current_user",
    "session_user",
    "system_user",
];

fn canonicalize_builtin_calls(expr: &str) -> String {
    let trimmed = expr.trim();
    for builtin in CASE_INSENSITIVE_BUILTINS {
        if trimmed.eq_ignore_ascii_case(builtin) {
            return (*builtin).to_string();
        }
    }
    trimmed.to_string()
}

fn canonical_type_name(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '[' || c == ']').to_ascii_lowercase()
}

/// Collapses runs of whitespace to a single space, except inside single
/// quoted string literals where the text is significant.
fn collapse_whitespace(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut in_string = false;
    let mut chars = sql.trim().chars().peekable();
    let mut last_was_space = false;

    while let Some(c) = chars.next() {
        if c == '\'' {
            in_string = !in_string;
            result.push(c);
            last_was_space = false;
            continue;
        }
        if !in_string && c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
            continue;
        }
        result.push(c);
        last_was_space = false;
    }

    result
}
