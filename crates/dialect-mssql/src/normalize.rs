use minfold_core::{DataType, Expr, IndexDef, Sequence, SchemaObject, Table, Value};

use minfold_core::extra_keys;

/// Canonicalizes a freshly parsed or freshly exported schema object so that
/// two descriptions of the same object - one typed by hand in a desired
/// schema file, one read back out of the catalog - compare equal unless
/// they actually disagree about something the server would care about.
pub(crate) fn normalize_object(object: &mut SchemaObject) {
    match object {
        SchemaObject::Table(table) => normalize_table(table),
        SchemaObject::Index(index) => normalize_index(index),
        SchemaObject::Sequence(sequence) => normalize_sequence(sequence),
        SchemaObject::StoredProcedure(procedure) => {
            procedure.definition = procedure.definition.trim().to_string();
        }
    }
}

fn normalize_table(table: &mut Table) {
    for column in &mut table.columns {
        normalize_data_type(&mut column.data_type);
        if let Some(default) = &mut column.default {
            normalize_expr(default);
        }
        if let Some(generated) = &mut column.generated {
            normalize_expr(&mut generated.expr);
        }
        if let Some(collation) = &mut column.collation {
            *collation = collation.trim().to_string();
        }
        // SQL Server itself rejects a column declared both IDENTITY and
        // DEFAULT; malformed input that slipped past the parser is resolved
        // here in the identity's favor rather than surfacing as a panic
        // deep in the differ or generator.
        if column.identity.is_some() && column.default.is_some() {
            column.default = None;
        }
    }

    for check in &mut table.checks {
        normalize_expr(&mut check.expr);
    }

    if let Some(Value::String(source_sql)) = table.options.extra.get_mut(extra_keys::TABLE_SOURCE_SQL) {
        *source_sql = source_sql.trim().to_string();
    }
}

fn normalize_index(index: &mut IndexDef) {
    if let Some(where_clause) = &mut index.where_clause {
        normalize_expr(where_clause);
    }
}

fn normalize_sequence(sequence: &mut Sequence) {
    if let Some(data_type) = &mut sequence.data_type {
        normalize_data_type(data_type);
    }
}

/// Folds a type name the parser couldn't match to a dedicated variant back
/// into one if it turns out to be a spelling of a known SQL Server type
/// (`"INTEGER"`, extra whitespace, mixed case from a hand-written schema
/// file). Genuinely unrecognized type names (CLR UDTs, `sql_variant`,
/// `hierarchyid`, `geography`) stay `Custom`, just trimmed.
fn normalize_data_type(data_type: &mut DataType) {
    if let DataType::Custom(raw) = data_type {
        match parse_custom_type_name(raw) {
            Some(canonical) => *data_type = canonical,
            None => *raw = raw.trim().to_string(),
        }
    }
}

fn parse_custom_type_name(raw: &str) -> Option<DataType> {
    let trimmed = raw.trim();
    let (name, args) = split_type_args(trimmed);
    let name = name.to_ascii_lowercase();

    match name.as_str() {
        "bit" => Some(DataType::Bit),
        "tinyint" => Some(DataType::TinyInt),
        "smallint" => Some(DataType::SmallInt),
        "int" | "integer" => Some(DataType::Int),
        "bigint" => Some(DataType::BigInt),
        "decimal" | "dec" => {
            let (precision, scale) = parse_precision_scale(args)?;
            Some(DataType::Decimal { precision, scale })
        }
        "numeric" => {
            let (precision, scale) = parse_precision_scale(args)?;
            Some(DataType::Numeric { precision, scale })
        }
        "money" => Some(DataType::Money),
        "smallmoney" => Some(DataType::SmallMoney),
        "real" => Some(DataType::Real),
        "float" => Some(DataType::Float { precision: args.and_then(parse_u32) }),
        "char" | "character" => Some(DataType::Char { length: args.and_then(parse_u32)? }),
        "varchar" => Some(DataType::VarChar { length: parse_length_or_max(args) }),
        "nchar" | "national char" | "national character" => {
            Some(DataType::NChar { length: args.and_then(parse_u32)? })
        }
        "nvarchar" => Some(DataType::NVarChar { length: parse_length_or_max(args) }),
        "text" => Some(DataType::Text),
        "ntext" => Some(DataType::NText),
        "binary" => Some(DataType::Binary { length: args.and_then(parse_u32)? }),
        "varbinary" => Some(DataType::VarBinary { length: parse_length_or_max(args) }),
        "image" => Some(DataType::Image),
        "date" => Some(DataType::Date),
        "time" => Some(DataType::Time { scale: args.and_then(parse_u32) }),
        "datetime" => Some(DataType::DateTime),
        "datetime2" => Some(DataType::DateTime2 { scale: args.and_then(parse_u32) }),
        "smalldatetime" => Some(DataType::SmallDateTime),
        "datetimeoffset" => Some(DataType::DateTimeOffset { scale: args.and_then(parse_u32) }),
        "uniqueidentifier" => Some(DataType::UniqueIdentifier),
        "rowversion" | "timestamp" => Some(DataType::RowVersion),
        "xml" => Some(DataType::Xml),
        _ => None,
    }
}

/// Splits `"varchar(50)"` into `("varchar", Some("50"))`, `"int"` into
/// `("int", None)`.
fn split_type_args(raw: &str) -> (&str, Option<&str>) {
    match raw.find('(') {
        Some(open) if raw.trim_end().ends_with(')') => {
            let name = raw[..open].trim();
            let args = raw[open + 1..raw.trim_end().len() - 1].trim();
            (name, Some(args))
        }
        _ => (raw, None),
    }
}

fn parse_u32(args: &str) -> Option<u32> {
    args.trim().parse().ok()
}

fn parse_length_or_max(args: Option<&str>) -> Option<u32> {
    let args = args?.trim();
    if args.eq_ignore_ascii_case("max") {
        None
    } else {
        args.parse().ok()
    }
}

fn parse_precision_scale(args: Option<&str>) -> Option<(u32, u32)> {
    let args = args?;
    let mut parts = args.split(',').map(str::trim);
    let precision = parts.next()?.parse().ok()?;
    let scale = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);
    Some((precision, scale))
}

/// Collapses whitespace and strips parentheses SQL Server's catalog adds
/// around stored default/check expressions (`((0))`, `(getdate())`) that
/// carry no semantic weight - `Expr::Paren` nodes the parser produced
/// structurally are unwrapped outright, and residual free text in
/// `Expr::Raw` has its own balanced outer parens peeled layer by layer.
fn normalize_expr(expr: &mut Expr) {
    match expr {
        Expr::Paren(inner) => {
            normalize_expr(inner);
            *expr = (**inner).clone();
        }
        Expr::Raw(raw) => {
            let mut text = collapse_whitespace(raw);
            while let Some(inner) = strip_balanced_outer_parens(&text) {
                text = inner.to_string();
            }
            *raw = text;
        }
        Expr::Literal(_) | Expr::Ident(_) | Expr::QualifiedIdent { .. } | Expr::Null => {}
        Expr::BinaryOp { left, right, .. } => {
            normalize_expr(left);
            normalize_expr(right);
        }
        Expr::UnaryOp { expr, .. } => normalize_expr(expr),
        Expr::Comparison { left, right, .. } => {
            normalize_expr(left);
            normalize_expr(right);
        }
        Expr::And(left, right) | Expr::Or(left, right) => {
            normalize_expr(left);
            normalize_expr(right);
        }
        Expr::Not(inner) => normalize_expr(inner),
        Expr::Is { expr, .. } => normalize_expr(expr),
        Expr::Between { expr, low, high, .. } => {
            normalize_expr(expr);
            normalize_expr(low);
            normalize_expr(high);
        }
        Expr::In { expr, list, .. } => {
            normalize_expr(expr);
            for item in list {
                normalize_expr(item);
            }
        }
        Expr::Tuple(items) | Expr::ArrayConstructor(items) => {
            for item in items {
                normalize_expr(item);
            }
        }
        Expr::Function { args, over, .. } => {
            for arg in args {
                normalize_expr(arg);
            }
            if let Some(window) = over {
                for expr in &mut window.partition_by {
                    normalize_expr(expr);
                }
                for expr in &mut window.order_by {
                    normalize_expr(expr);
                }
            }
        }
        Expr::Cast { expr, data_type } => {
            normalize_expr(expr);
            normalize_data_type(data_type);
        }
        Expr::Collate { expr, .. } => normalize_expr(expr),
        Expr::Case { operand, when_clauses, else_clause } => {
            if let Some(operand) = operand {
                normalize_expr(operand);
            }
            for (when_expr, then_expr) in when_clauses {
                normalize_expr(when_expr);
                normalize_expr(then_expr);
            }
            if let Some(else_expr) = else_clause {
                normalize_expr(else_expr);
            }
        }
        Expr::Exists(subquery) => {
            subquery.sql = collapse_whitespace(&subquery.sql);
        }
    }
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

/// If `sql` is wrapped in a single redundant pair of parens spanning the
/// whole string, returns the inner text; otherwise `None`. Quote-aware so
/// `('(a)')` is not mistaken for a wrapped expression.
fn strip_balanced_outer_parens(sql: &str) -> Option<String> {
    let trimmed = sql.trim();
    if !trimmed.starts_with('(') || !trimmed.ends_with(')') {
        return None;
    }

    let mut depth = 0i32;
    let mut in_string = false;
    let chars: Vec<char> = trimmed.chars().collect();
    for (index, &c) in chars.iter().enumerate() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 && index != chars.len() - 1 {
                    // the opening paren closes before the end: outer parens
                    // don't wrap the whole expression
                    return None;
                }
            }
            _ => {}
        }
    }

    Some(trimmed[1..trimmed.len() - 1].trim().to_string())
}
