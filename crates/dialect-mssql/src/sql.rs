//! Shared T-SQL text rendering used by both the DDL generator (diff -> ALTER
//! statements) and the plain `to_sql` exporter (schema object -> CREATE
//! statement). Kept in one place so the two renderers never drift apart on
//! how an expression or a data type is spelled.
use std::fmt::Write as _;

use minfold_core::{
    BinaryOperator, ComparisonOp, DataType, Expr, ForeignKeyAction, Ident, IsTest, Literal,
    QualifiedName, SetQuantifier, UnaryOperator, Value,
};

pub(crate) fn render_ident(ident: &Ident) -> String {
    format!("[{}]", ident.value.replace(']', "]]"))
}

pub(crate) fn render_qualified_name(name: &QualifiedName) -> String {
    if let Some(schema) = &name.schema {
        format!("{}.{}", render_ident(schema), render_ident(&name.name))
    } else {
        render_ident(&name.name)
    }
}

pub(crate) fn escape_sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

pub(crate) fn ensure_sql_terminated(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{trimmed};")
    }
}

pub(crate) fn render_data_type(data_type: &DataType) -> String {
    match data_type {
        DataType::Bit => "BIT".to_string(),
        DataType::TinyInt => "TINYINT".to_string(),
        DataType::SmallInt => "SMALLINT".to_string(),
        DataType::Int => "INT".to_string(),
        DataType::BigInt => "BIGINT".to_string(),
        DataType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
        DataType::Numeric { precision, scale } => format!("NUMERIC({precision}, {scale})"),
        DataType::Money => "MONEY".to_string(),
        DataType::SmallMoney => "SMALLMONEY".to_string(),
        DataType::Real => "REAL".to_string(),
        DataType::Float { precision: Some(precision) } => format!("FLOAT({precision})"),
        DataType::Float { precision: None } => "FLOAT".to_string(),
        DataType::Char { length } => format!("CHAR({length})"),
        DataType::VarChar { length: Some(length) } => format!("VARCHAR({length})"),
        DataType::VarChar { length: None } => "VARCHAR(MAX)".to_string(),
        DataType::NChar { length } => format!("NCHAR({length})"),
        DataType::NVarChar { length: Some(length) } => format!("NVARCHAR({length})"),
        DataType::NVarChar { length: None } => "NVARCHAR(MAX)".to_string(),
        DataType::Text => "TEXT".to_string(),
        DataType::NText => "NTEXT".to_string(),
        DataType::Binary { length } => format!("BINARY({length})"),
        DataType::VarBinary { length: Some(length) } => format!("VARBINARY({length})"),
        DataType::VarBinary { length: None } => "VARBINARY(MAX)".to_string(),
        DataType::Image => "IMAGE".to_string(),
        DataType::Date => "DATE".to_string(),
        DataType::Time { scale: Some(scale) } => format!("TIME({scale})"),
        DataType::Time { scale: None } => "TIME".to_string(),
        DataType::DateTime => "DATETIME".to_string(),
        DataType::DateTime2 { scale: Some(scale) } => format!("DATETIME2({scale})"),
        DataType::DateTime2 { scale: None } => "DATETIME2".to_string(),
        DataType::SmallDateTime => "SMALLDATETIME".to_string(),
        DataType::DateTimeOffset { scale: Some(scale) } => format!("DATETIMEOFFSET({scale})"),
        DataType::DateTimeOffset { scale: None } => "DATETIMEOFFSET".to_string(),
        DataType::UniqueIdentifier => "UNIQUEIDENTIFIER".to_string(),
        DataType::RowVersion => "ROWVERSION".to_string(),
        DataType::Xml => "XML".to_string(),
        DataType::Custom(custom) => custom.trim().to_string(),
    }
}

pub(crate) fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => render_literal(literal),
        Expr::Ident(ident) => render_ident(ident),
        Expr::QualifiedIdent { qualifier, name } => {
            format!("{}.{}", render_ident(qualifier), render_ident(name))
        }
        Expr::Null => "NULL".to_string(),
        Expr::Raw(raw) => raw.trim().to_string(),
        Expr::BinaryOp { left, op, right } => format!(
            "{} {} {}",
            render_expr(left),
            render_binary_operator(op),
            render_expr(right)
        ),
        Expr::UnaryOp { op, expr } => {
            let operand = render_expr(expr);
            match op {
                UnaryOperator::Plus => format!("+{operand}"),
                UnaryOperator::Minus => format!("-{operand}"),
                UnaryOperator::Not => format!("NOT {operand}"),
            }
        }
        Expr::Comparison { left, op, right, quantifier } => {
            let mut sql = format!(
                "{} {} {}",
                render_expr(left),
                render_comparison_op(op),
                render_expr(right)
            );
            if let Some(quantifier) = quantifier {
                write!(sql, " {}", render_quantifier(quantifier)).expect("write to String");
            }
            sql
        }
        Expr::And(left, right) => format!("{} AND {}", render_expr(left), render_expr(right)),
        Expr::Or(left, right) => format!("{} OR {}", render_expr(left), render_expr(right)),
        Expr::Not(inner) => format!("NOT {}", render_expr(inner)),
        Expr::Is { expr, test } => format!("{} IS {}", render_expr(expr), render_is_test(test)),
        Expr::Between { expr, low, high, negated } => {
            let not = if *negated { " NOT" } else { "" };
            format!(
                "{}{} BETWEEN {} AND {}",
                render_expr(expr),
                not,
                render_expr(low),
                render_expr(high)
            )
        }
        Expr::In { expr, list, negated } => {
            let not = if *negated { " NOT" } else { "" };
            format!(
                "{}{} IN ({})",
                render_expr(expr),
                not,
                list.iter().map(render_expr).collect::<Vec<_>>().join(", ")
            )
        }
        Expr::Paren(inner) => format!("({})", render_expr(inner)),
        Expr::Tuple(items) => format!(
            "({})",
            items.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ),
        Expr::Function { name, args, distinct, over } => {
            let mut sql = String::new();
            write!(sql, "{}(", name.trim()).expect("write to String");
            if *distinct {
                sql.push_str("DISTINCT ");
            }
            sql.push_str(&args.iter().map(render_expr).collect::<Vec<_>>().join(", "));
            sql.push(')');
            if let Some(window_spec) = over {
                sql.push_str(" OVER (");
                let mut clauses = Vec::new();
                if !window_spec.partition_by.is_empty() {
                    clauses.push(format!(
                        "PARTITION BY {}",
                        window_spec.partition_by.iter().map(render_expr).collect::<Vec<_>>().join(", ")
                    ));
                }
                if !window_spec.order_by.is_empty() {
                    clauses.push(format!(
                        "ORDER BY {}",
                        window_spec.order_by.iter().map(render_expr).collect::<Vec<_>>().join(", ")
                    ));
                }
                sql.push_str(&clauses.join(" "));
                sql.push(')');
            }
            sql
        }
        Expr::Cast { expr, data_type } => {
            format!("CAST({} AS {})", render_expr(expr), render_data_type(data_type))
        }
        Expr::Collate { expr, collation } => {
            format!("{} COLLATE {}", render_expr(expr), collation.trim())
        }
        Expr::Case { operand, when_clauses, else_clause } => {
            let mut sql = String::from("CASE");
            if let Some(operand) = operand {
                write!(sql, " {}", render_expr(operand)).expect("write to String");
            }
            for (when_expr, then_expr) in when_clauses {
                write!(sql, " WHEN {} THEN {}", render_expr(when_expr), render_expr(then_expr))
                    .expect("write to String");
            }
            if let Some(else_expr) = else_clause {
                write!(sql, " ELSE {}", render_expr(else_expr)).expect("write to String");
            }
            sql.push_str(" END");
            sql
        }
        Expr::ArrayConstructor(items) => format!(
            "({})",
            items.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ),
        Expr::Exists(subquery) => format!("EXISTS ({})", subquery.sql.trim()),
    }
}

pub(crate) fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(value) => format!("'{}'", value.replace('\'', "''")),
        Literal::Integer(value) => value.to_string(),
        Literal::Float(value) => value.to_string(),
        Literal::Boolean(value) => if *value { "1".to_string() } else { "0".to_string() },
        Literal::Value(value) => render_value(value),
    }
}

pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(value) => format!("'{}'", value.replace('\'', "''")),
        Value::Integer(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::Bool(value) => if *value { "1".to_string() } else { "0".to_string() },
        Value::Null => "NULL".to_string(),
    }
}

pub(crate) fn render_binary_operator(op: &BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Modulo => "%",
        BinaryOperator::StringConcat => "+",
        BinaryOperator::BitwiseAnd => "&",
        BinaryOperator::BitwiseOr => "|",
        BinaryOperator::BitwiseXor => "^",
    }
}

pub(crate) fn render_comparison_op(op: &ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Equal => "=",
        ComparisonOp::NotEqual => "!=",
        ComparisonOp::GreaterThan => ">",
        ComparisonOp::GreaterThanOrEqual => ">=",
        ComparisonOp::LessThan => "<",
        ComparisonOp::LessThanOrEqual => "<=",
        ComparisonOp::Like => "LIKE",
    }
}

pub(crate) fn render_quantifier(quantifier: &SetQuantifier) -> &'static str {
    match quantifier {
        SetQuantifier::Any => "ANY",
        SetQuantifier::Some => "SOME",
        SetQuantifier::All => "ALL",
    }
}

pub(crate) fn render_is_test(test: &IsTest) -> &'static str {
    match test {
        IsTest::Null => "NULL",
        IsTest::NotNull => "NOT NULL",
        IsTest::True => "TRUE",
        IsTest::NotTrue => "NOT TRUE",
        IsTest::False => "FALSE",
        IsTest::NotFalse => "NOT FALSE",
        IsTest::Unknown => "UNKNOWN",
        IsTest::NotUnknown => "NOT UNKNOWN",
    }
}

pub(crate) fn render_fk_action(action: ForeignKeyAction) -> &'static str {
    match action {
        ForeignKeyAction::NoAction => "NO ACTION",
        ForeignKeyAction::Cascade => "CASCADE",
        ForeignKeyAction::SetNull => "SET NULL",
        ForeignKeyAction::SetDefault => "SET DEFAULT",
    }
}
