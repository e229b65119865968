//! T-SQL DDL parser.
//!
//! SQL Server schema dumps mix session-setting noise (`SET ANSI_NULLS ON`,
//! `USE [db]`, `GO` batch separators), `CREATE TABLE`/`CREATE INDEX`/`CREATE
//! SEQUENCE` statements, and multi-statement `CREATE PROCEDURE` bodies that
//! must not be split on their internal `;`. This module splits the script
//! into top-level statements respecting procedure bodies, then runs each
//! recognized DDL statement through [`sqlparser`]'s `MsSqlDialect` as a
//! validating tokenizer before hand-converting it into [`SchemaObject`]s:
//! the generic surface (identifiers, literals, parenthesized lists) is
//! exactly what a dedicated SQL tokenizer is for, while the T-SQL-specific
//! residue (`IDENTITY(seed,increment)`, computed columns with `PERSISTED`,
//! `NOT FOR REPLICATION`) still needs a hand-rolled recursive-descent
//! conversion, since `sqlparser`'s generic AST doesn't model these
//! faithfully. Anything not recognized (session settings, views, stray
//! noise) is skipped rather than rejected.
use std::io;

use sqlparser::{dialect::MsSqlDialect, parser::Parser};

use minfold_core::{
    CheckConstraint, Column, DataType, Expr, ForeignKey, ForeignKeyAction, GeneratedColumn, Ident,
    Identity, IndexColumn, IndexDef, IndexOwner, Literal, ParseError, PrimaryKey, QualifiedName,
    Result, SchemaObject, Sequence, SortOrder, StoredProcedure, Table, TableOptions, UnaryOperator,
};

use crate::normalize;

type ConversionResult<T> = std::result::Result<T, io::Error>;

pub(crate) fn parse_schema(sql: &str) -> Result<Vec<SchemaObject>> {
    let statements = split_statements(sql);

    let mut objects = Vec::new();
    for (statement_index, statement_sql) in statements.iter().enumerate() {
        let parsed = parse_statement(statement_sql).map_err(|source| {
            statement_conversion_error(statement_index, statement_sql.clone(), source)
        })?;
        objects.extend(parsed);
    }

    for object in &mut objects {
        normalize::normalize_object(object);
    }

    Ok(objects)
}

fn statement_conversion_error(
    statement_index: usize,
    source_sql: String,
    source: io::Error,
) -> minfold_core::Error {
    ParseError::StatementConversion {
        statement_index,
        source_sql,
        source_location: Some(minfold_core::SourceLocation { line: 1, column: None }),
        source: Box::new(source),
    }
    .into()
}

fn conversion_error(message: impl Into<String>) -> io::Error {
    io::Error::other(message.into())
}

// ---------------------------------------------------------------------
// Statement splitting
// ---------------------------------------------------------------------

/// Splits a script into top-level statement texts. Ordinary statements end
/// at the next top-level `;`; `CREATE [OR ALTER] PROCEDURE`/`ALTER
/// PROCEDURE` statements instead run until a standalone `GO` line or
/// end-of-input, since their bodies contain their own `;`-terminated
/// statements that are not migration-relevant boundaries.
fn split_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= chars.len() {
            break;
        }

        if let Some(go_end) = match_standalone_go(&chars, pos) {
            pos = go_end;
            continue;
        }

        let start = pos;
        let end = if looks_like_procedure(&chars, pos) {
            find_procedure_end(&chars, pos)
        } else {
            find_statement_end(&chars, pos)
        };

        let text: String = chars[start..end].iter().collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            statements.push(trimmed.to_string());
        }
        pos = end;
        if pos < chars.len() && chars[pos] == ';' {
            pos += 1;
        }
    }

    statements
}

/// Peeks up to `count` leading whitespace/comment-separated words starting
/// at `pos`, without consuming anything.
fn peek_words(chars: &[char], pos: usize, count: usize) -> Vec<String> {
    let mut words = Vec::new();
    let mut cursor = pos;
    while words.len() < count {
        cursor = skip_trivia(chars, cursor);
        if cursor >= chars.len() {
            break;
        }
        let start = cursor;
        if chars[cursor] == '[' {
            cursor += 1;
            while cursor < chars.len() && chars[cursor] != ']' {
                cursor += 1;
            }
            if cursor < chars.len() {
                cursor += 1;
            }
        } else if is_ident_char(chars[cursor]) {
            while cursor < chars.len() && is_ident_char(chars[cursor]) {
                cursor += 1;
            }
        } else {
            // punctuation word (e.g. a lone `;`): treat as a single-char word
            cursor += 1;
        }
        words.push(chars[start..cursor].iter().collect::<String>());
    }
    words
}

fn looks_like_procedure(chars: &[char], pos: usize) -> bool {
    let words = peek_words(chars, pos, 4);
    let lower: Vec<String> = words.iter().map(|w| w.to_ascii_lowercase()).collect();
    match lower.first().map(String::as_str) {
        Some("alter") => matches!(lower.get(1).map(String::as_str), Some("procedure") | Some("proc")),
        Some("create") => {
            matches!(lower.get(1).map(String::as_str), Some("procedure") | Some("proc"))
                || (lower.get(1).map(String::as_str) == Some("or")
                    && matches!(lower.get(2).map(String::as_str), Some("alter"))
                    && matches!(lower.get(3).map(String::as_str), Some("procedure") | Some("proc")))
        }
        _ => false,
    }
}

fn find_statement_end(chars: &[char], start: usize) -> usize {
    let mut pos = start;
    let mut depth = 0i32;
    while pos < chars.len() {
        match chars[pos] {
            '\'' => pos = skip_string(chars, pos),
            '[' => pos = skip_bracket(chars, pos),
            '(' => {
                depth += 1;
                pos += 1;
            }
            ')' => {
                depth -= 1;
                pos += 1;
            }
            ';' if depth <= 0 => return pos,
            _ => pos += 1,
        }
    }
    pos
}

fn find_procedure_end(chars: &[char], start: usize) -> usize {
    let mut pos = start;
    while pos < chars.len() {
        match chars[pos] {
            '\'' => pos = skip_string(chars, pos),
            '[' => pos = skip_bracket(chars, pos),
            _ => {
                if match_standalone_go(chars, pos).is_some() {
                    return pos;
                }
                pos += 1;
            }
        }
    }
    pos
}

/// If a standalone `GO` batch separator starts at `pos` (at the beginning
/// of a line, optionally followed by a repeat count, then end-of-line or
/// end-of-input), returns the position just past it.
fn match_standalone_go(chars: &[char], pos: usize) -> Option<usize> {
    if !at_line_start(chars, pos) {
        return None;
    }
    let mut cursor = pos;
    while cursor < chars.len() && (chars[cursor] == ' ' || chars[cursor] == '\t') {
        cursor += 1;
    }
    let word_start = cursor;
    while cursor < chars.len() && is_ident_char(chars[cursor]) {
        cursor += 1;
    }
    let word: String = chars[word_start..cursor].iter().collect();
    if !word.eq_ignore_ascii_case("go") {
        return None;
    }

    while cursor < chars.len() && (chars[cursor] == ' ' || chars[cursor] == '\t') {
        cursor += 1;
    }
    while cursor < chars.len() && chars[cursor].is_ascii_digit() {
        cursor += 1;
    }
    while cursor < chars.len() && (chars[cursor] == ' ' || chars[cursor] == '\t' || chars[cursor] == '\r') {
        cursor += 1;
    }
    if cursor < chars.len() && chars[cursor] != '\n' {
        return None;
    }
    Some(cursor)
}

fn at_line_start(chars: &[char], pos: usize) -> bool {
    if pos == 0 {
        return true;
    }
    let mut back = pos;
    while back > 0 && (chars[back - 1] == ' ' || chars[back - 1] == '\t') {
        back -= 1;
    }
    back == 0 || chars[back - 1] == '\n'
}

fn skip_trivia(chars: &[char], mut pos: usize) -> usize {
    loop {
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos + 1 < chars.len() && chars[pos] == '-' && chars[pos + 1] == '-' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }
        if pos + 1 < chars.len() && chars[pos] == '/' && chars[pos + 1] == '*' {
            pos += 2;
            while pos + 1 < chars.len() && !(chars[pos] == '*' && chars[pos + 1] == '/') {
                pos += 1;
            }
            pos = (pos + 2).min(chars.len());
            continue;
        }
        return pos;
    }
}

fn skip_string(chars: &[char], mut pos: usize) -> usize {
    pos += 1;
    while pos < chars.len() {
        if chars[pos] == '\'' {
            if chars.get(pos + 1) == Some(&'\'') {
                pos += 2;
                continue;
            }
            return pos + 1;
        }
        pos += 1;
    }
    pos
}

fn skip_bracket(chars: &[char], mut pos: usize) -> usize {
    pos += 1;
    while pos < chars.len() {
        if chars[pos] == ']' {
            if chars.get(pos + 1) == Some(&']') {
                pos += 2;
                continue;
            }
            return pos + 1;
        }
        pos += 1;
    }
    pos
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '#' || ch == '@' || ch == '$'
}

// ---------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokKind {
    Word,
    Quoted,
    Str,
    Num,
    Punct,
}

#[derive(Debug, Clone)]
struct Tok {
    kind: TokKind,
    text: String,
    start: usize,
    end: usize,
}

fn tokenize(sql: &str) -> Vec<Tok> {
    let chars: Vec<char> = sql.chars().collect();
    let mut toks = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let pos_before = pos;
        pos = skip_trivia(&chars, pos);
        if pos >= chars.len() {
            break;
        }
        if pos == pos_before && chars[pos].is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let ch = chars[pos];

        if ch == '[' {
            let end = skip_bracket(&chars, pos);
            let inner: String = chars[start + 1..end.saturating_sub(1).max(start + 1)].iter().collect();
            let text = inner.replace("]]", "]");
            toks.push(Tok { kind: TokKind::Quoted, text, start, end });
            pos = end;
            continue;
        }

        if ch == '"' {
            let mut end = pos + 1;
            while end < chars.len() {
                if chars[end] == '"' {
                    if chars.get(end + 1) == Some(&'"') {
                        end += 2;
                        continue;
                    }
                    end += 1;
                    break;
                }
                end += 1;
            }
            let inner: String = chars[start + 1..end.saturating_sub(1).max(start + 1)].iter().collect();
            let text = inner.replace("\"\"", "\"");
            toks.push(Tok { kind: TokKind::Quoted, text, start, end });
            pos = end;
            continue;
        }

        if ch == '\'' {
            let end = skip_string(&chars, pos);
            let inner: String = chars[start + 1..end.saturating_sub(1).max(start + 1)].iter().collect();
            let text = inner.replace("''", "'");
            toks.push(Tok { kind: TokKind::Str, text, start, end });
            pos = end;
            continue;
        }

        if (ch == 'n' || ch == 'N') && chars.get(pos + 1) == Some(&'\'') {
            let end = skip_string(&chars, pos + 1);
            let inner: String = chars[start + 2..end.saturating_sub(1).max(start + 2)].iter().collect();
            let text = inner.replace("''", "'");
            toks.push(Tok { kind: TokKind::Str, text, start, end });
            pos = end;
            continue;
        }

        if ch.is_ascii_digit() {
            let mut end = pos;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            if chars.get(end) == Some(&'.') && chars.get(end + 1).is_some_and(|c| c.is_ascii_digit()) {
                end += 1;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
            }
            let text: String = chars[start..end].iter().collect();
            toks.push(Tok { kind: TokKind::Num, text, start, end });
            pos = end;
            continue;
        }

        if is_ident_char(ch) {
            let mut end = pos;
            while end < chars.len() && is_ident_char(chars[end]) {
                end += 1;
            }
            let text: String = chars[start..end].iter().collect();
            toks.push(Tok { kind: TokKind::Word, text, start, end });
            pos = end;
            continue;
        }

        // two-char operators
        if let Some(next) = chars.get(pos + 1) {
            let pair: String = [ch, *next].iter().collect();
            if matches!(pair.as_str(), "<=" | ">=" | "<>" | "!=") {
                toks.push(Tok { kind: TokKind::Punct, text: pair, start, end: pos + 2 });
                pos += 2;
                continue;
            }
        }

        toks.push(Tok { kind: TokKind::Punct, text: ch.to_string(), start, end: pos + 1 });
        pos += 1;
    }

    toks
}

// ---------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------

struct Cursor {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Cursor {
    fn new(sql: &str) -> Self {
        Self { tokens: tokenize(sql), pos: 0 }
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn is_word(&self, word: &str) -> bool {
        self.is_word_at(0, word)
    }

    fn is_word_at(&self, offset: usize, word: &str) -> bool {
        self.peek_at(offset)
            .is_some_and(|t| t.kind == TokKind::Word && t.text.eq_ignore_ascii_case(word))
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> ConversionResult<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(conversion_error(format!(
                "expected `{word}`, found {}",
                self.describe_current()
            )))
        }
    }

    fn is_punct(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.kind == TokKind::Punct && t.text == punct)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> ConversionResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(conversion_error(format!(
                "expected `{punct}`, found {}",
                self.describe_current()
            )))
        }
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(tok) => format!("`{}`", tok.text),
            None => "end of statement".to_string(),
        }
    }

}

// ---------------------------------------------------------------------
// Raw-text expression boundary capture
// ---------------------------------------------------------------------

/// Expects the cursor to sit on `(`, consumes through the matching `)`, and
/// returns the source text between them (exclusive of the parens).
fn capture_parenthesized(cur: &mut Cursor, source: &str) -> ConversionResult<String> {
    let open = cur.peek().ok_or_else(|| conversion_error("expected `(`, found end of statement"))?;
    if open.kind != TokKind::Punct || open.text != "(" {
        return Err(conversion_error(format!("expected `(`, found {}", cur.describe_current())));
    }
    let inner_start = open.end;
    cur.advance();

    let mut depth = 1i32;
    let mut inner_end = inner_start;
    loop {
        let tok = cur
            .advance()
            .ok_or_else(|| conversion_error("unterminated parenthesized expression"))?;
        if tok.kind == TokKind::Punct && tok.text == "(" {
            depth += 1;
        } else if tok.kind == TokKind::Punct && tok.text == ")" {
            depth -= 1;
            if depth == 0 {
                inner_end = tok.start;
                break;
            }
        }
    }

    Ok(source_slice(source, inner_start, inner_end).trim().to_string())
}

/// Captures source text starting at the current position, stopping at a
/// depth-0 comma, `)`, `;`, or one of `stop_words` (case-insensitive),
/// without consuming the stopping token.
fn capture_expr_until(cur: &mut Cursor, source: &str, stop_words: &[&str]) -> ConversionResult<String> {
    let start = cur
        .peek()
        .ok_or_else(|| conversion_error("expected an expression, found end of statement"))?
        .start;
    let mut depth = 0i32;
    let mut end = start;

    loop {
        let Some(tok) = cur.peek() else { break };
        if depth == 0 {
            if tok.kind == TokKind::Punct && (tok.text == "," || tok.text == ")" || tok.text == ";") {
                break;
            }
            if tok.kind == TokKind::Word && stop_words.iter().any(|w| tok.text.eq_ignore_ascii_case(w)) {
                break;
            }
        }
        if tok.kind == TokKind::Punct && tok.text == "(" {
            depth += 1;
        } else if tok.kind == TokKind::Punct && tok.text == ")" {
            depth -= 1;
        }
        end = tok.end;
        cur.advance();
    }

    if end <= start {
        return Err(conversion_error("expected a non-empty expression"));
    }
    Ok(source_slice(source, start, end).trim().to_string())
}

fn source_slice(source: &str, start: usize, end: usize) -> &str {
    let chars: Vec<char> = source.chars().collect();
    let start = start.min(chars.len());
    let end = end.min(chars.len()).max(start);
    // char-index slicing: map back to byte offsets
    let byte_start = char_to_byte(source, start);
    let byte_end = char_to_byte(source, end);
    &source[byte_start..byte_end]
}

fn char_to_byte(source: &str, char_idx: usize) -> usize {
    source.char_indices().nth(char_idx).map(|(b, _)| b).unwrap_or(source.len())
}

// ---------------------------------------------------------------------
// Expression parsing (best-effort structural, with Raw fallback)
// ---------------------------------------------------------------------

/// Parses `text` into a structural [`Expr`] when it matches a common shape
/// (identifiers, literals, arithmetic, comparisons, `CAST`, `CASE`, simple
/// function calls); falls back to [`Expr::Raw`] for anything else so no
/// expression ever fails to parse outright.
fn parse_expr_best_effort(text: &str) -> Expr {
    let mut cur = Cursor::new(text);
    if cur.at_end() {
        return Expr::Raw(text.trim().to_string());
    }
    match parse_or_expr(&mut cur, text) {
        Ok(expr) if cur.at_end() => expr,
        _ => Expr::Raw(text.trim().to_string()),
    }
}

fn parse_or_expr(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    let mut left = parse_and_expr(cur, source)?;
    while cur.eat_word("OR") {
        let right = parse_and_expr(cur, source)?;
        left = Expr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and_expr(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    let mut left = parse_not_expr(cur, source)?;
    while cur.eat_word("AND") {
        let right = parse_not_expr(cur, source)?;
        left = Expr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_not_expr(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    if cur.eat_word("NOT") {
        let inner = parse_not_expr(cur, source)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    parse_comparison(cur, source)
}

fn parse_comparison(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    let expr = parse_additive(cur, source)?;

    if cur.eat_word("IS") {
        let negated = cur.eat_word("NOT");
        let test = if cur.eat_word("NULL") {
            if negated { minfold_core::IsTest::NotNull } else { minfold_core::IsTest::Null }
        } else if cur.eat_word("TRUE") {
            if negated { minfold_core::IsTest::NotTrue } else { minfold_core::IsTest::True }
        } else if cur.eat_word("FALSE") {
            if negated { minfold_core::IsTest::NotFalse } else { minfold_core::IsTest::False }
        } else if cur.eat_word("UNKNOWN") {
            if negated { minfold_core::IsTest::NotUnknown } else { minfold_core::IsTest::Unknown }
        } else {
            return Err(conversion_error("expected NULL/TRUE/FALSE/UNKNOWN after IS"));
        };
        return Ok(Expr::Is { expr: Box::new(expr), test });
    }

    let negated = cur.is_word("NOT") && (cur.is_word_at(1, "BETWEEN") || cur.is_word_at(1, "IN") || cur.is_word_at(1, "LIKE"));
    if negated {
        cur.advance();
    }

    if cur.eat_word("BETWEEN") {
        let low = parse_additive(cur, source)?;
        cur.expect_word("AND")?;
        let high = parse_additive(cur, source)?;
        return Ok(Expr::Between { expr: Box::new(expr), low: Box::new(low), high: Box::new(high), negated });
    }

    if cur.eat_word("IN") {
        cur.expect_punct("(")?;
        let mut list = Vec::new();
        if !cur.is_punct(")") {
            loop {
                list.push(parse_or_expr(cur, source)?);
                if !cur.eat_punct(",") {
                    break;
                }
            }
        }
        cur.expect_punct(")")?;
        return Ok(Expr::In { expr: Box::new(expr), list, negated });
    }

    if cur.eat_word("LIKE") {
        let right = parse_additive(cur, source)?;
        let cmp = Expr::Comparison {
            left: Box::new(expr),
            op: minfold_core::ComparisonOp::Like,
            right: Box::new(right),
            quantifier: None,
        };
        return Ok(if negated { Expr::Not(Box::new(cmp)) } else { cmp });
    }

    let op = if cur.eat_punct("=") {
        Some(minfold_core::ComparisonOp::Equal)
    } else if cur.eat_punct("<>") || cur.eat_punct("!=") {
        Some(minfold_core::ComparisonOp::NotEqual)
    } else if cur.eat_punct(">=") {
        Some(minfold_core::ComparisonOp::GreaterThanOrEqual)
    } else if cur.eat_punct("<=") {
        Some(minfold_core::ComparisonOp::LessThanOrEqual)
    } else if cur.eat_punct(">") {
        Some(minfold_core::ComparisonOp::GreaterThan)
    } else if cur.eat_punct("<") {
        Some(minfold_core::ComparisonOp::LessThan)
    } else {
        None
    };

    if let Some(op) = op {
        let right = parse_additive(cur, source)?;
        return Ok(Expr::Comparison { left: Box::new(expr), op, right: Box::new(right), quantifier: None });
    }

    Ok(expr)
}

fn parse_additive(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    let mut left = parse_multiplicative(cur, source)?;
    loop {
        let op = if cur.eat_punct("+") {
            minfold_core::BinaryOperator::Add
        } else if cur.eat_punct("-") {
            minfold_core::BinaryOperator::Subtract
        } else {
            break;
        };
        let right = parse_multiplicative(cur, source)?;
        left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_multiplicative(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    let mut left = parse_unary(cur, source)?;
    loop {
        let op = if cur.eat_punct("*") {
            minfold_core::BinaryOperator::Multiply
        } else if cur.eat_punct("/") {
            minfold_core::BinaryOperator::Divide
        } else if cur.eat_punct("%") {
            minfold_core::BinaryOperator::Modulo
        } else {
            break;
        };
        let right = parse_unary(cur, source)?;
        left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_unary(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    if cur.eat_punct("-") {
        let inner = parse_unary(cur, source)?;
        return Ok(Expr::UnaryOp { op: UnaryOperator::Minus, expr: Box::new(inner) });
    }
    if cur.eat_punct("+") {
        let inner = parse_unary(cur, source)?;
        return Ok(Expr::UnaryOp { op: UnaryOperator::Plus, expr: Box::new(inner) });
    }
    parse_primary(cur, source)
}

fn parse_primary(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    let tok = cur.peek().cloned().ok_or_else(|| conversion_error("expected an expression"))?;

    if tok.kind == TokKind::Num {
        cur.advance();
        if tok.text.contains('.') {
            let value: f64 = tok.text.parse().map_err(|_| conversion_error("invalid numeric literal"))?;
            return Ok(Expr::Literal(Literal::Float(value)));
        }
        let value: i64 = tok.text.parse().map_err(|_| conversion_error("invalid integer literal"))?;
        return Ok(Expr::Literal(Literal::Integer(value)));
    }

    if tok.kind == TokKind::Str {
        cur.advance();
        return Ok(Expr::Literal(Literal::String(tok.text.clone())));
    }

    if cur.is_word("NULL") {
        cur.advance();
        return Ok(Expr::Null);
    }

    if cur.is_word("CAST") {
        return parse_cast(cur, source);
    }

    if cur.is_word("CASE") {
        return parse_case(cur, source);
    }

    if cur.is_punct("(") {
        cur.advance();
        let inner = parse_or_expr(cur, source)?;
        cur.expect_punct(")")?;
        return Ok(Expr::Paren(Box::new(inner)));
    }

    if tok.kind == TokKind::Word || tok.kind == TokKind::Quoted {
        let name = parse_ident_token(cur)?;
        if cur.eat_punct(".") {
            let field = parse_ident_token(cur)?;
            return Ok(Expr::QualifiedIdent { qualifier: name, name: field });
        }
        if cur.is_punct("(") {
            cur.advance();
            let distinct = cur.eat_word("DISTINCT");
            let mut args = Vec::new();
            if !cur.is_punct(")") {
                loop {
                    args.push(parse_or_expr(cur, source)?);
                    if !cur.eat_punct(",") {
                        break;
                    }
                }
            }
            cur.expect_punct(")")?;
            return Ok(Expr::Function { name: name.value, args, distinct, over: None });
        }
        return Ok(Expr::Ident(name));
    }

    Err(conversion_error(format!("unexpected token {} in expression", cur.describe_current())))
}

fn parse_cast(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    cur.expect_word("CAST")?;
    cur.expect_punct("(")?;
    let expr = parse_or_expr(cur, source)?;
    cur.expect_word("AS")?;
    let data_type = parse_data_type(cur, source)?;
    cur.expect_punct(")")?;
    Ok(Expr::Cast { expr: Box::new(expr), data_type })
}

fn parse_case(cur: &mut Cursor, source: &str) -> ConversionResult<Expr> {
    cur.expect_word("CASE")?;
    let operand = if cur.is_word("WHEN") {
        None
    } else {
        Some(Box::new(parse_or_expr(cur, source)?))
    };

    let mut when_clauses = Vec::new();
    while cur.eat_word("WHEN") {
        let when_expr = parse_or_expr(cur, source)?;
        cur.expect_word("THEN")?;
        let then_expr = parse_or_expr(cur, source)?;
        when_clauses.push((when_expr, then_expr));
    }

    let else_clause = if cur.eat_word("ELSE") {
        Some(Box::new(parse_or_expr(cur, source)?))
    } else {
        None
    };

    cur.expect_word("END")?;
    Ok(Expr::Case { operand, when_clauses, else_clause })
}

fn parse_ident_token(cur: &mut Cursor) -> ConversionResult<Ident> {
    let tok = cur
        .advance()
        .ok_or_else(|| conversion_error("expected an identifier, found end of statement"))?;
    match tok.kind {
        TokKind::Quoted => Ok(Ident::quoted(tok.text)),
        TokKind::Word => Ok(Ident::unquoted(tok.text)),
        _ => Err(conversion_error(format!("expected an identifier, found `{}`", tok.text))),
    }
}

// ---------------------------------------------------------------------
// Shared DDL grammar helpers
// ---------------------------------------------------------------------

fn parse_qualified_name(cur: &mut Cursor) -> ConversionResult<QualifiedName> {
    let first = parse_ident_token(cur)?;
    if cur.eat_punct(".") {
        let second = parse_ident_token(cur)?;
        return Ok(QualifiedName { schema: Some(first), name: second });
    }
    Ok(QualifiedName { schema: None, name: first })
}

fn parse_ident_list(cur: &mut Cursor) -> ConversionResult<Vec<Ident>> {
    cur.expect_punct("(")?;
    let mut idents = Vec::new();
    loop {
        idents.push(parse_ident_token(cur)?);
        if !cur.eat_punct(",") {
            break;
        }
    }
    cur.expect_punct(")")?;
    Ok(idents)
}

fn parse_index_column_list(cur: &mut Cursor) -> ConversionResult<Vec<IndexColumn>> {
    cur.expect_punct("(")?;
    let mut columns = Vec::new();
    loop {
        let name = parse_ident_token(cur)?;
        let order = if cur.eat_word("DESC") {
            SortOrder::Desc
        } else {
            cur.eat_word("ASC");
            SortOrder::Asc
        };
        columns.push(IndexColumn { name, order });
        if !cur.eat_punct(",") {
            break;
        }
    }
    cur.expect_punct(")")?;
    Ok(columns)
}

fn parse_signed_integer(cur: &mut Cursor) -> ConversionResult<i64> {
    let negative = cur.eat_punct("-");
    if negative {
        // allow nothing between - and digits
    } else {
        cur.eat_punct("+");
    }
    let tok = cur
        .advance()
        .ok_or_else(|| conversion_error("expected an integer"))?;
    if tok.kind != TokKind::Num {
        return Err(conversion_error(format!("expected an integer, found `{}`", tok.text)));
    }
    let value: i64 = tok.text.parse().map_err(|_| conversion_error("invalid integer"))?;
    Ok(if negative { -value } else { value })
}

/// Captures a data type's raw text (name plus optional `(args)`) without
/// semantic interpretation; [`normalize::normalize_object`] folds it into a
/// canonical [`DataType`] variant afterward.
fn parse_data_type(cur: &mut Cursor, source: &str) -> ConversionResult<DataType> {
    let name = cur
        .advance()
        .ok_or_else(|| conversion_error("expected a data type"))?;
    if name.kind != TokKind::Word && name.kind != TokKind::Quoted {
        return Err(conversion_error(format!("expected a data type, found `{}`", name.text)));
    }
    let mut text = name.text.clone();

    // `national char varying`, `double precision`-style multi-word names
    // are rare enough in T-SQL DDL to skip; SQL Server spells nvarchar as
    // one word. No extra words are consumed here.

    if cur.is_punct("(") {
        let args = capture_parenthesized(cur, source)?;
        text = format!("{text}({args})");
    }

    Ok(DataType::Custom(text))
}

fn parse_identity(cur: &mut Cursor) -> ConversionResult<Identity> {
    cur.expect_word("IDENTITY")?;
    let (seed, increment) = if cur.eat_punct("(") {
        let seed = parse_signed_integer(cur)?;
        cur.expect_punct(",")?;
        let increment = parse_signed_integer(cur)?;
        cur.expect_punct(")")?;
        (seed, increment)
    } else {
        (1, 1)
    };
    let not_for_replication = eat_not_for_replication(cur);
    Ok(Identity { seed, increment, not_for_replication })
}

fn eat_not_for_replication(cur: &mut Cursor) -> bool {
    if cur.is_word("NOT") && cur.is_word_at(1, "FOR") && cur.is_word_at(2, "REPLICATION") {
        cur.advance();
        cur.advance();
        cur.advance();
        true
    } else {
        false
    }
}

fn parse_fk_action(cur: &mut Cursor) -> ConversionResult<ForeignKeyAction> {
    if cur.eat_word("CASCADE") {
        return Ok(ForeignKeyAction::Cascade);
    }
    if cur.eat_word("NO") {
        cur.expect_word("ACTION")?;
        return Ok(ForeignKeyAction::NoAction);
    }
    if cur.eat_word("SET") {
        if cur.eat_word("NULL") {
            return Ok(ForeignKeyAction::SetNull);
        }
        cur.expect_word("DEFAULT")?;
        return Ok(ForeignKeyAction::SetDefault);
    }
    Err(conversion_error(format!(
        "expected CASCADE/NO ACTION/SET NULL/SET DEFAULT, found {}",
        cur.describe_current()
    )))
}

fn parse_optional_clustered(cur: &mut Cursor) -> bool {
    if cur.eat_word("CLUSTERED") {
        true
    } else {
        cur.eat_word("NONCLUSTERED");
        false
    }
}

// ---------------------------------------------------------------------
// CREATE TABLE
// ---------------------------------------------------------------------

struct TableBuild {
    table: Table,
    extra_indexes: Vec<IndexDef>,
}

fn parse_create_table(cur: &mut Cursor, source: &str) -> ConversionResult<Vec<SchemaObject>> {
    cur.expect_word("CREATE")?;
    cur.expect_word("TABLE")?;
    let name = parse_qualified_name(cur)?;

    let mut build = TableBuild {
        table: Table {
            name,
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            options: TableOptions::default(),
        },
        extra_indexes: Vec::new(),
    };

    cur.expect_punct("(")?;
    if !cur.is_punct(")") {
        loop {
            parse_table_element(cur, source, &mut build)?;
            if !cur.eat_punct(",") {
                break;
            }
        }
    }
    cur.expect_punct(")")?;

    let mut objects = vec![SchemaObject::Table(build.table)];
    for index in build.extra_indexes {
        objects.push(SchemaObject::Index(index));
    }
    Ok(objects)
}

fn parse_table_element(cur: &mut Cursor, source: &str, build: &mut TableBuild) -> ConversionResult<()> {
    let is_constraint_start = cur.is_word("CONSTRAINT")
        || cur.is_word("PRIMARY")
        || cur.is_word("FOREIGN")
        || cur.is_word("UNIQUE")
        || (cur.is_word("CHECK") && !cur.is_word_at(1, "("));

    // `CHECK (` at column position would be ambiguous with a column named
    // `check`; T-SQL reserves CHECK as a keyword so treat it as a
    // table-level constraint whenever it's followed by `(`.
    let is_check_constraint = cur.is_word("CHECK") && cur.is_word_at(1, "(");

    if is_constraint_start || is_check_constraint {
        parse_table_constraint(cur, source, build, None)
    } else {
        parse_column_def(cur, source, build)
    }
}

fn parse_table_constraint(
    cur: &mut Cursor,
    source: &str,
    build: &mut TableBuild,
    carried_name: Option<Ident>,
) -> ConversionResult<()> {
    let name = if carried_name.is_some() {
        carried_name
    } else if cur.eat_word("CONSTRAINT") {
        Some(parse_ident_token(cur)?)
    } else {
        None
    };

    if cur.eat_word("PRIMARY") {
        cur.expect_word("KEY")?;
        let clustered = parse_optional_clustered(cur);
        // An inline single-column constraint (`col INT CONSTRAINT pk PRIMARY
        // KEY`) carries no column list; the caller fills it in from the
        // column being defined.
        let columns = if cur.is_punct("(") {
            parse_index_column_list(cur)?.into_iter().map(|c| c.name).collect()
        } else {
            Vec::new()
        };
        build.table.primary_key = Some(PrimaryKey { name, columns, clustered });
        return Ok(());
    }

    if cur.eat_word("UNIQUE") {
        parse_optional_clustered(cur);
        let columns = if cur.is_punct("(") { parse_index_column_list(cur)? } else { Vec::new() };
        build.extra_indexes.push(IndexDef {
            name,
            owner: IndexOwner::Table(build.table.name.clone()),
            columns,
            unique: true,
            where_clause: None,
            extra: Default::default(),
        });
        return Ok(());
    }

    if cur.eat_word("FOREIGN") {
        cur.expect_word("KEY")?;
        let columns = parse_ident_list(cur)?;
        cur.expect_word("REFERENCES")?;
        let referenced_table = parse_qualified_name(cur)?;
        let referenced_columns = parse_ident_list(cur)?;

        let mut on_delete = None;
        let mut on_update = None;
        loop {
            if cur.eat_word("ON") {
                if cur.eat_word("DELETE") {
                    on_delete = Some(parse_fk_action(cur)?);
                    continue;
                }
                if cur.eat_word("UPDATE") {
                    on_update = Some(parse_fk_action(cur)?);
                    continue;
                }
            }
            break;
        }

        build.table.foreign_keys.push(ForeignKey {
            name,
            columns,
            referenced_table,
            referenced_columns,
            on_delete,
            on_update,
            extra: Default::default(),
        });
        return Ok(());
    }

    if cur.eat_word("CHECK") {
        let text = capture_parenthesized(cur, source)?;
        let expr = parse_expr_best_effort(&text);
        build.table.checks.push(CheckConstraint { name, expr });
        return Ok(());
    }

    Err(conversion_error(format!(
        "expected a table constraint, found {}",
        cur.describe_current()
    )))
}

fn parse_column_def(cur: &mut Cursor, source: &str, build: &mut TableBuild) -> ConversionResult<()> {
    let name = parse_ident_token(cur)?;

    if cur.eat_word("AS") {
        let text = capture_parenthesized(cur, source)?;
        let expr = parse_expr_best_effort(&text);
        let persisted = cur.eat_word("PERSISTED");
        let not_null = if cur.eat_word("NOT") {
            cur.expect_word("NULL")?;
            true
        } else {
            cur.eat_word("NULL");
            false
        };
        build.table.columns.push(Column {
            name,
            data_type: DataType::Custom(String::new()),
            not_null,
            default: None,
            identity: None,
            generated: Some(GeneratedColumn { expr, persisted }),
            collation: None,
            extra: Default::default(),
        });
        return Ok(());
    }

    let data_type = parse_data_type(cur, source)?;

    let mut column = Column {
        name,
        data_type,
        not_null: false,
        default: None,
        identity: None,
        generated: None,
        collation: None,
        extra: Default::default(),
    };

    loop {
        if cur.is_word("IDENTITY") {
            column.identity = Some(parse_identity(cur)?);
            continue;
        }
        if cur.eat_word("COLLATE") {
            let tok = cur.advance().ok_or_else(|| conversion_error("expected a collation name"))?;
            column.collation = Some(tok.text);
            continue;
        }
        if cur.eat_word("NOT") {
            cur.expect_word("NULL")?;
            column.not_null = true;
            continue;
        }
        if cur.eat_word("NULL") {
            column.not_null = false;
            continue;
        }

        let default_constraint_name = if cur.eat_word("CONSTRAINT") {
            Some(parse_ident_token(cur)?)
        } else {
            None
        };

        if cur.eat_word("DEFAULT") {
            let text = if cur.is_punct("(") {
                capture_parenthesized(cur, source)?
            } else {
                capture_expr_until(cur, source, &["NOT", "NULL", "CONSTRAINT", "IDENTITY", "COLLATE"])?
            };
            column.default = Some(parse_expr_best_effort(&text));
            if let Some(constraint_name) = default_constraint_name {
                column.extra.insert(
                    minfold_core::extra_keys::mssql::DEFAULT_CONSTRAINT_NAME.to_string(),
                    minfold_core::Value::String(constraint_name.value),
                );
            }
            continue;
        }
        if let Some(constraint_name) = default_constraint_name {
            // a CONSTRAINT name was consumed but not followed by DEFAULT;
            // only inline PRIMARY KEY/UNIQUE/CHECK on a column use this shape.
            if cur.is_word("PRIMARY") || cur.is_word("UNIQUE") || cur.is_word("CHECK") {
                parse_table_constraint(cur, source, build, Some(constraint_name.clone()))?;
                // inline single-column constraint: fill in the column reference.
                if let Some(pk) = &mut build.table.primary_key {
                    if pk.columns.is_empty() {
                        pk.columns.push(column.name.clone());
                    }
                }
                if let Some(index) = build.extra_indexes.last_mut() {
                    if index.columns.is_empty() {
                        index.columns.push(IndexColumn { name: column.name.clone(), order: SortOrder::Asc });
                    }
                }
                continue;
            }
            return Err(conversion_error("expected DEFAULT after inline CONSTRAINT name"));
        }

        if cur.is_word("PRIMARY") {
            cur.advance();
            cur.expect_word("KEY")?;
            let clustered = parse_optional_clustered(cur);
            build.table.primary_key = Some(PrimaryKey { name: None, columns: vec![column.name.clone()], clustered });
            continue;
        }
        if cur.is_word("UNIQUE") {
            cur.advance();
            parse_optional_clustered(cur);
            build.extra_indexes.push(IndexDef {
                name: None,
                owner: IndexOwner::Table(build.table.name.clone()),
                columns: vec![IndexColumn { name: column.name.clone(), order: SortOrder::Asc }],
                unique: true,
                where_clause: None,
                extra: Default::default(),
            });
            continue;
        }
        if cur.is_word("CHECK") {
            cur.advance();
            let text = capture_parenthesized(cur, source)?;
            let expr = parse_expr_best_effort(&text);
            build.table.checks.push(CheckConstraint { name: None, expr });
            continue;
        }
        if eat_not_for_replication(cur) {
            continue;
        }

        break;
    }

    build.table.columns.push(column);
    Ok(())
}

// ---------------------------------------------------------------------
// CREATE INDEX
// ---------------------------------------------------------------------

fn parse_create_index(cur: &mut Cursor, source: &str) -> ConversionResult<Vec<SchemaObject>> {
    cur.expect_word("CREATE")?;
    let unique = cur.eat_word("UNIQUE");
    parse_optional_clustered(cur);
    cur.expect_word("INDEX")?;
    let name = parse_ident_token(cur)?;
    cur.expect_word("ON")?;
    let table_name = parse_qualified_name(cur)?;
    let columns = parse_index_column_list(cur)?;

    let where_clause = if cur.eat_word("WHERE") {
        let text = capture_expr_until(cur, source, &["WITH"])?;
        Some(parse_expr_best_effort(&text))
    } else {
        None
    };

    Ok(vec![SchemaObject::Index(IndexDef {
        name: Some(name),
        owner: IndexOwner::Table(table_name),
        columns,
        unique,
        where_clause,
        extra: Default::default(),
    })])
}

// ---------------------------------------------------------------------
// CREATE SEQUENCE
// ---------------------------------------------------------------------

fn parse_create_sequence(cur: &mut Cursor, source: &str) -> ConversionResult<Vec<SchemaObject>> {
    cur.expect_word("CREATE")?;
    cur.expect_word("SEQUENCE")?;
    let name = parse_qualified_name(cur)?;

    let mut sequence = Sequence {
        name,
        data_type: None,
        increment: None,
        min_value: None,
        max_value: None,
        start: None,
        cache: None,
        cycle: false,
    };

    loop {
        if cur.eat_word("AS") {
            sequence.data_type = Some(parse_data_type(cur, source)?);
            continue;
        }
        if cur.eat_word("START") {
            cur.eat_word("WITH");
            sequence.start = Some(parse_signed_integer(cur)?);
            continue;
        }
        if cur.eat_word("INCREMENT") {
            cur.eat_word("BY");
            sequence.increment = Some(parse_signed_integer(cur)?);
            continue;
        }
        if cur.eat_word("MINVALUE") {
            sequence.min_value = Some(parse_signed_integer(cur)?);
            continue;
        }
        if cur.eat_word("MAXVALUE") {
            sequence.max_value = Some(parse_signed_integer(cur)?);
            continue;
        }
        if cur.eat_word("NO") {
            if cur.eat_word("MINVALUE") || cur.eat_word("MAXVALUE") || cur.eat_word("CACHE") || cur.eat_word("CYCLE") {
                continue;
            }
            break;
        }
        if cur.eat_word("CACHE") {
            if cur.peek().is_some_and(|t| t.kind == TokKind::Num) {
                sequence.cache = Some(parse_signed_integer(cur)?);
            }
            continue;
        }
        if cur.eat_word("CYCLE") {
            sequence.cycle = true;
            continue;
        }
        break;
    }

    Ok(vec![SchemaObject::Sequence(sequence)])
}

// ---------------------------------------------------------------------
// CREATE/ALTER PROCEDURE
// ---------------------------------------------------------------------

fn parse_create_procedure(statement_sql: &str) -> ConversionResult<Vec<SchemaObject>> {
    let mut cur = Cursor::new(statement_sql);
    if !cur.eat_word("CREATE") {
        cur.expect_word("ALTER")?;
    }
    cur.eat_word("OR");
    cur.eat_word("ALTER");
    if !cur.eat_word("PROCEDURE") {
        cur.expect_word("PROC")?;
    }
    let name = parse_qualified_name(&mut cur)?;

    Ok(vec![SchemaObject::StoredProcedure(StoredProcedure {
        name,
        definition: statement_sql.trim().to_string(),
    })])
}

// ---------------------------------------------------------------------
// Statement dispatch
// ---------------------------------------------------------------------

fn parse_statement(statement_sql: &str) -> ConversionResult<Vec<SchemaObject>> {
    let chars: Vec<char> = statement_sql.chars().collect();
    let words: Vec<String> = peek_words(&chars, 0, 3).iter().map(|w| w.to_ascii_lowercase()).collect();

    match (words.first().map(String::as_str), words.get(1).map(String::as_str)) {
        (Some("create"), Some("table")) => {
            tokenize_with_sqlparser(statement_sql)?;
            let mut cur = Cursor::new(statement_sql);
            parse_create_table(&mut cur, statement_sql)
        }
        (Some("create"), Some("index")) | (Some("create"), Some("unique")) | (Some("create"), Some("clustered"))
        | (Some("create"), Some("nonclustered")) => {
            tokenize_with_sqlparser(statement_sql)?;
            let mut cur = Cursor::new(statement_sql);
            parse_create_index(&mut cur, statement_sql)
        }
        (Some("create"), Some("sequence")) => {
            tokenize_with_sqlparser(statement_sql)?;
            let mut cur = Cursor::new(statement_sql);
            parse_create_sequence(&mut cur, statement_sql)
        }
        (Some("create"), Some("procedure")) | (Some("create"), Some("proc")) | (Some("create"), Some("or"))
        | (Some("alter"), Some("procedure")) | (Some("alter"), Some("proc")) => {
            parse_create_procedure(statement_sql)
        }
        _ => Ok(Vec::new()),
    }
}

/// Runs a statement through `sqlparser`'s MSSQL dialect before the
/// hand-rolled conversion below touches it. `sqlparser` owns tokenization
/// of the generic DDL surface (quoting, comments, parenthesized nesting,
/// string escaping); a statement that doesn't even tokenize as SQL under
/// `MsSqlDialect` is rejected here rather than handed to the recursive
/// descent converter. The parsed AST itself is discarded: the T-SQL
/// residue (`IDENTITY`, computed columns, `NOT FOR REPLICATION`) that the
/// converter below extracts isn't modeled faithfully by `sqlparser`'s
/// generic `CreateTable`/`ColumnDef` shapes, so conversion still walks the
/// original source text rather than the parsed tree.
fn tokenize_with_sqlparser(statement_sql: &str) -> ConversionResult<()> {
    Parser::parse_sql(&MsSqlDialect {}, statement_sql)
        .map(|_| ())
        .map_err(|source| conversion_error(format!("sqlparser rejected statement: {source}")))
}
