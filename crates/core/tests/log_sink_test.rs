use std::sync::{Arc, Mutex};

use minfold_core::{
    Column, DataType, DiffConfig, DiffEngine, Expr, Ident, LogEvent, LogLevel, LogSink, Literal,
    QualifiedName, SchemaObject, Table, TableOptions,
};

#[derive(Default)]
struct RecordingLogSink {
    messages: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogSink {
    fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.lock().expect("mutex should lock").clone()
    }
}

impl LogSink for RecordingLogSink {
    fn log(&self, event: LogEvent<'_>) {
        self.messages
            .lock()
            .expect("mutex should lock")
            .push((event.level, event.message.to_string()));
    }
}

fn ident(value: &str) -> Ident {
    Ident::unquoted(value)
}

fn qualified(name: &str) -> QualifiedName {
    QualifiedName {
        schema: Some(ident("dbo")),
        name: ident(name),
    }
}

fn table_with_column(name: &str, column_name: &str) -> Table {
    Table {
        name: qualified(name),
        columns: vec![Column {
            name: ident(column_name),
            data_type: DataType::Int,
            not_null: false,
            default: Some(Expr::Literal(Literal::Integer(0))),
            identity: None,
            generated: None,
            collation: None,
            extra: Default::default(),
        }],
        primary_key: None,
        foreign_keys: Vec::new(),
        checks: Vec::new(),
        options: TableOptions::default(),
    }
}

#[test]
fn enable_drop_false_logs_a_warning_when_ops_are_suppressed() {
    let sink = Arc::new(RecordingLogSink::default());
    let config = DiffConfig::new(
        false,
        Vec::new(),
        Arc::new(minfold_core::DefaultEquivalencePolicy),
    )
    .with_log_sink(sink.clone());

    let engine = DiffEngine::new(&config);
    let current = vec![SchemaObject::Table(table_with_column("users", "id"))];

    let outcome = engine
        .diff_with_diagnostics(&current, &[])
        .expect("diff should succeed");

    assert!(!outcome.diagnostics.is_empty());
    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, LogLevel::Warn);
    assert!(messages[0].1.contains("suppressed"));
}

#[test]
fn enable_drop_true_never_logs_a_suppression_warning() {
    let sink = Arc::new(RecordingLogSink::default());
    let config = DiffConfig::new(
        true,
        Vec::new(),
        Arc::new(minfold_core::DefaultEquivalencePolicy),
    )
    .with_log_sink(sink.clone());

    let engine = DiffEngine::new(&config);
    let current = vec![SchemaObject::Table(table_with_column("users", "id"))];

    engine
        .diff_with_diagnostics(&current, &[])
        .expect("diff should succeed");

    assert!(sink.messages().is_empty());
}
