/// An injected sink for advisory diagnostics emitted while diffing and
/// generating a migration. Generation must never depend on what the sink
/// does with an event — it exists purely so an embedding application can
/// observe progress without the core reaching for process-wide logging
/// state.
pub trait LogSink: Send + Sync {
    fn log(&self, event: LogEvent<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone, Copy)]
pub struct LogEvent<'a> {
    pub level: LogLevel,
    pub message: &'a str,
}

impl<'a> LogEvent<'a> {
    #[must_use]
    pub fn info(message: &'a str) -> Self {
        Self {
            level: LogLevel::Info,
            message,
        }
    }

    #[must_use]
    pub fn warn(message: &'a str) -> Self {
        Self {
            level: LogLevel::Warn,
            message,
        }
    }

    #[must_use]
    pub fn debug(message: &'a str) -> Self {
        Self {
            level: LogLevel::Debug,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn log(&self, _event: LogEvent<'_>) {}
}

pub static NOOP_LOG_SINK: NoopLogSink = NoopLogSink;
