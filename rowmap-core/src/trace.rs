//! Statement tracing
//!
//! Every statement a [`Db`](crate::Db) or one of its builders executes is
//! offered to the installed [`SqlTracer`], together with its bound values as
//! display strings. Nothing is formatted while no tracer is installed.

use crate::Value;
use std::sync::{Arc, RwLock};
use tracing::Level;

/// Receives each executed statement and its arguments.
pub trait SqlTracer: Send + Sync {
    fn trace(&self, statement: &str, args: &[String]);
}

impl<F> SqlTracer for F
where
    F: Fn(&str, &[String]) + Send + Sync,
{
    fn trace(&self, statement: &str, args: &[String]) {
        self(statement, args)
    }
}

/// Slot holding the current tracer, shared by a `Db` and everything derived from it.
#[derive(Clone, Default)]
pub struct TraceSink {
    slot: Arc<RwLock<Option<Arc<dyn SqlTracer>>>>,
}

impl std::fmt::Debug for TraceSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceSink")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl TraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, tracer: Arc<dyn SqlTracer>) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(tracer);
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<dyn SqlTracer>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Offer a statement to the installed tracer, if any.
    pub fn emit(&self, statement: &str, params: &[Value]) {
        if let Some(tracer) = self.current() {
            let args: Vec<String> = params.iter().map(Value::to_trace_string).collect();
            tracer.trace(statement, &args);
        }
    }
}

/// Number trace arguments from 1: `1:"bolt" 2:100`.
pub fn format_args(args: &[String]) -> String {
    args.iter()
        .enumerate()
        .map(|(i, arg)| format!("{}:{}", i + 1, arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(sql: &str, max: usize) -> &str {
    match sql.char_indices().nth(max) {
        Some((idx, _)) => &sql[..idx],
        None => sql,
    }
}

/// A [`SqlTracer`] that emits `tracing` events on target `rowmap.sql`.
#[derive(Debug, Clone)]
pub struct TracingSqlTracer {
    /// Text put in front of every statement
    pub prefix: String,
    /// Tracing event level to emit at
    pub level: Level,
    /// Truncate long SQL strings (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlTracer {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            level: Level::DEBUG,
            max_sql_length: None,
        }
    }
}

impl TracingSqlTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// The line this tracer logs: `<prefix><sql> [<args>]`
    pub fn render(&self, statement: &str, args: &[String]) -> String {
        let sql = match self.max_sql_length {
            Some(max) if statement.chars().count() > max => {
                format!("{}...", truncate_chars(statement, max))
            }
            _ => statement.to_string(),
        };
        format!("{}{} [{}]", self.prefix, sql, format_args(args))
    }
}

impl SqlTracer for TracingSqlTracer {
    fn trace(&self, statement: &str, args: &[String]) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN => tracing::warn!($($field)*),
                    Level::INFO => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let line = self.render(statement, args);
        emit_at_level!(
            self.level,
            target: "rowmap.sql",
            param_count = args.len(),
            "{}",
            line
        );
    }
}
