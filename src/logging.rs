//! Logging facade
//!
//! The adapter logs through an injected sink rather than calling a
//! logging framework directly. When logging is disabled the logger is a
//! no-op; enabling logging without attaching a sink is a configuration
//! error raised at construction, not at first use.

use std::sync::Arc;

use crate::error::{AssetFsError, Result};

/// Severity levels emitted by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Warning,
    Error,
    Critical,
}

/// Structured log sink capability.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, String)]);
}

/// Default sink forwarding to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, String)]) {
        let context = context
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        match level {
            LogLevel::Debug => tracing::debug!(%context, "{message}"),
            LogLevel::Warning => tracing::warn!(%context, "{message}"),
            LogLevel::Error => tracing::error!(%context, "{message}"),
            LogLevel::Critical => tracing::error!(%context, critical = true, "{message}"),
        }
    }
}

/// The adapter's handle on its sink: a no-op unless enabled.
#[derive(Clone, Default)]
pub struct AdapterLogger {
    sink: Option<Arc<dyn LogSink>>,
}

impl AdapterLogger {
    /// A disabled logger.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// An enabled logger. Fails with [`AssetFsError::NoLoggerConfigured`]
    /// when `sink` is `None`.
    pub fn enabled(sink: Option<Arc<dyn LogSink>>) -> Result<Self> {
        match sink {
            Some(sink) => Ok(Self { sink: Some(sink) }),
            None => Err(AssetFsError::NoLoggerConfigured),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn debug(&self, message: &str, context: &[(&str, String)]) {
        self.log(LogLevel::Debug, message, context);
    }

    pub fn warning(&self, message: &str, context: &[(&str, String)]) {
        self.log(LogLevel::Warning, message, context);
    }

    pub fn error(&self, message: &str, context: &[(&str, String)]) {
        self.log(LogLevel::Error, message, context);
    }

    pub fn critical(&self, message: &str, context: &[(&str, String)]) {
        self.log(LogLevel::Critical, message, context);
    }

    fn log(&self, level: LogLevel, message: &str, context: &[(&str, String)]) {
        if let Some(sink) = &self.sink {
            sink.log(level, message, context);
        }
    }
}

impl std::fmt::Debug for AdapterLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
