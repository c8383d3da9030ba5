use std::any::Any;

use thiserror::Error;
pub use zflow_error::{
    bail, ensure, ConstructionError, ErrorExt, LogLevel, ProtocolViolation, ResultExt,
    StackError, StatusCode, TerminalKind, ZflowResult,
};

/// Ошибки инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    #[error("Failed to install global subscriber: {0}")]
    Init(String),
}

impl ErrorExt for LoggingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidLevel(_) | Self::InvalidFormat(_) => StatusCode::InvalidConfig,
            Self::Init(_) => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Пишет отклонённый сигнал в лог на уровне, который задаёт код статуса
/// ошибки, вместе с её тегами.
pub(crate) fn log_rejected(
    err: &StackError,
    handle: Option<u64>,
    message: &str,
) {
    let code = err.status_code().code();
    let tags = err.metrics_tags();
    match err.log_level() {
        LogLevel::Trace => tracing::trace!(handle, code, error = %err, ?tags, "{message}"),
        LogLevel::Debug => tracing::debug!(handle, code, error = %err, ?tags, "{message}"),
        LogLevel::Info => tracing::info!(handle, code, error = %err, ?tags, "{message}"),
        LogLevel::Warn => tracing::warn!(handle, code, error = %err, ?tags, "{message}"),
        LogLevel::Error => tracing::error!(
            handle,
            code,
            critical = err.is_critical(),
            error = %err,
            ?tags,
            "{message}"
        ),
    }
}

/// Оборачивает нарушение протокола в `Err`, предварительно записав его в лог.
pub(crate) fn rejected<R>(
    violation: ProtocolViolation,
    handle: Option<u64>,
    message: &str,
) -> ZflowResult<R> {
    let err = StackError::new(violation);
    log_rejected(&err, handle, message);
    Err(err)
}
