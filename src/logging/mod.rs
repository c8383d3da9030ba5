//! Структурированное логирование через `tracing`.
//!
//! Библиотека только эмитит события (`trace`/`debug`/`warn` в машинах
//! состояний). Установка глобального подписчика - дело приложения или
//! тестов, для этого есть [`init_logging`].

pub mod config;
mod filters;
mod formatter;
pub mod handle;

pub use config::{LogFormat, LoggingConfig};
pub use handle::{LoggingHandle, LoggingMetrics, LoggingStats};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Инициализация логирования с конфигурацией.
///
/// Вывод идёт в stdout через неблокирующий writer; возвращаемый handle
/// нужно держать живым до конца работы.
pub fn init_logging(mut config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.apply_env_overrides();
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let layer = formatter::build_formatter_from_config(&config, writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT"),
        built = env!("BUILD_TIME"),
        log_level = %config.level,
        format = %config.format,
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(Some(guard)))
}
