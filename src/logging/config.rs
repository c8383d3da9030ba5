use std::{env, fmt, str::FromStr};

use crate::error::LoggingError;

/// Формат вывода событий.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Уровень для событий `zflow` (`trace`..`error`).
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

impl LoggingConfig {
    /// Применяет `ZFLOW_LOG_LEVEL` и `ZFLOW_LOG_FORMAT`, если заданы.
    ///
    /// Некорректный формат игнорируется с сообщением в stderr: логирование
    /// ещё не поднято.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("ZFLOW_LOG_LEVEL") {
            self.level = level.to_lowercase();
        }
        if let Ok(format) = env::var("ZFLOW_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Ignoring ZFLOW_LOG_FORMAT: {e}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(LoggingError::InvalidLevel(other.to_string())),
        }
    }

    /// Директива для `EnvFilter`: наш крейт на заданном уровне, остальное
    /// на `warn`.
    pub fn build_filter_directive(&self) -> String {
        format!("warn,zflow={}", self.level)
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        write!(f, "{name}")
    }
}
