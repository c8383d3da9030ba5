use std::fmt;

use num_enum::TryFromPrimitive;

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки конструирования (неполный набор колбэков)
/// - 8xxx: Нарушения протокола сигналов
///
/// `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unsupported = 1001,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,
    NotImplemented = 1005,
    InvalidConfig = 1006,

    // === 2xxx: Конструирование ===
    MissingCallback = 2000,
    MissingEscalationChannel = 2001,

    // === 8xxx: Протокол ===
    ProtocolError = 8000,
    AlreadySubscribed = 8001,
    NotSubscribed = 8002,
    AlreadyTerminated = 8003,
    InvalidDemand = 8004,
    DemandAfterCancel = 8005,
    AlreadyCancelled = 8006,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    ///
    /// Использует `TryFrom<u32>` из `num_enum`; возвращает `None`, если
    /// значение не соответствует ни одному варианту.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Нарушение протокола сигналов (диапазон 8xxx).
    pub fn is_protocol_error(&self) -> bool {
        (8000..=8999).contains(&self.code())
    }

    /// Ошибка конструирования (диапазон 2xxx).
    pub fn is_construction_error(&self) -> bool {
        (2000..=2999).contains(&self.code())
    }

    /// Требуется ли логировать как критическую ошибку.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Internal | Self::Unexpected)
    }

    /// Рекомендуемый уровень логирования для данного кода.
    ///
    /// Нарушения протокола - ошибка вызывающей стороны, а не наша,
    /// поэтому они уходят в `Debug`.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::AlreadySubscribed
            | Self::NotSubscribed
            | Self::AlreadyTerminated
            | Self::InvalidDemand
            | Self::DemandAfterCancel
            | Self::AlreadyCancelled
            | Self::ProtocolError => LogLevel::Debug,
            Self::InvalidArgs
            | Self::InvalidConfig
            | Self::MissingCallback
            | Self::MissingEscalationChannel => LogLevel::Info,
            Self::Internal | Self::Unexpected => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
