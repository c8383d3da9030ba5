use std::{any::Any, fmt};

use thiserror::Error;

use crate::{ErrorExt, StackError, StatusCode};

/// Каким терминальным сигналом завершился endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalKind {
    Errored,
    Completed,
}

/// Сигнал пришёл вне допустимой последовательности.
///
/// По умолчанию возвращается синхронно тому, кто вызвал операцию. Нарушения,
/// обнаруженные на стороне handle'а, могут вместо этого эскалироваться в
/// `on_error` потребителя.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// Повторный handshake при строгой политике.
    #[error("already subscribed")]
    AlreadySubscribed,

    /// Данные или терминальный сигнал до handshake.
    #[error("not subscribed yet")]
    NotSubscribed,

    /// Сигнал после терминального сигнала.
    #[error("already {0}")]
    AlreadyTerminated(TerminalKind),

    /// `request_more(n)` с `n <= 0`.
    #[error("non-positive demand: n({0}) <= 0")]
    NonPositiveDemand(i64),

    /// `request_more` после `cancel()`.
    #[error("already cancelled: demand rejected")]
    DemandAfterCancel,

    /// Повторный `cancel()` при строгой политике.
    #[error("already cancelled")]
    AlreadyCancelled,
}

impl fmt::Display for TerminalKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Errored => write!(f, "errored"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl ErrorExt for ProtocolViolation {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadySubscribed => StatusCode::AlreadySubscribed,
            Self::NotSubscribed => StatusCode::NotSubscribed,
            Self::AlreadyTerminated(_) => StatusCode::AlreadyTerminated,
            Self::NonPositiveDemand(_) => StatusCode::InvalidDemand,
            Self::DemandAfterCancel => StatusCode::DemandAfterCancel,
            Self::AlreadyCancelled => StatusCode::AlreadyCancelled,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "protocol_violation".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::NonPositiveDemand(n) => tags.push(("demand", n.to_string())),
            Self::AlreadyTerminated(kind) => tags.push(("terminal", kind.to_string())),
            _ => {}
        }

        tags
    }
}

impl StackError {
    /// Возвращает нарушение протокола, если корневая ошибка - оно.
    pub fn protocol_violation(&self) -> Option<&ProtocolViolation> {
        self.downcast_ref::<ProtocolViolation>()
    }

    /// Проверяет, является ли корневая ошибка нарушением протокола.
    pub fn is_protocol_violation(&self) -> bool {
        self.protocol_violation().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ProtocolViolation::AlreadySubscribed.to_string(),
            "already subscribed"
        );
        assert_eq!(
            ProtocolViolation::AlreadyTerminated(TerminalKind::Errored).to_string(),
            "already errored"
        );
        assert_eq!(
            ProtocolViolation::NonPositiveDemand(-2).to_string(),
            "non-positive demand: n(-2) <= 0"
        );
    }

    #[test]
    fn test_status_codes_are_protocol_range() {
        let all = [
            ProtocolViolation::AlreadySubscribed,
            ProtocolViolation::NotSubscribed,
            ProtocolViolation::AlreadyTerminated(TerminalKind::Completed),
            ProtocolViolation::NonPositiveDemand(0),
            ProtocolViolation::DemandAfterCancel,
            ProtocolViolation::AlreadyCancelled,
        ];
        for v in all {
            assert!(v.status_code().is_protocol_error(), "{v:?}");
        }
    }

    #[test]
    fn test_metrics_tags_demand() {
        let tags = ProtocolViolation::NonPositiveDemand(0).metrics_tags();
        assert!(tags.iter().any(|(k, v)| *k == "demand" && v == "0"));
    }

    /// Тест проверяет хелперы `StackError` для нарушений протокола.
    #[test]
    fn test_stack_error_helpers() {
        let err = StackError::new(ProtocolViolation::NotSubscribed);
        assert!(err.is_protocol_violation());
        assert_eq!(
            err.protocol_violation(),
            Some(&ProtocolViolation::NotSubscribed)
        );

        let other = StackError::new(crate::ConstructionError::MissingCallback("on_demand"));
        assert!(!other.is_protocol_violation());
    }
}
