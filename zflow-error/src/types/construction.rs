use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка сборки endpoint'а или handle'а из набора колбэков.
///
/// Фатальна: объект, который не удалось собрать, не существует.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// Обязательный колбэк не был передан в builder.
    #[error("{0} callback is missing")]
    MissingCallback(&'static str),

    /// Политика требует эскалации нарушений спроса, но канал не передан.
    #[error("escalating demand policy requires an escalation channel")]
    MissingEscalationChannel,
}

impl ErrorExt for ConstructionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCallback(_) => StatusCode::MissingCallback,
            Self::MissingEscalationChannel => StatusCode::MissingEscalationChannel,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "construction".to_string()),
            ("status_code", self.status_code().to_string()),
        ];
        if let Self::MissingCallback(name) = self {
            tags.push(("callback", name.to_string()));
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_callback() {
        let err = ConstructionError::MissingCallback("on_data");
        assert_eq!(err.to_string(), "on_data callback is missing");
        assert_eq!(err.status_code(), StatusCode::MissingCallback);
        assert!(err
            .metrics_tags()
            .iter()
            .any(|(k, v)| *k == "callback" && v == "on_data"));
    }

    #[test]
    fn test_missing_escalation_channel() {
        let err = ConstructionError::MissingEscalationChannel;
        assert_eq!(err.status_code(), StatusCode::MissingEscalationChannel);
        assert!(!err.metrics_tags().iter().any(|(k, _)| *k == "callback"));
    }
}
