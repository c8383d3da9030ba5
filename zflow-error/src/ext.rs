use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок библиотеки (object-safe).
///
/// Предоставляет вспомогательные методы для работы с ошибками:
/// - извлечение статус-кода,
/// - безопасное сообщение для внешнего кода,
/// - детализированное сообщение для логов,
/// - формирование тегов для систем наблюдаемости.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any),
    /// чтобы можно было выполнить downcast к конкретному типу.
    fn as_any(&self) -> &dyn Any;

    /// Безопасное сообщение для внешнего кода.
    ///
    /// Для внутренних ошибок возвращает строку `"Internal error"`.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected => {
                "Internal error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Набор тегов для систем наблюдаемости.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Имя типа ошибки (для метрик или логирования).
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, error::Error, fmt};

    use super::*;

    // Ошибка без переопределения status_code (default = Internal).
    #[derive(Debug)]
    struct DefaultError(pub &'static str);

    impl fmt::Display for DefaultError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "DefaultError: {}", self.0)
        }
    }

    impl Error for DefaultError {}

    impl ErrorExt for DefaultError {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct DemandError(pub i64);

    impl fmt::Display for DemandError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "bad demand {}", self.0)
        }
    }

    impl Error for DemandError {}

    impl ErrorExt for DemandError {
        fn status_code(&self) -> StatusCode {
            StatusCode::InvalidDemand
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что по умолчанию статус ошибки — `Internal`, а
    /// сообщение для внешнего кода не раскрывает деталей.
    #[test]
    fn test_default_status_code_is_internal() {
        let e = DefaultError("sensitive");
        assert_eq!(e.status_code(), StatusCode::Internal);
        assert_eq!(e.client_message(), "Internal error");
    }

    /// Тест проверяет, что для не-internal кодов `client_message` возвращает
    /// `Display`.
    #[test]
    fn test_client_message_non_internal() {
        let e = DemandError(0);
        assert_eq!(e.client_message(), "bad demand 0");
    }

    /// Тест проверяет, что `as_any` позволяет выполнить downcast.
    #[test]
    fn test_as_any_downcast() {
        let e = DemandError(-3);
        let down = e.as_any().downcast_ref::<DemandError>();
        assert_eq!(down.map(|d| d.0), Some(-3));
    }

    /// Тест проверяет, что `metrics_tags` содержит `error_type` и
    /// `status_code`, а `type_name` - короткое имя типа.
    #[test]
    fn test_metrics_tags_and_type_name() {
        let e = DemandError(1);
        let tags = e.metrics_tags();
        assert!(tags.iter().any(|(k, v)| *k == "error_type" && v == "DemandError"));
        assert!(tags
            .iter()
            .any(|(k, v)| *k == "status_code" && v == &StatusCode::InvalidDemand.to_string()));
        assert_eq!(e.log_message(), format!("{e:?}"));
    }
}
