use std::sync::{Arc, Weak};

use zflow_error::{StackError, ZflowResult};

/// Принимающая сторона канала эскалации.
///
/// Реализуется [`ConsumerEndpoint`](super::ConsumerEndpoint): ошибка
/// доставляется в путь `on_error` в обход проверки handshake, но никогда не
/// после терминального сигнала.
pub trait ErrorSink: Send + Sync {
    fn accept_escalated(
        &self,
        err: StackError,
    ) -> ZflowResult<EscalationOutcome>;
}

/// Результат [`ErrorEscalationChannel::escalate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Ошибка стала терминальной, колбэк `on_error` вызван.
    Delivered,
    /// Потребитель уже завершён или удалён; ошибка отброшена.
    Dropped,
}

/// Узкий обратный канал от handle'а к потребителю.
///
/// Держит только `Weak`-ссылку, поэтому не продлевает жизнь потребителя и не
/// образует цикл с `Arc<ProducerHandle>`, который хранит сам потребитель.
#[derive(Clone)]
pub struct ErrorEscalationChannel {
    sink: Weak<dyn ErrorSink>,
}

impl ErrorEscalationChannel {
    pub fn new<S: ErrorSink + 'static>(sink: &Arc<S>) -> Self {
        let sink: Weak<S> = Arc::downgrade(sink);
        Self { sink }
    }

    /// Передаёт `err` в путь ошибок потребителя.
    ///
    /// Ошибки пользовательского `on_error` пробрасываются вызывающему.
    pub fn escalate(
        &self,
        err: impl Into<StackError>,
    ) -> ZflowResult<EscalationOutcome> {
        let err = err.into();
        match self.sink.upgrade() {
            Some(sink) => sink.accept_escalated(err),
            None => {
                tracing::debug!(error = %err, "escalation dropped: consumer is gone");
                Ok(EscalationOutcome::Dropped)
            }
        }
    }

    /// Жив ли ещё потребитель на другом конце.
    pub fn is_connected(&self) -> bool {
        self.sink.strong_count() > 0
    }
}

impl std::fmt::Debug for ErrorEscalationChannel {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ErrorEscalationChannel")
            .field("connected", &self.is_connected())
            .finish()
    }
}
