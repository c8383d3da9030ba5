use std::sync::Arc;

use parking_lot::Mutex;
use zflow_error::{ProtocolViolation, StackError, TerminalKind, ZflowResult};

use super::{
    ConsumerCallbacks, ErrorEscalationChannel, ErrorSink, EscalationOutcome, ProducerHandle,
    Strictness,
};
use crate::error::rejected;

/// Наблюдаемое состояние endpoint'а.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Unsubscribed,
    Active,
    Terminated(TerminalKind),
}

#[derive(Clone)]
enum Terminal {
    Errored(StackError),
    Completed,
}

/// Handle и терминальное состояние как одна единица под одной блокировкой.
///
/// Наружу торчат только переходы; сырые поля не меняются напрямую.
#[derive(Default)]
struct ConsumerState {
    handle: Option<Arc<ProducerHandle>>,
    terminal: Option<Terminal>,
}

enum Handshake {
    Accepted,
    Rejected(ProtocolViolation),
}

/// Сторона потребителя: принимает handshake, данные и ровно один
/// терминальный сигнал.
///
/// Машина состояний:
///
/// ```text
/// Unsubscribed --on_handshake--> Active --on_error------> Terminated(Errored)
///                                  |  \--on_completion--> Terminated(Completed)
///                                  \--on_data (петля)
/// ```
///
/// Переходы выполняются под одним `Mutex`, пользовательские колбэки
/// вызываются уже после его освобождения, поэтому из них можно вызывать
/// любые операции endpoint'а и handle'а.
///
/// # Контракт производителя
///
/// `on_data` проверяет состояние под блокировкой, но сам колбэк данных
/// выполняется вне её. Производитель обязан не вызывать `on_data`
/// параллельно со своим терминальным сигналом или после него, и не
/// отправлять сигналы до возврата из `on_handshake`.
pub struct ConsumerEndpoint<T> {
    callbacks: Box<dyn ConsumerCallbacks<T>>,
    strictness: Strictness,
    state: Mutex<ConsumerState>,
}

////////////////////////////////////////////////////////////////////////////////
// Переходы состояния
////////////////////////////////////////////////////////////////////////////////

impl Terminal {
    fn kind(&self) -> TerminalKind {
        match self {
            Self::Errored(_) => TerminalKind::Errored,
            Self::Completed => TerminalKind::Completed,
        }
    }
}

impl ConsumerState {
    fn accept_handshake(
        &mut self,
        handle: &Arc<ProducerHandle>,
    ) -> Handshake {
        if let Some(terminal) = &self.terminal {
            return Handshake::Rejected(ProtocolViolation::AlreadyTerminated(terminal.kind()));
        }
        if self.handle.is_some() {
            return Handshake::Rejected(ProtocolViolation::AlreadySubscribed);
        }
        self.handle = Some(handle.clone());
        Handshake::Accepted
    }

    fn active_handle(&self) -> Result<&Arc<ProducerHandle>, ProtocolViolation> {
        if let Some(terminal) = &self.terminal {
            return Err(ProtocolViolation::AlreadyTerminated(terminal.kind()));
        }
        self.handle.as_ref().ok_or(ProtocolViolation::NotSubscribed)
    }

    fn terminate(
        &mut self,
        terminal: Terminal,
    ) -> Result<Arc<ProducerHandle>, ProtocolViolation> {
        self.active_handle()?;
        self.terminal = Some(terminal);
        self.handle.take().ok_or(ProtocolViolation::NotSubscribed)
    }

    /// Вариант `terminate` для эскалации: handshake не обязателен.
    fn terminate_escalated(
        &mut self,
        err: StackError,
    ) -> Option<Option<Arc<ProducerHandle>>> {
        if self.terminal.is_some() {
            return None;
        }
        self.terminal = Some(Terminal::Errored(err));
        Some(self.handle.take())
    }

    fn snapshot(&self) -> EndpointState {
        match (&self.terminal, &self.handle) {
            (Some(terminal), _) => EndpointState::Terminated(terminal.kind()),
            (None, Some(_)) => EndpointState::Active,
            (None, None) => EndpointState::Unsubscribed,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<T> ConsumerEndpoint<T> {
    pub fn new(
        callbacks: impl ConsumerCallbacks<T> + 'static,
        strictness: Strictness,
    ) -> Self {
        Self::from_boxed(Box::new(callbacks), strictness)
    }

    pub(crate) fn from_boxed(
        callbacks: Box<dyn ConsumerCallbacks<T>>,
        strictness: Strictness,
    ) -> Self {
        Self {
            callbacks,
            strictness,
            state: Mutex::new(ConsumerState::default()),
        }
    }

    /// Handshake: сохраняет handle и вызывает пользовательский колбэк.
    ///
    /// Если handle уже есть (или endpoint завершён): при `Strict` -
    /// нарушение протокола, при `Cooperative` - `cancel()` на предложенном
    /// handle и `Ok(())`, текущий handle не трогается.
    pub fn on_handshake(
        &self,
        handle: Arc<ProducerHandle>,
    ) -> ZflowResult<()> {
        let outcome = self.state.lock().accept_handshake(&handle);

        match outcome {
            Handshake::Accepted => {
                tracing::trace!(handle = handle.id(), "handshake accepted");
                self.callbacks.on_handshake(&handle)
            }
            Handshake::Rejected(violation) => match self.strictness {
                Strictness::Strict => {
                    rejected(violation, Some(handle.id()), "handshake rejected")
                }
                Strictness::Cooperative => {
                    tracing::warn!(
                        handle = handle.id(),
                        %violation,
                        "duplicate handshake, cancelling offered handle"
                    );
                    match handle.cancel() {
                        Err(e) if e.protocol_violation()
                            == Some(&ProtocolViolation::AlreadyCancelled) =>
                        {
                            Ok(())
                        }
                        other => other,
                    }
                }
            },
        }
    }

    /// Передаёт элемент в колбэк данных вместе с текущим handle'ом.
    /// Допустимо только в `Active`.
    pub fn on_data(
        &self,
        item: T,
    ) -> ZflowResult<()> {
        let handle = self.state.lock().active_handle().cloned();
        match handle {
            Ok(handle) => self.callbacks.on_data(&handle, item),
            Err(violation) => rejected(violation, None, "data signal rejected"),
        }
    }

    /// Терминальная ошибка: фиксирует её, освобождает handle и вызывает
    /// колбэк ошибки.
    pub fn on_error(
        &self,
        err: impl Into<StackError>,
    ) -> ZflowResult<()> {
        let err = err.into();
        let released = self
            .state
            .lock()
            .terminate(Terminal::Errored(err.clone()));

        match released {
            Ok(handle) => {
                tracing::trace!(handle = handle.id(), error = %err, "terminated with error");
                drop(handle);
                self.callbacks.on_error(err)
            }
            Err(violation) => {
                tracing::trace!(error = %err, "discarding error after rejection");
                rejected(violation, None, "error signal rejected")
            }
        }
    }

    /// Успешное завершение. Симметрично [`on_error`](Self::on_error).
    pub fn on_completion(&self) -> ZflowResult<()> {
        let released = self.state.lock().terminate(Terminal::Completed);

        match released {
            Ok(handle) => {
                tracing::trace!(handle = handle.id(), "completed");
                drop(handle);
                self.callbacks.on_completion()
            }
            Err(violation) => rejected(violation, None, "completion signal rejected"),
        }
    }

    /// Выполняет `f` с текущим handle'ом.
    ///
    /// Блокировка на время `f` не удерживается.
    pub fn with_handle<R>(
        &self,
        f: impl FnOnce(&Arc<ProducerHandle>) -> R,
    ) -> ZflowResult<R> {
        let handle = self.state.lock().active_handle().cloned()?;
        Ok(f(&handle))
    }

    pub fn state(&self) -> EndpointState {
        self.state.lock().snapshot()
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state(), EndpointState::Terminated(_))
    }

    /// Ошибка, которой завершился endpoint, если завершился ошибкой.
    pub fn terminal_error(&self) -> Option<StackError> {
        match &self.state.lock().terminal {
            Some(Terminal::Errored(err)) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }
}

impl<T: 'static> ConsumerEndpoint<T> {
    /// Канал эскалации, ведущий в этот endpoint.
    pub fn escalation_channel(self: &Arc<Self>) -> ErrorEscalationChannel {
        ErrorEscalationChannel::new(self)
    }
}

impl<T> ErrorSink for ConsumerEndpoint<T> {
    fn accept_escalated(
        &self,
        err: StackError,
    ) -> ZflowResult<EscalationOutcome> {
        let released = self.state.lock().terminate_escalated(err.clone());

        match released {
            Some(handle) => {
                tracing::debug!(
                    handle = handle.as_ref().map(|h| h.id()),
                    error = %err,
                    "escalated error delivered"
                );
                drop(handle);
                self.callbacks.on_error(err)?;
                Ok(EscalationOutcome::Delivered)
            }
            None => {
                tracing::debug!(error = %err, "escalation dropped: endpoint already terminated");
                Ok(EscalationOutcome::Dropped)
            }
        }
    }
}

impl<T> std::fmt::Debug for ConsumerEndpoint<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConsumerEndpoint")
            .field("strictness", &self.strictness)
            .field("state", &self.state())
            .finish()
    }
}
