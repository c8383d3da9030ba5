use std::{
    cell::Cell,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use parking_lot::ReentrantMutex;
use zflow_error::{ProtocolViolation, StackError, ZflowResult};

use super::{ErrorEscalationChannel, ProducerCallbacks, Strictness};
use crate::error::{log_rejected, rejected};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Active,
    Cancelled,
}

/// Handle производителя: принимает спрос и отмену от потребителя.
///
/// Машина состояний `Active -> Cancelled`. Флаг отмены и вызовы колбэков
/// `on_demand` / `on_cancellation` выполняются под одной реентерабельной
/// блокировкой:
/// - `on_cancellation` вызывается ровно один раз при любом числе
///   конкурентных `cancel()`;
/// - спрос, принятый до отмены, обрабатывается до начала `on_cancellation`,
///   а после установки флага ни один `request_more` не доходит до
///   `on_demand`.
///
/// Реентерабельность позволяет синхронному производителю вызывать тот же
/// handle из собственных колбэков в том же потоке.
pub struct ProducerHandle {
    id: u64,
    callbacks: Box<dyn ProducerCallbacks>,
    strictness: Strictness,
    escalation: Option<ErrorEscalationChannel>,
    state: ReentrantMutex<Cell<HandleState>>,
    /// Копия флага отмены для запросов без блокировки; пишется под `state`.
    cancelled: AtomicBool,
}

impl ProducerHandle {
    /// Handle, возвращающий нарушения спроса вызывающему.
    pub fn new(
        callbacks: impl ProducerCallbacks + 'static,
        strictness: Strictness,
    ) -> Self {
        Self::from_parts(Box::new(callbacks), strictness, None)
    }

    /// Handle, отправляющий нарушения спроса в `on_error` потребителя.
    pub fn with_escalation(
        callbacks: impl ProducerCallbacks + 'static,
        strictness: Strictness,
        escalation: ErrorEscalationChannel,
    ) -> Self {
        Self::from_parts(Box::new(callbacks), strictness, Some(escalation))
    }

    pub(crate) fn from_parts(
        callbacks: Box<dyn ProducerCallbacks>,
        strictness: Strictness,
        escalation: Option<ErrorEscalationChannel>,
    ) -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            callbacks,
            strictness,
            escalation,
            state: ReentrantMutex::new(Cell::new(HandleState::Active)),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Запрашивает ещё `n` элементов.
    ///
    /// `n <= 0` и спрос после отмены - нарушения протокола. В режиме без
    /// эскалации они возвращаются как `Err`; в режиме эскалации уходят в
    /// `on_error` потребителя, а здесь возвращается `Ok(())`.
    pub fn request_more(
        &self,
        n: i64,
    ) -> ZflowResult<()> {
        if n <= 0 {
            return self.reject(ProtocolViolation::NonPositiveDemand(n));
        }

        let state = self.state.lock();
        if state.get() == HandleState::Cancelled {
            drop(state);
            return self.reject(ProtocolViolation::DemandAfterCancel);
        }

        tracing::trace!(handle = self.id, n, "demand accepted");
        self.callbacks.on_demand(n as u64)
    }

    /// Просит производителя остановиться и освободить ресурсы.
    ///
    /// Первый вызов переводит handle в `Cancelled` и вызывает
    /// `on_cancellation`. Повторные вызовы колбэк не трогают: при
    /// `Cooperative` возвращают `Ok(())`, при `Strict` -
    /// [`ProtocolViolation::AlreadyCancelled`].
    pub fn cancel(&self) -> ZflowResult<()> {
        let state = self.state.lock();
        if state.get() == HandleState::Cancelled {
            drop(state);
            return match self.strictness {
                Strictness::Strict => rejected(
                    ProtocolViolation::AlreadyCancelled,
                    Some(self.id),
                    "repeated cancel rejected",
                ),
                Strictness::Cooperative => Ok(()),
            };
        }

        state.set(HandleState::Cancelled);
        self.cancelled.store(true, Ordering::Release);
        tracing::trace!(handle = self.id, "handle cancelled");
        self.callbacks.on_cancellation()
    }

    /// Не блокируется, даже если другой поток сейчас внутри колбэка.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Уникальный в пределах процесса идентификатор (для логов).
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn is_escalating(&self) -> bool {
        self.escalation.is_some()
    }

    fn reject(
        &self,
        violation: ProtocolViolation,
    ) -> ZflowResult<()> {
        match &self.escalation {
            Some(channel) => {
                let err = StackError::new(violation);
                log_rejected(&err, Some(self.id), "demand violation escalated");
                channel.escalate(err)?;
                Ok(())
            }
            None => rejected(violation, Some(self.id), "demand violation raised"),
        }
    }
}

impl std::fmt::Debug for ProducerHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ProducerHandle")
            .field("id", &self.id)
            .field("strictness", &self.strictness)
            .field("escalating", &self.is_escalating())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
