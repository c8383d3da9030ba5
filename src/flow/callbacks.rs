use std::sync::Arc;

use zflow_error::{StackError, ZflowResult};

use super::ProducerHandle;

/// Пользовательская логика стороны потребителя: по одному методу на сигнал.
///
/// Ошибки, возвращённые методами, не перехватываются: они выходят из
/// соответствующей операции [`ConsumerEndpoint`](super::ConsumerEndpoint)
/// как есть. Переход состояния к этому моменту уже выполнен.
pub trait ConsumerCallbacks<T>: Send + Sync {
    /// Вызывается один раз, когда handshake принят.
    fn on_handshake(
        &self,
        handle: &Arc<ProducerHandle>,
    ) -> ZflowResult<()>;

    /// Очередной элемент. `handle` - текущий handle подписки, через него
    /// можно запросить следующие элементы прямо из колбэка.
    fn on_data(
        &self,
        handle: &Arc<ProducerHandle>,
        item: T,
    ) -> ZflowResult<()>;

    fn on_error(
        &self,
        err: StackError,
    ) -> ZflowResult<()>;

    fn on_completion(&self) -> ZflowResult<()>;
}

/// Пользовательская логика стороны производителя.
pub trait ProducerCallbacks: Send + Sync {
    /// Потребитель готов принять ещё `n` элементов (`n > 0`).
    fn on_demand(
        &self,
        n: u64,
    ) -> ZflowResult<()>;

    /// Вызывается не более одного раза за жизнь handle'а.
    fn on_cancellation(&self) -> ZflowResult<()>;
}

pub(crate) type HandshakeFn = Box<dyn Fn(&Arc<ProducerHandle>) -> ZflowResult<()> + Send + Sync>;
pub(crate) type DataFn<T> =
    Box<dyn Fn(&Arc<ProducerHandle>, T) -> ZflowResult<()> + Send + Sync>;
pub(crate) type ErrorFn = Box<dyn Fn(StackError) -> ZflowResult<()> + Send + Sync>;
pub(crate) type CompletionFn = Box<dyn Fn() -> ZflowResult<()> + Send + Sync>;
pub(crate) type DemandFn = Box<dyn Fn(u64) -> ZflowResult<()> + Send + Sync>;
pub(crate) type CancellationFn = Box<dyn Fn() -> ZflowResult<()> + Send + Sync>;

/// [`ConsumerCallbacks`] поверх четырёх замыканий.
pub struct FnConsumer<T> {
    pub(crate) on_handshake: HandshakeFn,
    pub(crate) on_data: DataFn<T>,
    pub(crate) on_error: ErrorFn,
    pub(crate) on_completion: CompletionFn,
}

/// [`ProducerCallbacks`] поверх двух замыканий.
pub struct FnProducer {
    pub(crate) on_demand: DemandFn,
    pub(crate) on_cancellation: CancellationFn,
}

impl<T> ConsumerCallbacks<T> for FnConsumer<T> {
    fn on_handshake(
        &self,
        handle: &Arc<ProducerHandle>,
    ) -> ZflowResult<()> {
        (self.on_handshake)(handle)
    }

    fn on_data(
        &self,
        handle: &Arc<ProducerHandle>,
        item: T,
    ) -> ZflowResult<()> {
        (self.on_data)(handle, item)
    }

    fn on_error(
        &self,
        err: StackError,
    ) -> ZflowResult<()> {
        (self.on_error)(err)
    }

    fn on_completion(&self) -> ZflowResult<()> {
        (self.on_completion)()
    }
}

impl ProducerCallbacks for FnProducer {
    fn on_demand(
        &self,
        n: u64,
    ) -> ZflowResult<()> {
        (self.on_demand)(n)
    }

    fn on_cancellation(&self) -> ZflowResult<()> {
        (self.on_cancellation)()
    }
}
