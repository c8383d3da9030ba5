//! Протокол сигналов производитель/потребитель со спросом.
//!
//! - `policy`: строгость и способ доставки нарушений спроса.
//! - `escalation`: узкий обратный канал от handle'а в `on_error` потребителя.
//! - `producer`: [`ProducerHandle`] - спрос и идемпотентная отмена.
//! - `consumer`: [`ConsumerEndpoint`] - handshake, данные, один терминальный
//!   сигнал.
//! - `builder`: сборка из замыканий с проверкой полноты набора колбэков.
//!
//! Порядок сигналов: производитель вызывает `on_handshake(handle)` один раз,
//! потребитель вызывает `handle.request_more(n)` и, возможно,
//! `handle.cancel()`, производитель вызывает `on_data(item)` ноль или более
//! раз и затем не более одного из `on_error` / `on_completion`.

pub mod builder;
pub mod callbacks;
pub mod consumer;
pub mod escalation;
pub mod policy;
pub mod producer;

use std::sync::Arc;

pub use builder::*;
pub use callbacks::*;
pub use consumer::*;
pub use escalation::*;
pub use policy::*;
pub use producer::*;
use zflow_error::{StackError, ZflowResult};

/// Создаёт endpoint с политикой по умолчанию из четырёх замыканий.
///
/// Все колбэки передаются явно, поэтому собрать неполный набор здесь
/// невозможно; для пошаговой сборки есть [`ConsumerBuilder`].
pub fn consumer_from<T, H, D, E, C>(
    on_handshake: H,
    on_data: D,
    on_error: E,
    on_completion: C,
) -> Arc<ConsumerEndpoint<T>>
where
    T: 'static,
    H: Fn(&Arc<ProducerHandle>) -> ZflowResult<()> + Send + Sync + 'static,
    D: Fn(T) -> ZflowResult<()> + Send + Sync + 'static,
    E: Fn(StackError) -> ZflowResult<()> + Send + Sync + 'static,
    C: Fn() -> ZflowResult<()> + Send + Sync + 'static,
{
    consumer_with_handle_from(
        on_handshake,
        move |_: &Arc<ProducerHandle>, item: T| on_data(item),
        on_error,
        on_completion,
    )
}

/// Как [`consumer_from`], но колбэк данных получает и текущий handle.
///
/// Это обычный способ тянуть элементы по одному: запросить следующий прямо
/// из обработки текущего.
pub fn consumer_with_handle_from<T, H, D, E, C>(
    on_handshake: H,
    on_data: D,
    on_error: E,
    on_completion: C,
) -> Arc<ConsumerEndpoint<T>>
where
    T: 'static,
    H: Fn(&Arc<ProducerHandle>) -> ZflowResult<()> + Send + Sync + 'static,
    D: Fn(&Arc<ProducerHandle>, T) -> ZflowResult<()> + Send + Sync + 'static,
    E: Fn(StackError) -> ZflowResult<()> + Send + Sync + 'static,
    C: Fn() -> ZflowResult<()> + Send + Sync + 'static,
{
    let callbacks = FnConsumer {
        on_handshake: Box::new(on_handshake),
        on_data: Box::new(on_data),
        on_error: Box::new(on_error),
        on_completion: Box::new(on_completion),
    };
    Arc::new(ConsumerEndpoint::new(callbacks, Strictness::default()))
}

/// Создаёт handle с политикой по умолчанию из двух замыканий.
pub fn handle_from<D, C>(
    on_demand: D,
    on_cancellation: C,
) -> Arc<ProducerHandle>
where
    D: Fn(u64) -> ZflowResult<()> + Send + Sync + 'static,
    C: Fn() -> ZflowResult<()> + Send + Sync + 'static,
{
    let callbacks = FnProducer {
        on_demand: Box::new(on_demand),
        on_cancellation: Box::new(on_cancellation),
    };
    Arc::new(ProducerHandle::new(callbacks, Strictness::default()))
}
