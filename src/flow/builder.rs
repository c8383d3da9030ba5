use std::sync::Arc;

use zflow_error::{ConstructionError, StackError, ZflowResult};

use super::{
    callbacks::{CancellationFn, CompletionFn, DataFn, DemandFn, ErrorFn, HandshakeFn},
    ConsumerEndpoint, DemandViolation, ErrorEscalationChannel, FlowPolicy, FnConsumer, FnProducer,
    ProducerHandle,
};

/// Собирает [`ConsumerEndpoint`] из четырёх замыканий.
///
/// Все четыре колбэка обязательны: [`build`](Self::build) без любого из них
/// возвращает [`ConstructionError::MissingCallback`].
///
/// ```ignore
/// let endpoint = ConsumerBuilder::<u32>::new()
///     .on_handshake(|h| h.request_more(16))
///     .on_data(|item| { println!("{item}"); Ok(()) })
///     .on_error(|err| { eprintln!("{err}"); Ok(()) })
///     .on_completion(|| Ok(()))
///     .build()?;
/// ```
pub struct ConsumerBuilder<T> {
    on_handshake: Option<HandshakeFn>,
    on_data: Option<DataFn<T>>,
    on_error: Option<ErrorFn>,
    on_completion: Option<CompletionFn>,
    policy: FlowPolicy,
}

/// Собирает [`ProducerHandle`] из двух замыканий.
pub struct HandleBuilder {
    on_demand: Option<DemandFn>,
    on_cancellation: Option<CancellationFn>,
    policy: FlowPolicy,
    escalation: Option<ErrorEscalationChannel>,
}

impl<T: 'static> ConsumerBuilder<T> {
    pub fn new() -> Self {
        Self {
            on_handshake: None,
            on_data: None,
            on_error: None,
            on_completion: None,
            policy: FlowPolicy::default(),
        }
    }

    pub fn on_handshake<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn(&Arc<ProducerHandle>) -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_handshake = Some(Box::new(f));
        self
    }

    pub fn on_data<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn(T) -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_data = Some(Box::new(move |_: &Arc<ProducerHandle>, item: T| f(item)));
        self
    }

    /// Колбэк данных, получающий текущий handle: из него можно запросить
    /// следующую порцию, не храня ссылку на endpoint.
    pub fn on_data_with<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn(&Arc<ProducerHandle>, T) -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_data = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn(StackError) -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_completion<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn() -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_completion = Some(Box::new(f));
        self
    }

    /// То же, что [`on_completion`](Self::on_completion), но колбэк
    /// принимает игнорируемое значение-заглушку.
    pub fn on_completion_with<F>(
        self,
        f: F,
    ) -> Self
    where
        F: Fn(()) -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_completion(move || f(()))
    }

    pub fn policy(
        mut self,
        policy: FlowPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<Arc<ConsumerEndpoint<T>>, ConstructionError> {
        let callbacks = FnConsumer {
            on_handshake: self
                .on_handshake
                .ok_or(ConstructionError::MissingCallback("on_handshake"))?,
            on_data: self
                .on_data
                .ok_or(ConstructionError::MissingCallback("on_data"))?,
            on_error: self
                .on_error
                .ok_or(ConstructionError::MissingCallback("on_error"))?,
            on_completion: self
                .on_completion
                .ok_or(ConstructionError::MissingCallback("on_completion"))?,
        };
        Ok(Arc::new(ConsumerEndpoint::from_boxed(
            Box::new(callbacks),
            self.policy.strictness,
        )))
    }
}

impl<T: 'static> Default for ConsumerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleBuilder {
    pub fn new() -> Self {
        Self {
            on_demand: None,
            on_cancellation: None,
            policy: FlowPolicy::default(),
            escalation: None,
        }
    }

    pub fn on_demand<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn(u64) -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_demand = Some(Box::new(f));
        self
    }

    pub fn on_cancellation<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn() -> ZflowResult<()> + Send + Sync + 'static,
    {
        self.on_cancellation = Some(Box::new(f));
        self
    }

    pub fn policy(
        mut self,
        policy: FlowPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    /// Включает эскалацию нарушений спроса в указанный канал.
    pub fn escalate_to(
        mut self,
        channel: ErrorEscalationChannel,
    ) -> Self {
        self.policy.demand_violation = DemandViolation::Escalate;
        self.escalation = Some(channel);
        self
    }

    pub fn build(self) -> Result<Arc<ProducerHandle>, ConstructionError> {
        let callbacks = FnProducer {
            on_demand: self
                .on_demand
                .ok_or(ConstructionError::MissingCallback("on_demand"))?,
            on_cancellation: self
                .on_cancellation
                .ok_or(ConstructionError::MissingCallback("on_cancellation"))?,
        };

        let escalation = match self.policy.demand_violation {
            DemandViolation::Raise => None,
            DemandViolation::Escalate => Some(
                self.escalation
                    .ok_or(ConstructionError::MissingEscalationChannel)?,
            ),
        };

        Ok(Arc::new(ProducerHandle::from_parts(
            Box::new(callbacks),
            self.policy.strictness,
            escalation,
        )))
    }
}

impl Default for HandleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
