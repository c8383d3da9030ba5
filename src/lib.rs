/// Protocol policy loading from the environment and config sources.
pub mod config;
/// Common error types: protocol violations, construction and logging errors.
pub mod error;
/// Signal protocol: consumer endpoint, producer handle, escalation channel.
pub mod flow;
/// Structured logging (formatting, filters, lifecycle handle).
pub mod logging;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Settings loaded via the `config` crate.
pub use config::FlowSettings;
/// Error model shared with `zflow-error`.
pub use error::{
    ConstructionError, ErrorExt, LoggingError, ProtocolViolation, StackError, StatusCode,
    TerminalKind, ZflowResult,
};
/// Endpoint, handle, builders and factories.
pub use flow::{
    consumer_from, consumer_with_handle_from, handle_from, ConsumerBuilder, ConsumerCallbacks, ConsumerEndpoint,
    DemandViolation, EndpointState, ErrorEscalationChannel, ErrorSink, EscalationOutcome,
    FlowPolicy, HandleBuilder, ProducerCallbacks, ProducerHandle, Strictness,
};
/// Logging bootstrap.
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
