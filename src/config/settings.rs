use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::flow::{DemandViolation, FlowPolicy, Strictness};

/// Настройки протокола, загружаемые из окружения.
///
/// | переменная               | значения                   | по умолчанию  |
/// |--------------------------|----------------------------|---------------|
/// | `ZFLOW_STRICTNESS`       | `strict` / `cooperative`   | `cooperative` |
/// | `ZFLOW_DEMAND_VIOLATION` | `raise` / `escalate`       | `raise`       |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSettings {
    pub strictness: Strictness,
    pub demand_violation: DemandViolation,
}

impl FlowSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Self::defaults()?
            // Добавляем переменные окружения с префиксом ZFLOW_
            .add_source(Environment::with_prefix("ZFLOW"))
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        cfg.try_deserialize()
    }

    /// Загружает настройки из готового `Config` поверх значений по умолчанию.
    pub fn from_config(source: Config) -> Result<Self, ConfigError> {
        Self::defaults()?.add_source(source).build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("strictness", "cooperative")?
            .set_default("demand_violation", "raise")
    }

    pub fn policy(&self) -> FlowPolicy {
        FlowPolicy::from(self)
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        let policy = FlowPolicy::default();
        Self {
            strictness: policy.strictness,
            demand_violation: policy.demand_violation,
        }
    }
}

impl From<&FlowSettings> for FlowPolicy {
    fn from(settings: &FlowSettings) -> Self {
        FlowPolicy::default()
            .with_strictness(settings.strictness)
            .with_demand_violation(settings.demand_violation)
    }
}
