use serde::{Deserialize, Serialize};

/// Как endpoint и handle реагируют на повторные сигналы.
///
/// | операция                     | `Strict`                 | `Cooperative`                      |
/// |------------------------------|--------------------------|------------------------------------|
/// | повторный `on_handshake`     | `AlreadySubscribed`      | `cancel()` на новом handle, `Ok`   |
/// | повторный `cancel()`         | `AlreadyCancelled`       | no-op, `Ok`                        |
///
/// Остальные операции от строгости не зависят.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Strict,
    #[default]
    Cooperative,
}

/// Куда уходит нарушение, обнаруженное в `request_more`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandViolation {
    /// Вернуть ошибку тому, кто вызвал `request_more`.
    #[default]
    Raise,
    /// Передать ошибку в `on_error` потребителя через
    /// [`ErrorEscalationChannel`](super::ErrorEscalationChannel), вызывающему
    /// вернуть `Ok`.
    Escalate,
}

/// Полный набор настроек поведения для пары endpoint/handle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowPolicy {
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub demand_violation: DemandViolation,
}

impl FlowPolicy {
    pub const fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            demand_violation: DemandViolation::Raise,
        }
    }

    pub const fn cooperative() -> Self {
        Self {
            strictness: Strictness::Cooperative,
            demand_violation: DemandViolation::Raise,
        }
    }

    pub fn with_strictness(
        mut self,
        strictness: Strictness,
    ) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_demand_violation(
        mut self,
        demand_violation: DemandViolation,
    ) -> Self {
        self.demand_violation = demand_violation;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет значения по умолчанию: кооперативная строгость и
    /// синхронный возврат нарушений спроса.
    #[test]
    fn test_defaults() {
        let policy = FlowPolicy::default();
        assert_eq!(policy.strictness, Strictness::Cooperative);
        assert_eq!(policy.demand_violation, DemandViolation::Raise);
        assert!(!policy.is_strict());
        assert_eq!(policy, FlowPolicy::cooperative());
    }

    #[test]
    fn test_builders() {
        let policy = FlowPolicy::strict().with_demand_violation(DemandViolation::Escalate);
        assert!(policy.is_strict());
        assert_eq!(policy.demand_violation, DemandViolation::Escalate);

        let policy = policy.with_strictness(Strictness::Cooperative);
        assert!(!policy.is_strict());
    }
}
