//! Fault profile definitions.
//!
//! A [`FaultProfile`] holds one weighted [`ScenarioSet`] per [`OperationKind`]. Drawing from it
//! picks a scenario by weight and a delay from the scenario's range, producing a
//! [`ScenarioOutcome`] for the [`WorkloadSimulator`](crate::simulator::WorkloadSimulator) to
//! act out.

use super::entropy::Entropy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// The operations that consult the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    CatalogList,
    CatalogRead,
    OrderPayment,
    ChaosProbe,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::CatalogList,
        OperationKind::CatalogRead,
        OperationKind::OrderPayment,
        OperationKind::ChaosProbe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CatalogList => "catalog-list",
            OperationKind::CatalogRead => "catalog-read",
            OperationKind::OrderPayment => "order-payment",
            OperationKind::ChaosProbe => "chaos-probe",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open delay range `[min_ms, max_ms)`; `min_ms == max_ms` is a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn between(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::between(ms, ms)
    }

    pub fn is_valid(&self) -> bool {
        self.min_ms <= self.max_ms
    }

    /// Maps a uniform sample in `[0, 1)` onto the range.
    pub fn sample(&self, unit: f64) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let span = self.max_ms - self.min_ms;
        let offset = ((unit.clamp(0.0, 1.0) * span as f64) as u64).min(span - 1);
        Duration::from_millis(self.min_ms + offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    Payment,
    Internal,
    Timeout,
    Resource,
}

impl Display for FaultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FaultCategory::Payment => "payment",
            FaultCategory::Internal => "internal",
            FaultCategory::Timeout => "timeout",
            FaultCategory::Resource => "resource",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    #[default]
    Error,
    Critical,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        })
    }
}

/// What happens once the delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    #[default]
    Succeed,
    Fail {
        category: FaultCategory,
        #[serde(default)]
        severity: Severity,
    },
    /// Hold a scratch allocation of `bytes` for the duration of the delay.
    Spike { bytes: usize },
}

/// One named, weighted possibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayRange>,
    #[serde(default)]
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_weight() -> f64 {
    1.0
}

impl Scenario {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            delay: None,
            effect: Effect::Succeed,
            message: None,
        }
    }

    pub fn with_delay(mut self, delay: DelayRange) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("scenario set is empty")]
    Empty,
    #[error("scenario name must not be empty")]
    EmptyName,
    #[error("duplicate scenario name {0:?}")]
    DuplicateName(String),
    #[error("scenario {scenario:?} has invalid weight {weight}")]
    InvalidWeight { scenario: String, weight: f64 },
    #[error("total weight must be positive")]
    ZeroTotalWeight,
    #[error("scenario {scenario:?} has delay range {min_ms}..{max_ms} with min > max")]
    InvalidDelay {
        scenario: String,
        min_ms: u64,
        max_ms: u64,
    },
}

/// A validated, non-empty list of scenarios with positive total weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Scenario>", into = "Vec<Scenario>")]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
    total_weight: f64,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, ProfileError> {
        match Self::check(&scenarios).into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(Self::trusted(scenarios)),
        }
    }

    /// Every problem with `scenarios`, in list order. Empty means valid.
    pub fn check(scenarios: &[Scenario]) -> Vec<ProfileError> {
        if scenarios.is_empty() {
            return vec![ProfileError::Empty];
        }

        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for scenario in scenarios {
            if scenario.name.trim().is_empty() {
                problems.push(ProfileError::EmptyName);
            } else if !seen.insert(scenario.name.as_str()) {
                problems.push(ProfileError::DuplicateName(scenario.name.clone()));
            }
            if !scenario.weight.is_finite() || scenario.weight < 0.0 {
                problems.push(ProfileError::InvalidWeight {
                    scenario: scenario.name.clone(),
                    weight: scenario.weight,
                });
            }
            if let Some(delay) = scenario.delay {
                if !delay.is_valid() {
                    problems.push(ProfileError::InvalidDelay {
                        scenario: scenario.name.clone(),
                        min_ms: delay.min_ms,
                        max_ms: delay.max_ms,
                    });
                }
            }
        }

        let total: f64 = scenarios
            .iter()
            .filter(|s| s.weight.is_finite() && s.weight > 0.0)
            .map(|s| s.weight)
            .sum();
        if total <= 0.0 {
            problems.push(ProfileError::ZeroTotalWeight);
        }
        problems
    }

    fn trusted(scenarios: Vec<Scenario>) -> Self {
        let total_weight = scenarios.iter().map(|s| s.weight).sum();
        Self {
            scenarios,
            total_weight,
        }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Weighted pick for a uniform sample in `[0, 1)`. Zero-weight scenarios are never picked.
    pub fn pick(&self, unit: f64) -> &Scenario {
        let target = unit.clamp(0.0, 1.0) * self.total_weight;
        let mut cumulative = 0.0;
        let mut last_weighted = &self.scenarios[0];
        for scenario in &self.scenarios {
            if scenario.weight <= 0.0 {
                continue;
            }
            cumulative += scenario.weight;
            last_weighted = scenario;
            if target < cumulative {
                return scenario;
            }
        }
        // rounding can leave target == total
        last_weighted
    }

    /// A sample that makes [`pick`](Self::pick) return the scenario called `name`.
    pub fn selector_for(&self, name: &str) -> Option<f64> {
        let mut before = 0.0;
        for scenario in &self.scenarios {
            if scenario.name == name {
                if scenario.weight <= 0.0 {
                    return None;
                }
                return Some((before + scenario.weight / 2.0) / self.total_weight);
            }
            before += scenario.weight.max(0.0);
        }
        None
    }
}

impl TryFrom<Vec<Scenario>> for ScenarioSet {
    type Error = ProfileError;

    fn try_from(scenarios: Vec<Scenario>) -> Result<Self, Self::Error> {
        Self::new(scenarios)
    }
}

impl From<ScenarioSet> for Vec<Scenario> {
    fn from(set: ScenarioSet) -> Self {
        set.scenarios
    }
}

/// Result of one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub operation: OperationKind,
    pub scenario: String,
    pub effect: Effect,
    pub delay: Duration,
    pub message: Option<String>,
}

/// Coarse classification of an outcome, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    Delay,
    Failure,
    Spike,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Delay => "delay",
            OutcomeKind::Failure => "failure",
            OutcomeKind::Spike => "spike",
        }
    }
}

impl ScenarioOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self.effect {
            Effect::Fail { .. } => OutcomeKind::Failure,
            Effect::Spike { .. } => OutcomeKind::Spike,
            Effect::Succeed if self.delay.is_zero() => OutcomeKind::Success,
            Effect::Succeed => OutcomeKind::Delay,
        }
    }
}

/// Weighted scenarios for every operation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultProfile {
    pub catalog_list: ScenarioSet,
    pub catalog_read: ScenarioSet,
    pub order_payment: ScenarioSet,
    pub chaos_probe: ScenarioSet,
}

impl FaultProfile {
    pub fn scenarios(&self, kind: OperationKind) -> &ScenarioSet {
        match kind {
            OperationKind::CatalogList => &self.catalog_list,
            OperationKind::CatalogRead => &self.catalog_read,
            OperationKind::OrderPayment => &self.order_payment,
            OperationKind::ChaosProbe => &self.chaos_probe,
        }
    }

    pub fn with_scenarios(mut self, kind: OperationKind, set: ScenarioSet) -> Self {
        let slot = match kind {
            OperationKind::CatalogList => &mut self.catalog_list,
            OperationKind::CatalogRead => &mut self.catalog_read,
            OperationKind::OrderPayment => &mut self.order_payment,
            OperationKind::ChaosProbe => &mut self.chaos_probe,
        };
        *slot = set;
        self
    }

    /// A profile with no delays and no faults, for tests and dry runs.
    pub fn quiet() -> Self {
        let ok = || ScenarioSet::trusted(vec![Scenario::new("success", 1.0)]);
        Self {
            catalog_list: ok(),
            catalog_read: ok(),
            order_payment: ok(),
            chaos_probe: ok(),
        }
    }

    /// Picks a scenario for `kind` (one sample) and, if it has a delay range, a delay (one
    /// more sample).
    pub fn draw(&self, kind: OperationKind, entropy: &mut dyn Entropy) -> ScenarioOutcome {
        let scenario = self.scenarios(kind).pick(entropy.next_unit());
        let delay = scenario
            .delay
            .map(|range| range.sample(entropy.next_unit()))
            .unwrap_or(Duration::ZERO);

        ScenarioOutcome {
            operation: kind,
            scenario: scenario.name.clone(),
            effect: scenario.effect,
            delay,
            message: scenario.message.clone(),
        }
    }
}

impl Default for FaultProfile {
    /// Latencies and fault rates of the original demo service.
    fn default() -> Self {
        let failure = Effect::Fail {
            category: FaultCategory::Payment,
            severity: Severity::Error,
        };
        Self {
            catalog_list: ScenarioSet::trusted(vec![
                Scenario::new("success", 1.0).with_delay(DelayRange::between(10, 100))
            ]),
            catalog_read: ScenarioSet::trusted(vec![
                Scenario::new("success", 1.0).with_delay(DelayRange::between(10, 50))
            ]),
            order_payment: ScenarioSet::trusted(vec![
                Scenario::new("success", 0.95).with_delay(DelayRange::between(100, 300)),
                Scenario::new("failure", 0.05)
                    .with_delay(DelayRange::between(100, 300))
                    .with_effect(failure)
                    .with_message("Payment processing failed"),
            ]),
            chaos_probe: ScenarioSet::trusted(vec![
                Scenario::new("slow", 1.0)
                    .with_delay(DelayRange::between(2_000, 5_000))
                    .with_message("This was a slow response"),
                Scenario::new("error", 1.0)
                    .with_effect(Effect::Fail {
                        category: FaultCategory::Internal,
                        severity: Severity::Error,
                    })
                    .with_message("Simulated server error"),
                Scenario::new("memory", 1.0)
                    .with_delay(DelayRange::fixed(100))
                    .with_effect(Effect::Spike { bytes: 1_000_000 })
                    .with_message("Memory spike simulated"),
                Scenario::new("success", 1.0).with_message("All good!"),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::ScriptedEntropy;
    use proptest::prelude::*;

    #[test]
    fn default_profile_is_valid() {
        let profile = FaultProfile::default();
        for kind in OperationKind::ALL {
            let set = profile.scenarios(kind).scenarios().to_vec();
            assert!(ScenarioSet::check(&set).is_empty(), "{kind} invalid");
        }
    }

    #[test]
    fn check_reports_every_problem() {
        let problems = ScenarioSet::check(&[
            Scenario::new("a", -1.0),
            Scenario::new("a", 0.0).with_delay(DelayRange::between(5, 1)),
            Scenario::new("", f64::INFINITY),
        ]);
        assert_eq!(
            problems,
            vec![
                ProfileError::InvalidWeight {
                    scenario: "a".into(),
                    weight: -1.0
                },
                ProfileError::DuplicateName("a".into()),
                ProfileError::InvalidDelay {
                    scenario: "a".into(),
                    min_ms: 5,
                    max_ms: 1
                },
                ProfileError::EmptyName,
                ProfileError::InvalidWeight {
                    scenario: "".into(),
                    weight: f64::INFINITY
                },
                ProfileError::ZeroTotalWeight,
            ]
        );
    }

    #[test]
    fn empty_set_is_rejected() {
        assert_eq!(ScenarioSet::new(vec![]), Err(ProfileError::Empty));
    }

    #[test]
    fn deserializing_validates() {
        let ok: Result<ScenarioSet, _> = serde_json::from_str(
            r#"[{"name":"slow","delay":{"min_ms":10,"max_ms":20}},
                {"name":"boom","weight":0.5,"effect":{"type":"fail","category":"internal"}}]"#,
        );
        let set = ok.unwrap();
        assert_eq!(set.scenarios().len(), 2);
        assert_eq!(
            set.get("boom").unwrap().effect,
            Effect::Fail {
                category: FaultCategory::Internal,
                severity: Severity::Error
            }
        );

        let bad: Result<ScenarioSet, _> =
            serde_json::from_str(r#"[{"name":"never","weight":0.0}]"#);
        assert!(bad.unwrap_err().to_string().contains("total weight"));
    }

    #[test]
    fn delay_sampling_stays_in_range() {
        let range = DelayRange::between(10, 100);
        assert_eq!(range.sample(0.0), Duration::from_millis(10));
        assert_eq!(range.sample(0.999_999), Duration::from_millis(99));
        assert_eq!(DelayRange::fixed(100).sample(0.7), Duration::from_millis(100));
    }

    #[test]
    fn draw_uses_one_sample_per_decision() {
        let profile = FaultProfile::default();
        let set = profile.scenarios(OperationKind::OrderPayment);
        let failure = set.selector_for("failure").unwrap();
        let mut entropy = ScriptedEntropy::new([failure, 0.5]);

        let outcome = profile.draw(OperationKind::OrderPayment, &mut entropy);

        assert_eq!(outcome.scenario, "failure");
        assert_eq!(outcome.delay, Duration::from_millis(200));
        assert_eq!(outcome.kind(), OutcomeKind::Failure);
        assert_eq!(outcome.message.as_deref(), Some("Payment processing failed"));
        assert_eq!(entropy.remaining(), 0);
    }

    #[test]
    fn chaos_success_has_no_delay_sample() {
        let profile = FaultProfile::default();
        let set = profile.scenarios(OperationKind::ChaosProbe);
        let mut entropy = ScriptedEntropy::new([set.selector_for("success").unwrap(), 0.9]);

        let outcome = profile.draw(OperationKind::ChaosProbe, &mut entropy);

        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert_eq!(outcome.delay, Duration::ZERO);
        assert_eq!(entropy.remaining(), 1);
    }

    #[test]
    fn selector_for_every_chaos_scenario() {
        let profile = FaultProfile::default();
        let set = profile.scenarios(OperationKind::ChaosProbe);
        for name in ["slow", "error", "memory", "success"] {
            let unit = set.selector_for(name).unwrap();
            assert_eq!(set.pick(unit).name, name);
        }
        assert_eq!(set.selector_for("missing"), None);
    }

    fn arb_scenarios() -> impl Strategy<Value = Vec<Scenario>> {
        prop::collection::vec((0u8..4, 0u64..500, 0u64..500), 1..8).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (weight, a, b))| {
                    Scenario::new(format!("s{i}"), f64::from(weight))
                        .with_delay(DelayRange::between(a.min(b), a.max(b)))
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Zero-weight scenarios are never drawn and delays stay inside their range.
        #[test]
        fn draw_respects_weights_and_ranges(
            scenarios in arb_scenarios(),
            pick in 0.0f64..1.0,
            delay in 0.0f64..1.0,
        ) {
            prop_assume!(scenarios.iter().any(|s| s.weight > 0.0));
            let set = ScenarioSet::new(scenarios).unwrap();
            let profile = FaultProfile::quiet().with_scenarios(OperationKind::CatalogRead, set.clone());

            let outcome = profile.draw(
                OperationKind::CatalogRead,
                &mut ScriptedEntropy::new([pick, delay]),
            );

            let chosen = set.get(&outcome.scenario).unwrap();
            prop_assert!(chosen.weight > 0.0);
            let range = chosen.delay.unwrap();
            let ms = outcome.delay.as_millis() as u64;
            prop_assert!(ms >= range.min_ms);
            prop_assert!(ms < range.max_ms || (range.min_ms == range.max_ms && ms == range.min_ms));
        }

        #[test]
        fn selector_round_trips(scenarios in arb_scenarios()) {
            prop_assume!(scenarios.iter().any(|s| s.weight > 0.0));
            let set = ScenarioSet::new(scenarios).unwrap();
            for scenario in set.scenarios().iter().filter(|s| s.weight > 0.0) {
                let unit = set.selector_for(&scenario.name).unwrap();
                prop_assert_eq!(&set.pick(unit).name, &scenario.name);
            }
        }
    }
}
