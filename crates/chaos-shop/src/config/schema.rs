//! Configuration schema. Every field has a default.

use crate::catalog;
use crate::fault::{DelayRange, FaultProfile, OperationKind, ProfileError, Scenario, ScenarioSet};
use crate::model::ProductCreate;
use crate::simulator::DEFAULT_MAX_SPIKE_BYTES;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShopConfig {
    /// Seeds every entropy source; unset means OS randomness.
    pub seed: Option<u64>,
    pub catalog: CatalogConfig,
    pub simulator: SimulatorConfig,
    pub scenarios: ScenarioConfig,
    pub telemetry: TelemetryConfig,
    pub load: LoadConfig,
}

impl ShopConfig {
    pub fn fault_profile(&self) -> Result<FaultProfile, ProfileError> {
        self.scenarios.fault_profile()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Capacity of the catalog actor's request channel.
    pub actor_buffer: usize,
    /// Seeded in order; the first product gets id 1.
    pub products: Vec<ProductCreate>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            actor_buffer: 32,
            products: catalog::default_products(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    pub max_spike_bytes: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_spike_bytes: DEFAULT_MAX_SPIKE_BYTES,
        }
    }
}

/// Scenario overrides. A missing list keeps the built-in scenarios for that operation.
///
/// Lists are kept raw here so validation can report every problem in every list at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_list: Option<Vec<Scenario>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_read: Option<Vec<Scenario>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_payment: Option<Vec<Scenario>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chaos_probe: Option<Vec<Scenario>>,
}

impl ScenarioConfig {
    pub fn get(&self, kind: OperationKind) -> Option<&[Scenario]> {
        match kind {
            OperationKind::CatalogList => self.catalog_list.as_deref(),
            OperationKind::CatalogRead => self.catalog_read.as_deref(),
            OperationKind::OrderPayment => self.order_payment.as_deref(),
            OperationKind::ChaosProbe => self.chaos_probe.as_deref(),
        }
    }

    /// The default profile with every configured list swapped in.
    pub fn fault_profile(&self) -> Result<FaultProfile, ProfileError> {
        let mut profile = FaultProfile::default();
        for kind in OperationKind::ALL {
            if let Some(scenarios) = self.get(kind) {
                profile = profile.with_scenarios(kind, ScenarioSet::new(scenarios.to_vec())?);
            }
        }
        Ok(profile)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this address when set.
    pub metrics_address: Option<SocketAddr>,
}

/// Shape of the synthetic user journey run by the [`LoadDriver`](crate::load::LoadDriver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    pub virtual_users: usize,
    /// Journeys per virtual user.
    pub iterations: usize,
    pub order_probability: f64,
    pub chaos_probability: f64,
    /// Ordered quantity is drawn from `1..=max_quantity`.
    pub max_quantity: u32,
    /// Pause after browsing the list and after viewing a product.
    pub think_time: DelayRange,
    /// Pause at the end of each journey.
    pub iteration_pause: DelayRange,
    /// The run fails when the error rate reaches this.
    pub max_error_rate: f64,
    /// The run fails when the 95th percentile request latency reaches this.
    pub max_p95_ms: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            virtual_users: 10,
            iterations: 10,
            order_probability: 0.3,
            chaos_probability: 0.05,
            max_quantity: 3,
            think_time: DelayRange::fixed(1_000),
            iteration_pause: DelayRange::fixed(2_000),
            max_error_rate: 0.1,
            max_p95_ms: 500,
        }
    }
}
