use super::shop::Shop;
use crate::catalog::{self, CatalogError};
use crate::clients::CatalogClient;
use crate::config::ShopConfig;
use crate::fault::{FaultProfile, ProfileError, SharedEntropy};
use crate::model::{ProductCreate, ProductId};
use crate::simulator::{SharedSleeper, TokioSleeper, WorkloadSimulator, DEFAULT_MAX_SPIKE_BYTES};
use crate::telemetry::{MetricsReporter, SharedReporter};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// How long [`ShopSystem::shutdown`] waits for the catalog actor to drain.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid fault profile: {0}")]
    Profile(#[from] ProfileError),

    #[error("failed to seed catalog: {0}")]
    Seed(#[from] CatalogError),

    #[error("actor task failed: {0}")]
    ActorFailed(String),

    #[error("catalog actor still running after {0:?}; a Shop clone is still alive")]
    ShutdownTimeout(Duration),
}

/// Collects the shop's collaborators before anything is spawned.
///
/// Unset collaborators default to production ones: real sleeps, OS entropy, and the
/// `metrics`/`tracing` reporter.
#[derive(Debug)]
pub struct ShopSystemBuilder {
    products: Vec<ProductCreate>,
    profile: FaultProfile,
    seed: Option<u64>,
    entropy: Option<SharedEntropy>,
    sleeper: Option<SharedSleeper>,
    reporter: Option<SharedReporter>,
    actor_buffer: usize,
    max_spike_bytes: usize,
    shutdown_timeout: Duration,
}

impl Default for ShopSystemBuilder {
    fn default() -> Self {
        Self {
            products: catalog::default_products(),
            profile: FaultProfile::default(),
            seed: None,
            entropy: None,
            sleeper: None,
            reporter: None,
            actor_buffer: 32,
            max_spike_bytes: DEFAULT_MAX_SPIKE_BYTES,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ShopSystemBuilder {
    /// Takes products, scenarios, seed and limits from a validated config.
    pub fn from_config(config: &ShopConfig) -> Result<Self, LifecycleError> {
        Ok(Self {
            products: config.catalog.products.clone(),
            profile: config.fault_profile()?,
            seed: config.seed,
            actor_buffer: config.catalog.actor_buffer,
            max_spike_bytes: config.simulator.max_spike_bytes,
            ..Self::default()
        })
    }

    pub fn products(mut self, products: Vec<ProductCreate>) -> Self {
        self.products = products;
        self
    }

    pub fn profile(mut self, profile: FaultProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the seed as well.
    pub fn entropy(mut self, entropy: SharedEntropy) -> Self {
        self.entropy = Some(entropy);
        self
    }

    pub fn sleeper(mut self, sleeper: SharedSleeper) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn actor_buffer(mut self, actor_buffer: usize) -> Self {
        self.actor_buffer = actor_buffer.max(1);
        self
    }

    pub fn max_spike_bytes(mut self, max_spike_bytes: usize) -> Self {
        self.max_spike_bytes = max_spike_bytes;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Spawns the catalog actor and seeds it. Must run inside a Tokio runtime.
    pub async fn start(self) -> Result<ShopSystem, LifecycleError> {
        let (actor, client) = catalog::new(self.actor_buffer.max(1));
        let handle = tokio::spawn(actor.run(()));
        let catalog = CatalogClient::new(client);

        let product_ids = match catalog.seed(self.products).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Seeding failed");
                drop(catalog);
                let _ = handle.await;
                return Err(e.into());
            }
        };

        let entropy = self
            .entropy
            .unwrap_or_else(|| SharedEntropy::from_seed(self.seed));
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(MetricsReporter::new()));
        let simulator = WorkloadSimulator::new(self.profile, entropy, sleeper, reporter)
            .with_max_spike_bytes(self.max_spike_bytes);

        info!(
            products = product_ids.len(),
            seeded = self.seed.is_some(),
            "Shop started"
        );

        Ok(ShopSystem {
            shop: Shop::new(catalog, simulator),
            product_ids,
            handles: vec![handle],
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}

/// A running shop: the catalog actor task plus the [`Shop`] that talks to it.
#[derive(Debug)]
pub struct ShopSystem {
    shop: Shop,
    product_ids: Vec<ProductId>,
    handles: Vec<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl ShopSystem {
    pub fn builder() -> ShopSystemBuilder {
        ShopSystemBuilder::default()
    }

    /// A handle on the boundary operations. Drop it before [`shutdown`](Self::shutdown).
    pub fn shop(&self) -> Shop {
        self.shop.clone()
    }

    /// Ids assigned while seeding, in seeding order.
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    /// Drops the system's clients and waits for the catalog actor to finish.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down shop...");
        drop(self.shop);

        for handle in self.handles {
            match tokio::time::timeout(self.shutdown_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = ?e, "Actor task failed");
                    return Err(LifecycleError::ActorFailed(e.to_string()));
                }
                Err(_) => {
                    error!(timeout = ?self.shutdown_timeout, "Actor did not stop");
                    return Err(LifecycleError::ShutdownTimeout(self.shutdown_timeout));
                }
            }
        }

        info!("Shop shutdown complete.");
        Ok(())
    }
}
