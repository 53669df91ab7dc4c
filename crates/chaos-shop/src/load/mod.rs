//! # Load Driver
//!
//! Replays the checkout-latency user journey in process, against a [`Shop`]:
//!
//! ```text
//! per virtual user, per iteration:
//!     list_products ─ think ─ get_product(random id) ─ think
//!         ─ [order_probability]  create_order(that product, 1..=max_quantity)
//!         ─ [chaos_probability]  chaos_probe      (errors not counted)
//!         ─ pause
//! ```
//!
//! Users run as concurrent Tokio tasks. Each user draws its journey from its own entropy
//! source, seeded from the run seed and the user index, so a seeded run makes the same choices
//! however the tasks interleave.
//!
//! The run passes when the error rate stays below `max_error_rate` and the 95th percentile
//! request latency stays below `max_p95_ms`.

use crate::config::LoadConfig;
use crate::fault::{DelayRange, Entropy, RngEntropy};
use crate::lifecycle::Shop;
use crate::model::{Order, ProductId};
use crate::simulator::SharedSleeper;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};

const LIST: &str = "list_products";
const GET: &str = "get_product";
const ORDER: &str = "create_order";
const CHAOS: &str = "chaos_probe";

/// Attempts and failures of one boundary operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationSummary {
    pub attempts: u64,
    pub failures: u64,
    pub p95_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub virtual_users: usize,
    pub iterations: usize,
    pub operations: BTreeMap<&'static str, OperationSummary>,
    /// Requests that count toward the error rate; chaos probes do not.
    pub checked_requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,
    /// Over every request, chaos probes included.
    pub p95_ms: f64,
    pub error_rate_ok: bool,
    pub latency_ok: bool,
    pub elapsed_ms: u64,
}

impl LoadSummary {
    pub fn passed(&self) -> bool {
        self.error_rate_ok && self.latency_ok
    }

    pub fn operation(&self, name: &str) -> OperationSummary {
        self.operations.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct Tally {
    attempts: u64,
    failures: u64,
    latencies_ms: Vec<f64>,
}

/// Per-user measurements, merged after every user finishes.
#[derive(Debug, Default)]
struct Samples {
    tallies: BTreeMap<&'static str, Tally>,
}

impl Samples {
    fn record(&mut self, operation: &'static str, elapsed: Duration, ok: bool) {
        let tally = self.tallies.entry(operation).or_default();
        tally.attempts += 1;
        if !ok {
            tally.failures += 1;
        }
        tally.latencies_ms.push(elapsed.as_secs_f64() * 1_000.0);
    }

    fn merge(&mut self, other: Samples) {
        for (operation, tally) in other.tallies {
            let into = self.tallies.entry(operation).or_default();
            into.attempts += tally.attempts;
            into.failures += tally.failures;
            into.latencies_ms.extend(tally.latencies_ms);
        }
    }
}

/// Nearest-rank percentile; zero for no samples.
fn percentile(samples: &mut [f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(f64::total_cmp);
    let rank = ((p * samples.len() as f64).ceil() as usize).clamp(1, samples.len());
    samples[rank - 1]
}

#[derive(Debug, Clone)]
pub struct LoadDriver {
    shop: Shop,
    config: LoadConfig,
    product_count: u32,
    sleeper: SharedSleeper,
    seed: Option<u64>,
}

impl LoadDriver {
    /// `product_count` bounds the random product ids, `1..=product_count`.
    pub fn new(shop: Shop, config: LoadConfig, product_count: u32, sleeper: SharedSleeper) -> Self {
        Self {
            shop,
            config,
            product_count: product_count.max(1),
            sleeper,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub async fn run(&self) -> LoadSummary {
        let started = Instant::now();
        info!(
            users = self.config.virtual_users,
            iterations = self.config.iterations,
            "Load run starting"
        );

        let tasks: Vec<_> = (0..self.config.virtual_users)
            .map(|user| {
                let driver = self.clone();
                let span = info_span!("virtual_user", user);
                tokio::spawn(async move { driver.user_journeys(user).await }.instrument(span))
            })
            .collect();

        let mut samples = Samples::default();
        for task in tasks {
            match task.await {
                Ok(user_samples) => samples.merge(user_samples),
                Err(e) => tracing::error!(error = %e, "Virtual user task failed"),
            }
        }

        let summary = summarize(&self.config, samples, started.elapsed());
        info!(
            checked = summary.checked_requests,
            failed = summary.failed_requests,
            error_rate = summary.error_rate,
            p95_ms = summary.p95_ms,
            passed = summary.passed(),
            "Load run finished"
        );
        summary
    }

    fn entropy_for(&self, user: usize) -> RngEntropy {
        match self.seed {
            Some(seed) => RngEntropy::seeded(seed.wrapping_add(user as u64)),
            None => RngEntropy::from_os(),
        }
    }

    async fn user_journeys(self, user: usize) -> Samples {
        let mut entropy = self.entropy_for(user);
        let mut samples = Samples::default();
        for iteration in 0..self.config.iterations {
            debug!(iteration, "Journey");
            self.journey(&mut entropy, &mut samples).await;
        }
        samples
    }

    async fn journey(&self, entropy: &mut RngEntropy, samples: &mut Samples) {
        let started = Instant::now();
        let ok = self.shop.list_products().await.is_ok();
        samples.record(LIST, started.elapsed(), ok);
        self.pause(self.config.think_time, entropy).await;

        let id = ProductId(1 + pick(entropy.next_unit(), self.product_count));
        let started = Instant::now();
        let ok = self.shop.get_product(id).await.is_ok();
        samples.record(GET, started.elapsed(), ok);
        self.pause(self.config.think_time, entropy).await;

        if entropy.next_unit() < self.config.order_probability {
            let quantity = 1 + pick(entropy.next_unit(), self.config.max_quantity.max(1));
            let started = Instant::now();
            let ok = self.shop.create_order(Order::single(id, quantity)).await.is_ok();
            samples.record(ORDER, started.elapsed(), ok);
        }

        if entropy.next_unit() < self.config.chaos_probability {
            let started = Instant::now();
            let ok = self.shop.chaos_probe().await.is_ok();
            samples.record(CHAOS, started.elapsed(), ok);
        }

        self.pause(self.config.iteration_pause, entropy).await;
    }

    async fn pause(&self, range: DelayRange, entropy: &mut RngEntropy) {
        let delay = range.sample(entropy.next_unit());
        self.sleeper.sleep(delay).await;
    }
}

fn summarize(config: &LoadConfig, samples: Samples, elapsed: Duration) -> LoadSummary {
    let mut operations = BTreeMap::new();
    let mut all_latencies = Vec::new();
    let mut checked_requests = 0;
    let mut failed_requests = 0;

    for (operation, mut tally) in samples.tallies {
        if operation != CHAOS {
            checked_requests += tally.attempts;
            failed_requests += tally.failures;
        }
        operations.insert(
            operation,
            OperationSummary {
                attempts: tally.attempts,
                failures: tally.failures,
                p95_ms: percentile(&mut tally.latencies_ms, 0.95),
            },
        );
        all_latencies.extend(tally.latencies_ms);
    }

    let error_rate = if checked_requests == 0 {
        0.0
    } else {
        failed_requests as f64 / checked_requests as f64
    };
    let p95_ms = percentile(&mut all_latencies, 0.95);

    LoadSummary {
        virtual_users: config.virtual_users,
        iterations: config.iterations,
        operations,
        checked_requests,
        failed_requests,
        error_rate,
        p95_ms,
        error_rate_ok: error_rate < config.max_error_rate,
        latency_ok: p95_ms < config.max_p95_ms as f64,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Uniform index in `0..n` for a sample in `[0, 1)`.
fn pick(unit: f64, n: u32) -> u32 {
    ((unit * f64::from(n)) as u32).min(n.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_uses_nearest_rank() {
        let mut samples: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&mut samples, 0.95), 95.0);
        assert_eq!(percentile(&mut [3.0], 0.95), 3.0);
        assert_eq!(percentile(&mut [], 0.95), 0.0);
    }

    #[test]
    fn pick_stays_in_range() {
        assert_eq!(pick(0.0, 4), 0);
        assert_eq!(pick(0.999_999, 4), 3);
        assert_eq!(pick(0.5, 1), 0);
    }

    #[test]
    fn chaos_failures_do_not_count() {
        let mut samples = Samples::default();
        samples.record(LIST, Duration::from_millis(10), true);
        samples.record(GET, Duration::from_millis(10), false);
        samples.record(CHAOS, Duration::from_millis(10), false);
        samples.record(CHAOS, Duration::from_millis(10), false);

        let config = LoadConfig {
            max_error_rate: 0.6,
            ..LoadConfig::default()
        };
        let summary = summarize(&config, samples, Duration::ZERO);

        assert_eq!(summary.checked_requests, 2);
        assert_eq!(summary.failed_requests, 1);
        assert_eq!(summary.error_rate, 0.5);
        assert!(summary.error_rate_ok);
        assert_eq!(summary.operation(CHAOS).failures, 2);
        assert_eq!(summary.operation(ORDER), OperationSummary::default());
    }

    #[test]
    fn slow_tail_misses_the_latency_threshold() {
        let mut samples = Samples::default();
        for _ in 0..18 {
            samples.record(LIST, Duration::from_millis(20), true);
        }
        samples.record(GET, Duration::from_millis(750), true);
        samples.record(GET, Duration::from_millis(1_000), true);

        // nearest rank 19 of 20
        let summary = summarize(&LoadConfig::default(), samples, Duration::ZERO);

        assert_eq!(summary.p95_ms, 750.0);
        assert_eq!(summary.operation(GET).p95_ms, 1_000.0);
        assert!(summary.error_rate_ok);
        assert!(!summary.latency_ok);
        assert!(!summary.passed());
    }
}
