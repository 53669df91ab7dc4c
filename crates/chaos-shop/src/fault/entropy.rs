//! Injectable randomness.
//!
//! Every random decision in the shop (scenario selection, delay length, order id, the load
//! driver's coin flips) pulls uniform samples in `[0, 1)` from one [`Entropy`] source. Seed it
//! for reproducible runs, or script it in tests to force a particular path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A source of uniform samples in `[0, 1)`.
pub trait Entropy: Send + std::fmt::Debug {
    fn next_unit(&mut self) -> f64;
}

/// Entropy backed by a `rand` generator.
#[derive(Debug)]
pub struct RngEntropy {
    rng: StdRng,
}

impl RngEntropy {
    /// Reproducible sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Entropy for RngEntropy {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of samples, then keeps returning `fallback`.
///
/// Values are clamped into `[0, 1)`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEntropy {
    queue: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedEntropy {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: values.into_iter().collect(),
            fallback: 0.0,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl Entropy for ScriptedEntropy {
    fn next_unit(&mut self) -> f64 {
        let value = self.queue.pop_front().unwrap_or(self.fallback);
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, MAX_UNIT)
    }
}

/// Largest `f64` below 1.0.
const MAX_UNIT: f64 = 1.0 - f64::EPSILON / 2.0;

/// Entropy shared between tasks.
///
/// The lock is held only for the duration of one sample, never across an `.await` point of
/// the caller.
#[derive(Debug, Clone)]
pub struct SharedEntropy {
    inner: Arc<Mutex<Box<dyn Entropy>>>,
}

impl SharedEntropy {
    pub fn new(entropy: impl Entropy + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(entropy))),
        }
    }

    /// Seeded when `seed` is given, otherwise from the OS.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(RngEntropy::seeded(seed)),
            None => Self::new(RngEntropy::from_os()),
        }
    }

    pub async fn next_unit(&self) -> f64 {
        self.inner.lock().await.next_unit()
    }

    /// Runs `f` with exclusive access to the source.
    pub async fn with<T>(&self, f: impl FnOnce(&mut dyn Entropy) -> T) -> T {
        let mut source = self.inner.lock().await;
        f(&mut **source)
    }
}
