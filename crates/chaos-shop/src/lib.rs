//! # Chaos Shop
//!
//! A demo shop core with a synthetic workload and fault-injection harness. Product and order
//! operations behave like a small real service: variable latency, probabilistic payment
//! failures, and an endpoint that injects slow responses, errors and memory spikes. Every
//! outcome is reported through a narrow telemetry interface, so an observability pipeline can
//! be exercised against inputs with a known distribution.
//!
//! ## Modules
//!
//! - [`catalog`]: the product catalog actor, built on [`actor_framework::ResourceActor`]
//! - [`clients`]: [`CatalogClient`](clients::CatalogClient), the typed client for it
//! - [`fault`]: weighted scenarios per operation, and injectable entropy
//! - [`simulator`]: acts out drawn scenarios (sleep, fail, spike)
//! - [`orders`]: validate, price, reserve, pay, commit or compensate
//! - [`telemetry`]: the reporter interface, its `metrics`/`tracing` and in-memory implementations
//! - [`lifecycle`]: [`ShopSystem`](lifecycle::ShopSystem) and the [`Shop`](lifecycle::Shop) facade
//! - [`config`], [`load`]: TOML configuration and the in-process load driver
//!
//! ## Testing
//!
//! See [`actor_framework::mock`] for testing [`CatalogClient`](clients::CatalogClient) without
//! spawning the actor, and [`simulator::RecordingSleeper`] plus [`fault::ScriptedEntropy`] for
//! forcing scenarios without waiting on them.

pub mod catalog;
pub mod clients;
pub mod config;
pub mod error;
pub mod fault;
pub mod lifecycle;
pub mod load;
pub mod model;
pub mod orders;
pub mod simulator;
pub mod telemetry;

pub use error::{ErrorClass, ShopError};
