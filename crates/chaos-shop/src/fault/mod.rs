//! # Fault Profile
//!
//! Configuration for synthetic workload behaviour: for every [`OperationKind`] a weighted set
//! of [`Scenario`]s, each with an optional delay range and an [`Effect`] (succeed, fail, or hold a
//! memory spike). Randomness comes from an injectable [`Entropy`] source.
//!
//! ```rust
//! use chaos_shop::fault::{FaultProfile, OperationKind, OutcomeKind, ScriptedEntropy};
//!
//! let profile = FaultProfile::default();
//! let chaos = profile.scenarios(OperationKind::ChaosProbe);
//!
//! // Force the "error" scenario.
//! let mut entropy = ScriptedEntropy::new([chaos.selector_for("error").unwrap()]);
//! let outcome = profile.draw(OperationKind::ChaosProbe, &mut entropy);
//!
//! assert_eq!(outcome.scenario, "error");
//! assert_eq!(outcome.kind(), OutcomeKind::Failure);
//! ```

mod entropy;
mod profile;

pub use entropy::*;
pub use profile::*;
