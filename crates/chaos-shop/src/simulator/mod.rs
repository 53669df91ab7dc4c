//! # Workload Simulator
//!
//! Acts out a [`ScenarioOutcome`] drawn from the [`FaultProfile`]: sleeps the drawn delay,
//! returns an [`InjectedFault`], or holds a [`SpikeBuffer`] while it sleeps. Spikes in flight
//! share one `max_spike_bytes` budget; a spike gets what is left of it, possibly nothing.
//!
//! The scenario is reported to the [`TelemetryReporter`](crate::telemetry::TelemetryReporter)
//! *before* the task suspends, so the signal exists even if the caller abandons the operation
//! during the delay. The `workload.simulate` span is a [`ScopedSpan`](crate::telemetry::ScopedSpan)
//! and closes on every exit path.
//!
//! Time and randomness are injected ([`Sleeper`], [`SharedEntropy`]); tests swap in
//! [`RecordingSleeper`] and a scripted entropy source to make every path deterministic.

mod sleeper;
mod spike;

pub use sleeper::{RecordingSleeper, SharedSleeper, Sleeper, TokioSleeper};
pub use spike::{SpikeBuffer, SPIKE_CHUNK_BYTES};

use crate::fault::{
    Effect, FaultCategory, FaultProfile, OperationKind, OutcomeKind, ScenarioOutcome,
    Severity, SharedEntropy,
};
use crate::telemetry::SharedReporter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn, Instrument};

/// Upper bound on spike memory held at once, across every simulation in flight, unless
/// configured otherwise.
pub const DEFAULT_MAX_SPIKE_BYTES: usize = 8 * 1024 * 1024;

/// A simulated failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({operation}/{scenario}, {category} {severity})")]
pub struct InjectedFault {
    pub operation: OperationKind,
    pub scenario: String,
    pub category: FaultCategory,
    pub severity: Severity,
    pub message: String,
}

/// What a successful simulation did.
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub operation: OperationKind,
    pub scenario: String,
    pub outcome: OutcomeKind,
    pub delay: Duration,
    pub spike_bytes: usize,
    pub message: Option<String>,
}

/// Draws outcomes and executes them. Cheap to clone; clones share entropy, sleeper, reporter
/// and the spike gauge.
#[derive(Debug, Clone)]
pub struct WorkloadSimulator {
    profile: Arc<FaultProfile>,
    entropy: SharedEntropy,
    sleeper: SharedSleeper,
    reporter: SharedReporter,
    max_spike_bytes: usize,
    spike_in_use: Arc<AtomicUsize>,
}

impl WorkloadSimulator {
    pub fn new(
        profile: FaultProfile,
        entropy: SharedEntropy,
        sleeper: SharedSleeper,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            profile: Arc::new(profile),
            entropy,
            sleeper,
            reporter,
            max_spike_bytes: DEFAULT_MAX_SPIKE_BYTES,
            spike_in_use: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Budget shared by all concurrent spikes of this simulator and its clones.
    pub fn with_max_spike_bytes(mut self, max_spike_bytes: usize) -> Self {
        self.max_spike_bytes = max_spike_bytes;
        self
    }

    pub fn profile(&self) -> &FaultProfile {
        &self.profile
    }

    pub fn entropy(&self) -> &SharedEntropy {
        &self.entropy
    }

    pub fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    /// Spike memory currently held by simulations in flight.
    pub fn spike_bytes_in_use(&self) -> usize {
        self.spike_in_use.load(Ordering::SeqCst)
    }

    pub async fn draw(&self, kind: OperationKind) -> ScenarioOutcome {
        let profile = &self.profile;
        self.entropy.with(|e| profile.draw(kind, e)).await
    }

    /// Draw for `kind`, then simulate the outcome.
    pub async fn run(&self, kind: OperationKind) -> Result<SimReport, InjectedFault> {
        let outcome = self.draw(kind).await;
        self.simulate(&outcome).await
    }

    pub async fn simulate(&self, outcome: &ScenarioOutcome) -> Result<SimReport, InjectedFault> {
        let kind = outcome.kind();
        let requested_spike = match outcome.effect {
            Effect::Spike { bytes } => bytes,
            _ => 0,
        };
        // held until this future completes or is dropped
        let spike = (requested_spike > 0).then(|| {
            SpikeBuffer::allocate(
                requested_spike,
                self.max_spike_bytes,
                self.spike_in_use.clone(),
            )
        });
        let spike_bytes = spike.as_ref().map_or(0, SpikeBuffer::len);
        let delay_ms = u64::try_from(outcome.delay.as_millis()).unwrap_or(u64::MAX);

        let mut span = self.reporter.start_span("workload.simulate");
        span.set_attribute("operation", outcome.operation.as_str());
        span.set_attribute("scenario", outcome.scenario.as_str());
        span.set_attribute("outcome", kind.as_str());
        span.set_attribute("delay_ms", delay_ms);
        span.set_attribute("spike_bytes", spike_bytes);

        self.reporter.increment_counter(
            "workload_scenarios_total",
            &[
                ("operation", outcome.operation.as_str().to_string()),
                ("scenario", outcome.scenario.clone()),
                ("outcome", kind.as_str().to_string()),
            ],
        );
        self.reporter.record_histogram(
            "workload_delay_seconds",
            outcome.delay.as_secs_f64(),
            &[
                ("operation", outcome.operation.as_str().to_string()),
                ("scenario", outcome.scenario.clone()),
            ],
        );

        if spike_bytes < requested_spike {
            debug!(requested_spike, spike_bytes, "Spike clamped to the free budget");
        }
        debug!(
            operation = %outcome.operation,
            scenario = %outcome.scenario,
            outcome = kind.as_str(),
            delay_ms,
            spike_bytes,
            "Simulating"
        );

        let work = async {
            match outcome.effect {
                Effect::Succeed => {
                    self.sleeper.sleep(outcome.delay).await;
                    Ok(())
                }
                Effect::Fail { category, severity } => {
                    self.sleeper.sleep(outcome.delay).await;
                    Err(InjectedFault {
                        operation: outcome.operation,
                        scenario: outcome.scenario.clone(),
                        category,
                        severity,
                        message: outcome
                            .message
                            .clone()
                            .unwrap_or_else(|| format!("injected {category} fault")),
                    })
                }
                Effect::Spike { .. } => {
                    self.sleeper.sleep(outcome.delay).await;
                    Ok(())
                }
            }
        };

        let result = work.instrument(span.tracing_span().clone()).await;
        drop(spike);
        match result {
            Ok(()) => Ok(SimReport {
                operation: outcome.operation,
                scenario: outcome.scenario.clone(),
                outcome: kind,
                delay: outcome.delay,
                spike_bytes,
                message: outcome.message.clone(),
            }),
            Err(fault) => {
                span.mark_error();
                warn!(operation = %fault.operation, scenario = %fault.scenario, error = %fault, "Injected fault");
                Err(fault)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::ScriptedEntropy;
    use crate::telemetry::{AttributeValue, RecordingReporter};

    fn simulator(entropy: ScriptedEntropy) -> (WorkloadSimulator, RecordingSleeper, RecordingReporter) {
        let sleeper = RecordingSleeper::new();
        let reporter = RecordingReporter::new();
        let simulator = WorkloadSimulator::new(
            FaultProfile::default(),
            SharedEntropy::new(entropy),
            Arc::new(sleeper.clone()),
            Arc::new(reporter.clone()),
        );
        (simulator, sleeper, reporter)
    }

    fn force(scenario: &str, delay_unit: f64) -> ScriptedEntropy {
        let profile = FaultProfile::default();
        let unit = profile
            .scenarios(OperationKind::ChaosProbe)
            .selector_for(scenario)
            .unwrap();
        ScriptedEntropy::new([unit, delay_unit])
    }

    #[tokio::test]
    async fn slow_scenario_sleeps_drawn_delay() {
        let (sim, sleeper, reporter) = simulator(force("slow", 0.5));

        let report = sim.run(OperationKind::ChaosProbe).await.unwrap();

        assert_eq!(report.scenario, "slow");
        assert_eq!(report.outcome, OutcomeKind::Delay);
        assert_eq!(report.delay, Duration::from_millis(3_500));
        assert_eq!(sleeper.durations(), vec![Duration::from_millis(3_500)]);
        assert_eq!(
            reporter.counter(
                "workload_scenarios_total",
                &[("operation", "chaos-probe"), ("scenario", "slow"), ("outcome", "delay")]
            ),
            1
        );
        assert_eq!(
            reporter.histogram(
                "workload_delay_seconds",
                &[("operation", "chaos-probe"), ("scenario", "slow")]
            ),
            vec![3.5]
        );
    }

    #[tokio::test]
    async fn error_scenario_returns_fault_and_marks_span() {
        let (sim, sleeper, reporter) = simulator(force("error", 0.0));

        let fault = sim.run(OperationKind::ChaosProbe).await.unwrap_err();

        assert_eq!(fault.category, FaultCategory::Internal);
        assert_eq!(fault.message, "Simulated server error");
        assert_eq!(sleeper.durations(), vec![Duration::ZERO]);

        let spans = reporter.spans_named("workload.simulate");
        assert_eq!(spans.len(), 1);
        assert!(spans[0].error);
        assert_eq!(
            spans[0].attribute("outcome"),
            Some(&AttributeValue::Str("failure".into()))
        );
    }

    #[tokio::test]
    async fn memory_scenario_is_clamped_and_released() {
        let (sim, sleeper, _) = simulator(force("memory", 0.0));
        let sim = sim.with_max_spike_bytes(4_096);

        let report = sim.run(OperationKind::ChaosProbe).await.unwrap();

        assert_eq!(report.outcome, OutcomeKind::Spike);
        assert_eq!(report.spike_bytes, 4_096);
        assert_eq!(sleeper.durations(), vec![Duration::from_millis(100)]);
        assert_eq!(sim.spike_bytes_in_use(), 0);
    }

    /// Parks every sleep until the test hands out a permit.
    #[derive(Debug)]
    struct Gate(Arc<tokio::sync::Semaphore>);

    #[async_trait::async_trait]
    impl Sleeper for Gate {
        async fn sleep(&self, _: Duration) {
            let _permit = self.0.acquire().await;
        }
    }

    #[tokio::test]
    async fn concurrent_spikes_stay_within_one_budget() {
        let memory = FaultProfile::default()
            .scenarios(OperationKind::ChaosProbe)
            .selector_for("memory")
            .unwrap();
        let script: Vec<f64> = (0..20).flat_map(|_| [memory, 0.0]).collect();
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let reporter = RecordingReporter::new();
        let sim = WorkloadSimulator::new(
            FaultProfile::default(),
            SharedEntropy::new(ScriptedEntropy::new(script)),
            Arc::new(Gate(gate.clone())),
            Arc::new(reporter.clone()),
        )
        .with_max_spike_bytes(1_500_000);

        let runs: Vec<_> = (0..20)
            .map(|_| {
                let sim = sim.clone();
                tokio::spawn(async move { sim.run(OperationKind::ChaosProbe).await })
            })
            .collect();
        while reporter.counter_total("workload_scenarios_total") < 20 {
            tokio::task::yield_now().await;
        }

        // all twenty are holding their spike at the gate
        assert_eq!(sim.spike_bytes_in_use(), 1_500_000);

        gate.add_permits(20);
        let mut granted = Vec::new();
        for run in runs {
            granted.push(run.await.unwrap().unwrap().spike_bytes);
        }
        granted.sort_unstable();

        assert_eq!(granted.iter().sum::<usize>(), 1_500_000);
        assert_eq!(granted[19], 1_000_000);
        assert_eq!(granted[18], 500_000);
        assert_eq!(granted[17], 0);
        assert_eq!(sim.spike_bytes_in_use(), 0);
    }

    #[tokio::test]
    async fn spike_is_released_when_abandoned() {
        #[derive(Debug)]
        struct Forever;

        #[async_trait::async_trait]
        impl Sleeper for Forever {
            async fn sleep(&self, _: Duration) {
                std::future::pending::<()>().await;
            }
        }

        let reporter = RecordingReporter::new();
        let sim = WorkloadSimulator::new(
            FaultProfile::default(),
            SharedEntropy::new(force("memory", 0.0)),
            Arc::new(Forever),
            Arc::new(reporter.clone()),
        );

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            sim.run(OperationKind::ChaosProbe),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(sim.spike_bytes_in_use(), 0);
        assert_eq!(reporter.spans_named("workload.simulate").len(), 1);
        assert_eq!(reporter.counter_total("workload_scenarios_total"), 1);
    }
}
