//! Periodic driver
//!
//! The simulator owns the generators and a shared sink. Each generator runs
//! in its own task on its own interval and visits patients
//! `1..=patient_count` in order, so no patient ever has two concurrent
//! calls on the same generator. Failures are logged and counted, never
//! fatal.
//!
//! File and console sinks do blocking I/O inside `emit`. On a multi-thread
//! runtime each tick runs under `block_in_place` so that I/O does not stall
//! other tasks on the worker. A current-thread runtime runs ticks inline.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SimulatorConfig;
use crate::generators::{AlertStateMachine, BloodSaturationGenerator, PatientDataGenerator};
use crate::sinks::DataSink;
use crate::types::PatientId;
use crate::utils::random::SeededRandom;

/// Outcome of one or more ticks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Events produced and accepted by the sink
    pub events: usize,
    /// Calls that returned an error
    pub failures: usize,
}

impl TickReport {
    fn merge(&mut self, other: TickReport) {
        self.events += other.events;
        self.failures += other.failures;
    }
}

struct ScheduledGenerator {
    generator: Box<dyn PatientDataGenerator>,
    period: Duration,
}

/// Drives generators against a shared sink
pub struct Simulator {
    patient_count: usize,
    sink: Arc<dyn DataSink>,
    generators: Vec<ScheduledGenerator>,
}

impl Simulator {
    pub fn new(patient_count: usize, sink: Arc<dyn DataSink>) -> Self {
        Self {
            patient_count,
            sink,
            generators: Vec::new(),
        }
    }

    /// Build a simulator with the standard alert and saturation generators
    ///
    /// With a seed set, each generator gets its own stream derived from it.
    pub fn from_config(config: &SimulatorConfig, sink: Arc<dyn DataSink>) -> Self {
        let count = config.patient_count;
        let rng = |offset: u64| {
            SeededRandom::from_optional_seed(config.seed.map(|seed| seed.wrapping_add(offset)))
        };

        let mut simulator = Self::new(count, sink);
        simulator
            .add_generator(
                Box::new(AlertStateMachine::new(count, rng(0)).with_alert_rate(config.alert_rate)),
                config.alert_interval(),
            )
            .add_generator(
                Box::new(BloodSaturationGenerator::new(count, rng(1))),
                config.saturation_interval(),
            );
        simulator
    }

    /// Register a generator to run every `period`
    pub fn add_generator(
        &mut self,
        generator: Box<dyn PatientDataGenerator>,
        period: Duration,
    ) -> &mut Self {
        self.generators.push(ScheduledGenerator { generator, period });
        self
    }

    /// Get the number of registered generators
    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    pub fn patient_count(&self) -> usize {
        self.patient_count
    }

    /// Run `ticks` rounds of every generator on the calling thread
    pub fn run_ticks(&mut self, ticks: usize) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..ticks {
            for scheduled in &mut self.generators {
                report.merge(tick(
                    scheduled.generator.as_mut(),
                    self.patient_count,
                    self.sink.as_ref(),
                ));
            }
        }
        report
    }

    /// Run every generator on its interval until `shutdown` turns true
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> TickReport {
        info!(
            patients = self.patient_count,
            generators = self.generators.len(),
            "simulator started"
        );

        let handles: Vec<_> = self
            .generators
            .into_iter()
            .map(|scheduled| {
                tokio::spawn(run_generator(
                    scheduled,
                    self.patient_count,
                    Arc::clone(&self.sink),
                    shutdown.clone(),
                ))
            })
            .collect();

        let mut report = TickReport::default();
        for handle in handles {
            match handle.await {
                Ok(generator_report) => report.merge(generator_report),
                Err(e) => error!(error = %e, "generator task failed"),
            }
        }

        info!(
            events = report.events,
            failures = report.failures,
            "simulator stopped"
        );
        report
    }
}

async fn run_generator(
    mut scheduled: ScheduledGenerator,
    patient_count: usize,
    sink: Arc<dyn DataSink>,
    mut shutdown: watch::Receiver<bool>,
) -> TickReport {
    let name = scheduled.generator.name();
    let mut ticker = interval(scheduled.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut report = TickReport::default();

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                report.merge(tick_on_worker(
                    scheduled.generator.as_mut(),
                    patient_count,
                    sink.as_ref(),
                ));
            }
            changed = shutdown.changed() => {
                // A dropped sender also means stop
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!(generator = name, events = report.events, "generator stopped");
    report
}

/// Run a tick from inside a runtime task, moving blocking sink I/O off the
/// async scheduler where the runtime allows it
fn tick_on_worker(
    generator: &mut dyn PatientDataGenerator,
    patient_count: usize,
    sink: &dyn DataSink,
) -> TickReport {
    if Handle::current().runtime_flavor() == RuntimeFlavor::MultiThread {
        tokio::task::block_in_place(|| tick(generator, patient_count, sink))
    } else {
        tick(generator, patient_count, sink)
    }
}

/// One pass over every patient for one generator
fn tick(
    generator: &mut dyn PatientDataGenerator,
    patient_count: usize,
    sink: &dyn DataSink,
) -> TickReport {
    let mut report = TickReport::default();
    for index in 1..=patient_count {
        let patient_id = index as PatientId;
        match generator.generate(patient_id, sink) {
            Ok(Some(_)) => report.events += 1,
            Ok(None) => {}
            Err(e) => {
                warn!(
                    patient_id,
                    generator = generator.name(),
                    error = %e,
                    "failed to generate event"
                );
                report.failures += 1;
            }
        }
    }
    report
}
