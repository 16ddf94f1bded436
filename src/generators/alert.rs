//! Alert state machine
//!
//! Each patient is either `Resolved` or `Active`. On every call:
//!
//! - `Active`: resolves with probability 0.9 and emits `"resolved"`.
//! - `Resolved`: triggers with probability `p = 1 - e^(-lambda)`, the
//!   chance of at least one Poisson arrival in one tick, and emits
//!   `"triggered"`.
//!
//! No transition, no event.

use crate::sinks::DataSink;
use crate::types::{
    check_patient_id, AlertState, Event, GeneratorError, OutOfRangeError, PatientId, ALERT_LABEL,
    RESOLVED_VALUE, TRIGGERED_VALUE,
};
use crate::utils::random::{RandomSource, SeededRandom};
use crate::utils::time::current_timestamp_millis;

use super::PatientDataGenerator;

/// Expected alerts per tick
pub const DEFAULT_ALERT_RATE: f64 = 0.1;

/// Chance that an active alert resolves on a given tick
pub const DEFAULT_RESOLVE_PROBABILITY: f64 = 0.9;

/// Probability of at least one arrival in one tick for a Poisson rate
pub fn trigger_probability(lambda: f64) -> f64 {
    // 1 - e^(-lambda), computed without cancellation for small lambda
    -(-lambda).exp_m1()
}

/// Per-patient probabilistic alert generator
pub struct AlertStateMachine<R = SeededRandom> {
    /// Indexed by `patient_id - 1`
    states: Vec<AlertState>,
    rng: R,
    trigger_probability: f64,
    resolve_probability: f64,
    clock: fn() -> i64,
}

impl<R: RandomSource> AlertStateMachine<R> {
    /// Create a state machine with every patient `Resolved`
    pub fn new(patient_count: usize, rng: R) -> Self {
        Self {
            states: vec![AlertState::Resolved; patient_count],
            rng,
            trigger_probability: trigger_probability(DEFAULT_ALERT_RATE),
            resolve_probability: DEFAULT_RESOLVE_PROBABILITY,
            clock: current_timestamp_millis,
        }
    }

    /// Use a different Poisson rate for triggering
    pub fn with_alert_rate(mut self, lambda: f64) -> Self {
        self.trigger_probability = trigger_probability(lambda);
        self
    }

    /// Use a fixed timestamp source
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Current per-tick trigger probability
    pub fn trigger_threshold(&self) -> f64 {
        self.trigger_probability
    }

    /// Current alert state of a patient
    pub fn state(&self, patient_id: PatientId) -> Result<AlertState, OutOfRangeError> {
        let index = check_patient_id(patient_id, self.states.len())?;
        Ok(self.states[index])
    }

    /// Number of patients with an active alert
    pub fn active_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_active()).count()
    }

    /// Apply one probabilistic transition for a patient
    ///
    /// Returns the transition event, or `None` when the state is unchanged.
    pub fn advance(&mut self, patient_id: PatientId) -> Result<Option<Event>, OutOfRangeError> {
        let index = check_patient_id(patient_id, self.states.len())?;
        let draw = self.rng.next_f64();

        let (next, value) = match self.states[index] {
            AlertState::Active if draw < self.resolve_probability => {
                (AlertState::Resolved, RESOLVED_VALUE)
            }
            AlertState::Resolved if draw < self.trigger_probability => {
                (AlertState::Active, TRIGGERED_VALUE)
            }
            _ => return Ok(None),
        };

        self.states[index] = next;
        Ok(Some(Event::new(patient_id, (self.clock)(), ALERT_LABEL, value)))
    }
}

impl<R: RandomSource> PatientDataGenerator for AlertStateMachine<R> {
    fn name(&self) -> &'static str {
        "alert"
    }

    fn patient_count(&self) -> usize {
        self.states.len()
    }

    fn generate(
        &mut self,
        patient_id: PatientId,
        sink: &dyn DataSink,
    ) -> Result<Option<Event>, GeneratorError> {
        let Some(event) = self.advance(patient_id)? else {
            return Ok(None);
        };
        sink.emit_event(&event)?;
        Ok(Some(event))
    }
}
