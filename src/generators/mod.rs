//! Patient data generators
//!
//! A generator owns per-patient state and is called once per patient per
//! tick by the driver. Generators are not internally synchronized: each
//! instance is driven by a single task, which gives at most one in-flight
//! call per patient.

mod alert;
mod saturation;

use crate::sinks::DataSink;
use crate::types::{Event, GeneratorError, PatientId};

pub use alert::{
    trigger_probability, AlertStateMachine, DEFAULT_ALERT_RATE, DEFAULT_RESOLVE_PROBABILITY,
};
pub use saturation::{BloodSaturationGenerator, MAX_SATURATION, MIN_SATURATION};

/// Capability of producing events for a fixed patient population
pub trait PatientDataGenerator: Send {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Number of patients this generator was built for
    fn patient_count(&self) -> usize;

    /// Advance one patient and forward any produced event to `sink`
    ///
    /// Returns the event that was emitted, if any. `Ok(None)` is a normal
    /// outcome.
    fn generate(
        &mut self,
        patient_id: PatientId,
        sink: &dyn DataSink,
    ) -> Result<Option<Event>, GeneratorError>;
}
