//! Data types for the vitals stream
//!
//! This module contains the core data structures and error types used
//! throughout the generator, sinks and driver.

mod alert;
mod error;
mod event;

pub use alert::AlertState;
pub use error::{ConfigError, GeneratorError, OutOfRangeError, SinkError, TransportError};
pub use event::{Event, PatientId, ALERT_LABEL, RESOLVED_VALUE, SATURATION_LABEL, TRIGGERED_VALUE};

/// Result type for top-level operations (binary entry point, wiring)
pub type SimResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Check that a patient id lies in `[1, patient_count]`
pub fn check_patient_id(patient_id: PatientId, patient_count: usize) -> Result<usize, OutOfRangeError> {
    let index = patient_id as usize;
    if patient_id == 0 || index > patient_count {
        return Err(OutOfRangeError {
            patient_id,
            patient_count,
        });
    }
    Ok(index - 1)
}
