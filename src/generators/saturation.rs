//! Blood oxygen saturation generator
//!
//! Bounded random walk: each patient starts between 95% and 100% and moves
//! by at most one point per tick, clamped to `[MIN_SATURATION, MAX_SATURATION]`.

use crate::sinks::DataSink;
use crate::types::{check_patient_id, Event, GeneratorError, PatientId, SATURATION_LABEL};
use crate::utils::random::{RandomSource, SeededRandom};
use crate::utils::time::current_timestamp_millis;

use super::PatientDataGenerator;

pub const MIN_SATURATION: i32 = 90;
pub const MAX_SATURATION: i32 = 100;

/// Lowest starting value
const BASELINE_MIN: i32 = 95;

pub struct BloodSaturationGenerator<R = SeededRandom> {
    /// Last value per patient, indexed by `patient_id - 1`
    last_values: Vec<i32>,
    rng: R,
}

impl<R: RandomSource> BloodSaturationGenerator<R> {
    pub fn new(patient_count: usize, mut rng: R) -> Self {
        let span = (MAX_SATURATION - BASELINE_MIN + 1) as u32;
        let last_values = (0..patient_count)
            .map(|_| BASELINE_MIN + rng.next_below(span) as i32)
            .collect();
        Self { last_values, rng }
    }

    /// Last generated value for a patient
    pub fn last_value(&self, patient_id: PatientId) -> Option<i32> {
        let index = check_patient_id(patient_id, self.last_values.len()).ok()?;
        Some(self.last_values[index])
    }
}

impl<R: RandomSource> PatientDataGenerator for BloodSaturationGenerator<R> {
    fn name(&self) -> &'static str {
        "saturation"
    }

    fn patient_count(&self) -> usize {
        self.last_values.len()
    }

    fn generate(
        &mut self,
        patient_id: PatientId,
        sink: &dyn DataSink,
    ) -> Result<Option<Event>, GeneratorError> {
        let index = check_patient_id(patient_id, self.last_values.len())?;

        // -1, 0 or +1
        let variation = self.rng.next_below(3) as i32 - 1;
        let value = (self.last_values[index] + variation).clamp(MIN_SATURATION, MAX_SATURATION);
        self.last_values[index] = value;

        let event = Event::new(
            patient_id,
            current_timestamp_millis(),
            SATURATION_LABEL,
            format!("{:.1}%", f64::from(value)),
        );
        sink.emit_event(&event)?;
        Ok(Some(event))
    }
}
