//! Vital-sign events
//!
//! An event is an immutable record produced by a generator for one patient
//! at one instant. Sinks receive its four fields and choose their own
//! line format.

use serde::{Deserialize, Serialize};

/// Patient identifier, valid in `[1, patient_count]`
pub type PatientId = u32;

/// Label used by alert transitions
pub const ALERT_LABEL: &str = "Alert";

/// Value emitted when an alert fires
pub const TRIGGERED_VALUE: &str = "triggered";

/// Value emitted when an alert clears
pub const RESOLVED_VALUE: &str = "resolved";

/// Label used by blood saturation readings
pub const SATURATION_LABEL: &str = "Saturation";

/// A generated vital-sign event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "patientId")]
    pub patient_id: PatientId,

    /// Unix timestamp in milliseconds
    #[serde(rename = "timestampMillis")]
    pub timestamp_millis: i64,

    /// Data type tag, e.g. "Alert"
    pub label: String,

    /// Payload, e.g. "triggered"
    pub value: String,
}

impl Event {
    pub fn new(
        patient_id: PatientId,
        timestamp_millis: i64,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            timestamp_millis,
            label: label.into(),
            value: value.into(),
        }
    }

    /// Serialize to a single JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
