//! Console sink

use std::io::{self, Write};

use super::{format_text_line, DataSink};
use crate::types::{Event, PatientId, SinkError};

/// Line format for console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// Same text line as the file sink
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Writes each event to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink {
    format: ConsoleFormat,
}

impl ConsoleSink {
    pub fn new(format: ConsoleFormat) -> Self {
        Self { format }
    }

    fn render(
        &self,
        patient_id: PatientId,
        timestamp_millis: i64,
        label: &str,
        value: &str,
    ) -> Result<String, SinkError> {
        match self.format {
            ConsoleFormat::Text => Ok(format_text_line(patient_id, timestamp_millis, label, value)),
            ConsoleFormat::Json => {
                Ok(Event::new(patient_id, timestamp_millis, label, value).to_json_line()?)
            }
        }
    }
}

impl DataSink for ConsoleSink {
    fn emit(
        &self,
        patient_id: PatientId,
        timestamp_millis: i64,
        label: &str,
        value: &str,
    ) -> Result<(), SinkError> {
        let line = self.render(patient_id, timestamp_millis, label, value)?;
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line).map_err(SinkError::Console)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text() {
        let sink = ConsoleSink::default();
        assert_eq!(
            sink.render(2, 10, "Alert", "resolved").unwrap(),
            "Patient ID: 2, Timestamp: 10, Label: Alert, Data: resolved"
        );
    }

    #[test]
    fn test_render_json() {
        let sink = ConsoleSink::new(ConsoleFormat::Json);
        let line = sink.render(2, 10, "Alert", "resolved").unwrap();
        let event: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(event, Event::new(2, 10, "Alert", "resolved"));
    }
}
