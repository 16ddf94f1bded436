//! Event sinks
//!
//! A sink is a destination for generated events. One sink instance is
//! shared by every generator and patient, so implementations must accept
//! concurrent `emit` calls.
//!
//! - `FileSink`: one append-only text file per label
//! - `StreamSink`: single-client TCP line stream, drops while unconnected
//! - `ConsoleSink`: stdout, text or JSON lines

mod console;
mod file;
mod stream;

use std::sync::Arc;

use tracing::info;

use crate::config::OutputTarget;
use crate::types::{ConfigError, Event, PatientId, SinkError};

pub use console::{ConsoleFormat, ConsoleSink};
pub use file::FileSink;
pub use stream::{StreamSink, WRITE_QUEUE_CAPACITY};

/// Destination accepting one event at a time
pub trait DataSink: Send + Sync {
    fn emit(
        &self,
        patient_id: PatientId,
        timestamp_millis: i64,
        label: &str,
        value: &str,
    ) -> Result<(), SinkError>;

    /// Emit a fully built event
    fn emit_event(&self, event: &Event) -> Result<(), SinkError> {
        self.emit(
            event.patient_id,
            event.timestamp_millis,
            &event.label,
            &event.value,
        )
    }
}

impl<S: DataSink + ?Sized> DataSink for Arc<S> {
    fn emit(
        &self,
        patient_id: PatientId,
        timestamp_millis: i64,
        label: &str,
        value: &str,
    ) -> Result<(), SinkError> {
        (**self).emit(patient_id, timestamp_millis, label, value)
    }
}

/// Build the sink for an output target
///
/// A TCP target binds immediately and must run inside a tokio runtime.
pub async fn build_sink(target: &OutputTarget) -> Result<Arc<dyn DataSink>, ConfigError> {
    info!(output = %target, "building sink");
    let sink: Arc<dyn DataSink> = match target {
        OutputTarget::Console(format) => Arc::new(ConsoleSink::new(*format)),
        OutputTarget::File(dir) => Arc::new(FileSink::new(dir)?),
        OutputTarget::Tcp(port) => Arc::new(StreamSink::bind(*port).await?),
    };
    Ok(sink)
}

/// Line written by `FileSink` and the text console format
pub fn format_text_line(patient_id: PatientId, timestamp_millis: i64, label: &str, value: &str) -> String {
    format!(
        "Patient ID: {}, Timestamp: {}, Label: {}, Data: {}",
        patient_id, timestamp_millis, label, value
    )
}

/// Line written by `StreamSink`, without the trailing newline
pub fn format_wire_line(patient_id: PatientId, timestamp_millis: i64, label: &str, value: &str) -> String {
    format!("{},{},{},{}", patient_id, timestamp_millis, label, value)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_formats() {
        assert_eq!(
            format_text_line(3, 1000, "Alert", "triggered"),
            "Patient ID: 3, Timestamp: 1000, Label: Alert, Data: triggered"
        );
        assert_eq!(format_wire_line(3, 1000, "Alert", "resolved"), "3,1000,Alert,resolved");
    }

    #[tokio::test]
    async fn test_build_sink_rejects_bad_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let file_path = temp_dir.path().join("plain_file");
        std::fs::write(&file_path, "x").unwrap();

        let result = build_sink(&OutputTarget::File(file_path)).await;
        assert!(matches!(result, Err(ConfigError::InvalidBaseDirectory { .. })));
    }

    #[test]
    fn test_arc_sink_forwards() {
        let sink = Arc::new(testing::RecordingSink::default());
        let shared: Arc<dyn DataSink> = sink.clone();
        shared.emit_event(&Event::new(1, 5, "Alert", "triggered")).unwrap();
        Arc::clone(&sink).emit(2, 6, "Alert", "resolved").unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].patient_id, 1);
        assert_eq!(events[1].value, "resolved");
    }
}
