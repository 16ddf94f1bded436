//! Error types
//!
//! Each concern has its own enum so callers can tell a bad configuration
//! apart from a dropped event. Per-event errors (`SinkError`,
//! `GeneratorError`) are meant to be logged and skipped by the driver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::event::PatientId;

/// Invalid configuration, raised when building config or sinks
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid patient count: {0}")]
    InvalidPatientCount(String),

    #[error("invalid base directory '{}': {reason}", path.display())]
    InvalidBaseDirectory { path: PathBuf, reason: String },

    #[error("port {port} unavailable: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("invalid output target '{0}' (expected console, console:json, file:<dir> or tcp:<port>)")]
    InvalidOutput(String),

    #[error("invalid alert rate {0}: must be finite and non-negative")]
    InvalidAlertRate(f64),

    #[error("invalid tick interval for '{0}': must be greater than zero")]
    InvalidTickInterval(String),

    #[error("failed to read config file '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
}

/// Patient id outside `[1, patient_count]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("patient id {patient_id} out of range [1, {patient_count}]")]
pub struct OutOfRangeError {
    pub patient_id: PatientId,
    pub patient_count: usize,
}

/// Failure on the TCP stream sink after a successful bind
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to accept client: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to write to client: {0}")]
    Write(#[source] io::Error),

    #[error("client connection closed")]
    Disconnected,
}

/// Failure to persist or deliver a single event
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create base directory '{}': {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to console: {0}")]
    Console(#[source] io::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure of one generator call for one patient
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    OutOfRange(#[from] OutOfRangeError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
