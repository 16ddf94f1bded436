//! Vitals Stream
//!
//! Synthesizes streaming vital-sign events for a fixed population of
//! patients and delivers each event to a pluggable sink.
//!
//! # Features
//!
//! - **Alert state machine**: per-patient `Resolved`/`Active` transitions
//!   driven by a Poisson trigger probability
//! - **Injectable randomness**: every generator owns its random source, so
//!   runs can be seeded and tests pinned
//! - **Sinks**: per-label append-only files, a single-client TCP stream
//!   and the console
//! - **Driver**: one tokio task per generator on its own interval
//!
//! # Modules
//!
//! - `types`: Events, alert state and error types
//! - `generators`: Alert state machine and saturation random walk
//! - `sinks`: `DataSink` trait with file, TCP and console implementations
//! - `simulator`: Periodic driver
//! - `config`: Layered configuration (defaults, file, env, flags)
//! - `cli`: Command line flags
//! - `utils`: Timestamps and random sources
//!
//! # Example
//!
//! ```no_run
//! use vitals_stream::{AlertStateMachine, FileSink, PatientDataGenerator, SeededRandom};
//!
//! let sink = FileSink::new("output").unwrap();
//! let mut alerts = AlertStateMachine::new(10, SeededRandom::from_seed(7));
//! for patient_id in 1..=10 {
//!     alerts.generate(patient_id, &sink).unwrap();
//! }
//! ```

pub mod cli;
pub mod config;
pub mod generators;
pub mod simulator;
pub mod sinks;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{OutputTarget, SimulatorConfig};
pub use generators::{AlertStateMachine, BloodSaturationGenerator, PatientDataGenerator};
pub use simulator::{Simulator, TickReport};
pub use sinks::{build_sink, ConsoleFormat, ConsoleSink, DataSink, FileSink, StreamSink};
pub use types::{
    AlertState, ConfigError, Event, GeneratorError, OutOfRangeError, PatientId, SimResult,
    SinkError, TransportError,
};
pub use utils::{FixedRandom, RandomSource, SeededRandom, SequenceRandom};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
