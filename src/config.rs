//! Simulator configuration
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. JSON config file (`--config`)
//! 3. environment (`VITALS_PATIENT_COUNT`, `VITALS_OUTPUT`, `VITALS_SEED`,
//!    `VITALS_ALERT_RATE`)
//! 4. command line flags
//!
//! `validate()` runs last and fails fast on anything unusable.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::generators::DEFAULT_ALERT_RATE;
use crate::sinks::ConsoleFormat;
use crate::types::{ConfigError, PatientId};

/// Where generated events go
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputTarget {
    Console(ConsoleFormat),
    File(PathBuf),
    Tcp(u16),
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::Console(ConsoleFormat::Text)
    }
}

impl FromStr for OutputTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidOutput(s.to_string());
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };

        match (kind, arg) {
            ("console", None) => Ok(OutputTarget::Console(ConsoleFormat::Text)),
            ("console", Some("json")) => Ok(OutputTarget::Console(ConsoleFormat::Json)),
            ("file", Some(dir)) if !dir.is_empty() => Ok(OutputTarget::File(PathBuf::from(dir))),
            ("tcp", Some(port)) => port.parse().map(OutputTarget::Tcp).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for OutputTarget {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Console(ConsoleFormat::Text) => write!(f, "console"),
            OutputTarget::Console(ConsoleFormat::Json) => write!(f, "console:json"),
            OutputTarget::File(dir) => write!(f, "file:{}", dir.display()),
            OutputTarget::Tcp(port) => write!(f, "tcp:{}", port),
        }
    }
}

/// Configuration for a simulator run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of simulated patients
    pub patient_count: usize,
    pub output: OutputTarget,
    /// Expected alerts per tick per patient
    pub alert_rate: f64,
    /// Tick period of the alert generator
    pub alert_interval_ms: u64,
    /// Tick period of the saturation generator
    pub saturation_interval_ms: u64,
    /// Seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            patient_count: 50,
            output: OutputTarget::default(),
            alert_rate: DEFAULT_ALERT_RATE,
            alert_interval_ms: 1000,
            saturation_interval_ms: 1000,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Load a JSON config file; missing keys fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from process environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from a variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VITALS_PATIENT_COUNT") {
            self.patient_count = parse_env("VITALS_PATIENT_COUNT", value)?;
        }
        if let Some(value) = lookup("VITALS_OUTPUT") {
            self.output = value.parse()?;
        }
        if let Some(value) = lookup("VITALS_SEED") {
            self.seed = Some(parse_env("VITALS_SEED", value)?);
        }
        if let Some(value) = lookup("VITALS_ALERT_RATE") {
            self.alert_rate = parse_env("VITALS_ALERT_RATE", value)?;
        }
        Ok(())
    }

    /// Check every field, failing on the first invalid one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patient_count > PatientId::MAX as usize {
            return Err(ConfigError::InvalidPatientCount(format!(
                "{} exceeds maximum {}",
                self.patient_count,
                PatientId::MAX
            )));
        }
        if !self.alert_rate.is_finite() || self.alert_rate < 0.0 {
            return Err(ConfigError::InvalidAlertRate(self.alert_rate));
        }
        if self.alert_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval("alert".to_string()));
        }
        if self.saturation_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval("saturation".to_string()));
        }
        Ok(())
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_millis(self.alert_interval_ms)
    }

    pub fn saturation_interval(&self) -> Duration {
        Duration::from_millis(self.saturation_interval_ms)
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
