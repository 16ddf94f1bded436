//! Command line interface

use std::path::PathBuf;

use clap::Parser;

use crate::config::{OutputTarget, SimulatorConfig};
use crate::types::ConfigError;

#[derive(Debug, Parser)]
#[command(name = "vitals-generator")]
#[command(about = "Stream synthetic patient vital signs to a console, files or a TCP client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Number of patients to simulate
    #[arg(long)]
    pub patient_count: Option<usize>,

    /// console, console:json, file:<dir> or tcp:<port>
    #[arg(long)]
    pub output: Option<OutputTarget>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Build the effective configuration: defaults, file, env, then flags
    pub fn load_config(&self) -> Result<SimulatorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::from_file(path)?,
            None => SimulatorConfig::default(),
        };
        config.apply_env()?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Override config fields with any flags that were given
    pub fn apply(&self, config: &mut SimulatorConfig) {
        if let Some(count) = self.patient_count {
            config.patient_count = count;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}
