//! File sink
//!
//! Appends each event as one text line to `{base_dir}/{label}.txt`.
//! Every `emit` opens, appends and closes the file, so no handle is held
//! between calls and a crash never leaves a buffered tail behind.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use super::{format_text_line, DataSink};
use crate::types::{ConfigError, PatientId, SinkError};

/// Append-only sink writing one file per label
pub struct FileSink {
    base_dir: PathBuf,
    /// Label -> file path, computed once per label
    paths: RwLock<HashMap<String, PathBuf>>,
}

impl FileSink {
    /// Create a sink rooted at `base_dir`
    ///
    /// The directory itself is created lazily on each write, so a missing
    /// directory is fine here. An empty path or an existing non-directory
    /// is rejected.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, ConfigError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        if base_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidBaseDirectory {
                path: base_dir,
                reason: "path is empty".to_string(),
            });
        }
        if base_dir.exists() && !base_dir.is_dir() {
            return Err(ConfigError::InvalidBaseDirectory {
                path: base_dir,
                reason: "path exists and is not a directory".to_string(),
            });
        }

        Ok(Self {
            base_dir,
            paths: RwLock::new(HashMap::new()),
        })
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the file path for a label, caching it on first use
    pub fn path_for(&self, label: &str) -> PathBuf {
        if let Some(path) = self.paths.read().get(label) {
            return path.clone();
        }

        // Another writer may have inserted between the read and write
        // locks; entry() keeps the first value.
        self.paths
            .write()
            .entry(label.to_string())
            .or_insert_with(|| self.base_dir.join(format!("{}.txt", label)))
            .clone()
    }

    fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        // Single write per line so concurrent appenders never interleave
        file.write_all(line.as_bytes())
    }
}

impl DataSink for FileSink {
    fn emit(
        &self,
        patient_id: PatientId,
        timestamp_millis: i64,
        label: &str,
        value: &str,
    ) -> Result<(), SinkError> {
        if let Err(source) = fs::create_dir_all(&self.base_dir) {
            warn!(
                path = %self.base_dir.display(),
                patient_id,
                label,
                error = %source,
                "error creating base directory, dropping event"
            );
            return Err(SinkError::Directory {
                path: self.base_dir.clone(),
                source,
            });
        }

        let path = self.path_for(label);
        let mut line = format_text_line(patient_id, timestamp_millis, label, value);
        line.push('\n');

        Self::append_line(&path, &line).map_err(|source| {
            warn!(
                path = %path.display(),
                patient_id,
                error = %source,
                "error writing to file"
            );
            SinkError::Write { path, source }
        })
    }
}
