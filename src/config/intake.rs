//! Intake conversation configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Intake conversation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Bound on a single extraction call, in seconds
    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_secs: u64,

    /// Where completed records go
    #[serde(default)]
    pub record_sink: RecordSinkKind,

    /// Directory for the file sink
    #[serde(default = "default_records_dir")]
    pub records_dir: PathBuf,
}

/// Record sink selection
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordSinkKind {
    /// One YAML file per session
    #[default]
    File,
    /// Process memory; records are lost on exit
    Memory,
}

impl IntakeConfig {
    /// Get extraction timeout as Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate intake configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.extraction_timeout_secs == 0 || self.extraction_timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout("intake.extraction_timeout_secs"));
        }
        if self.record_sink == RecordSinkKind::File && self.records_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyRecordsDir);
        }
        Ok(())
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: default_extraction_timeout(),
            record_sink: RecordSinkKind::default(),
            records_dir: default_records_dir(),
        }
    }
}

fn default_extraction_timeout() -> u64 {
    30
}

fn default_records_dir() -> PathBuf {
    PathBuf::from("./data/intakes")
}
