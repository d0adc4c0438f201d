use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use msamp_core::errors::{ErrorInfo, SampleError};
use serde::{Deserialize, Serialize};

use crate::data::DATA_FILE_NAME;
use crate::runlog::LOG_FILE_NAME;

/// Parameters of a sampling run, already parsed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSettings {
    /// Root of the on-disk database holding `datafile` and `summary.log`.
    pub database_directory: PathBuf,
    /// Inference run sub-directory; its name encodes the data range.
    pub inferem_directory: String,
    /// Model probability table to sample from.
    pub model_probabilities: PathBuf,
    /// Total number of machines to draw across all models.
    pub number_samples: i64,
    /// Sample from the prior instead of the posterior.
    #[serde(default)]
    pub this_is_prior: bool,
    /// Number of jobs allowed to run simultaneously.
    #[serde(default = "SampleSettings::default_nprocs")]
    pub nprocs: usize,
    /// Master seed from which per-job seeds are derived.
    #[serde(default)]
    pub seed: u64,
    /// Optional per-job timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_timeout_secs: Option<u64>,
}

impl SampleSettings {
    /// Default worker count.
    pub const fn default_nprocs() -> usize {
        4
    }

    /// Creates settings with defaults for the optional knobs.
    pub fn new(
        database_directory: impl Into<PathBuf>,
        inferem_directory: impl Into<String>,
        model_probabilities: impl Into<PathBuf>,
        number_samples: i64,
    ) -> Self {
        Self {
            database_directory: database_directory.into(),
            inferem_directory: inferem_directory.into(),
            model_probabilities: model_probabilities.into(),
            number_samples,
            this_is_prior: false,
            nprocs: Self::default_nprocs(),
            seed: 0,
            job_timeout_secs: None,
        }
    }

    /// Loads settings from a YAML document.
    pub fn from_yaml_path(path: &Path) -> Result<Self, SampleError> {
        let bytes = fs::read(path).map_err(|err| {
            SampleError::Config(
                ErrorInfo::new("settings_read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_yaml::from_slice(&bytes).map_err(|err| {
            SampleError::Config(
                ErrorInfo::new("settings_parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Checks the settings that can be verified without touching the disk.
    pub fn validate(&self) -> Result<(), SampleError> {
        let missing = |field: &str| {
            SampleError::Config(
                ErrorInfo::new("settings_missing", "required setting is empty")
                    .with_context("field", field.to_string()),
            )
        };
        if self.database_directory.as_os_str().is_empty() {
            return Err(missing("database_directory"));
        }
        if self.inferem_directory.trim().is_empty() {
            return Err(missing("inferem_directory"));
        }
        if self.model_probabilities.as_os_str().is_empty() {
            return Err(missing("model_probabilities"));
        }
        if self.nprocs == 0 {
            return Err(SampleError::Config(
                ErrorInfo::new("settings_nprocs", "worker count must be at least one")
                    .with_context("nprocs", "0"),
            ));
        }
        Ok(())
    }

    /// Path of the observed data sequence.
    pub fn data_file_path(&self) -> PathBuf {
        self.database_directory.join(DATA_FILE_NAME)
    }

    /// Path of the append-only run log.
    pub fn log_file_path(&self) -> PathBuf {
        self.database_directory.join(LOG_FILE_NAME)
    }

    /// Per-job timeout as a duration.
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Renders the settings block written at the top of every log frame.
    pub fn report(&self) -> String {
        let mut out = String::from("SETTINGS:\n");
        let timeout = self
            .job_timeout_secs
            .map(|secs| format!("{secs}s"))
            .unwrap_or_else(|| "none".to_string());
        let rows = [
            (
                "--database-directory : database root directory",
                self.database_directory.display().to_string(),
            ),
            (
                "--inferem-directory : inference run sub-directory",
                self.inferem_directory.clone(),
            ),
            (
                "--model-probabilities : model probabilities",
                self.model_probabilities.display().to_string(),
            ),
            (
                "--number-samples : number of samples to create",
                self.number_samples.to_string(),
            ),
            (
                "--this-is-prior : sampling from the prior",
                self.this_is_prior.to_string(),
            ),
            (
                "--nprocs : number of simultaneous workers",
                self.nprocs.to_string(),
            ),
            ("--seed : master seed", self.seed.to_string()),
            ("--timeout-secs : per-job timeout", timeout),
        ];
        for (label, value) in rows {
            let _ = writeln!(out, "{label} >> {value}");
        }
        out
    }
}
