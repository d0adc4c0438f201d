#![deny(missing_docs)]
#![doc = "Core traits and data types for the msamp machine sampler."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod provenance;
pub mod rng;
mod types;

pub use errors::{ErrorInfo, SampleError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{
    GeneratedSamples, JobId, JobState, JobStatus, MachineSample, SampleJob, SampleResult,
};

/// Opaque identifier of a model topology.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Creates an identifier from its textual form.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the textual form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Contiguous window `[lower, upper)` of an observed data sequence.
///
/// Only built through [`DataSlice::new`], so `observations.len()` always
/// equals `upper - lower`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSlice {
    lower: usize,
    upper: usize,
    observations: Vec<String>,
}

impl DataSlice {
    /// Builds a slice from already-cut observations and the bounds they came from.
    ///
    /// `Range` error when `lower > upper` or the observation count is not
    /// `upper - lower`.
    pub fn new(lower: usize, upper: usize, observations: Vec<String>) -> Result<Self, SampleError> {
        if lower > upper || upper - lower != observations.len() {
            return Err(SampleError::Range(
                ErrorInfo::new("slice_shape", "observations do not match the slice bounds")
                    .with_context("lower", lower.to_string())
                    .with_context("upper", upper.to_string())
                    .with_context("observations", observations.len().to_string()),
            ));
        }
        Ok(Self {
            lower,
            upper,
            observations,
        })
    }

    /// Inclusive lower bound within the full sequence.
    pub fn lower(&self) -> usize {
        self.lower
    }

    /// Exclusive upper bound within the full sequence.
    pub fn upper(&self) -> usize {
        self.upper
    }

    /// Observations in order.
    pub fn observations(&self) -> &[String] {
        &self.observations
    }

    /// Number of observations in the slice.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns true when the slice holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Externally supplied routine that draws machines for a single model.
///
/// Implementations must be shareable across pool workers. A returned error
/// (or a panic) only fails the job that triggered it.
pub trait MachineGenerator: Send + Sync {
    /// Draws `job.count` machines for `job.model_id`, conditioned on
    /// `job.data()` when present.
    fn generate_samples(&self, job: &SampleJob) -> Result<GeneratedSamples, SampleError>;
}

impl<F> MachineGenerator for F
where
    F: Fn(&SampleJob) -> Result<GeneratedSamples, SampleError> + Send + Sync,
{
    fn generate_samples(&self, job: &SampleJob) -> Result<GeneratedSamples, SampleError> {
        self(job)
    }
}
