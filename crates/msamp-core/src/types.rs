use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rng::RngHandle;
use crate::{DataSlice, ModelId};

/// Identifier tying a [`SampleResult`] back to the [`SampleJob`] it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(usize);

impl JobId {
    /// Creates a new identifier from its raw index.
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw index of the identifier.
    pub fn as_raw(&self) -> usize {
        self.0
    }
}

/// One unit of sampling work: draw `count` machines for `model_id`.
#[derive(Debug, Clone)]
pub struct SampleJob {
    /// Identifier used to match the result back to this job.
    pub id: JobId,
    /// Model topology to sample from.
    pub model_id: ModelId,
    /// Number of machines requested.
    pub count: u64,
    /// Seed derived for this job from the run's master seed.
    pub seed: u64,
    /// Observations conditioning the draw; `None` when sampling the prior.
    pub data: Option<Arc<DataSlice>>,
}

impl SampleJob {
    /// Returns the conditioning data, if any.
    pub fn data(&self) -> Option<&DataSlice> {
        self.data.as_deref()
    }

    /// Fresh random source seeded with this job's seed.
    pub fn rng(&self) -> RngHandle {
        RngHandle::from_seed(self.seed)
    }
}

/// A single sampled machine, opaque to the orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSample {
    /// Serialized machine description as emitted by the generator.
    pub descriptor: String,
}

impl MachineSample {
    /// Wraps a generator-provided descriptor.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }
}

/// Output of one successful generator call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedSamples {
    /// Machines produced (may be fewer than requested).
    pub machines: Vec<MachineSample>,
    /// Free-form diagnostic text reported by the generator.
    pub diagnostics: Option<String>,
}

/// Terminal state of a sampling job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    /// The generator returned normally.
    Complete,
    /// The generator failed, panicked or timed out.
    Failed,
    /// Never run: the model's quota was zero.
    NotDispatched,
}

/// Execution status of a job, mirroring the summary row it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Terminal state of the job.
    pub state: JobState,
    /// Error text captured when the job fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatus {
    /// Status of a job that returned normally.
    pub fn success() -> Self {
        Self {
            state: JobState::Complete,
            error: None,
        }
    }

    /// Status of a job that failed with the given error text.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            error: Some(error.into()),
        }
    }

    /// Returns true when the job completed.
    pub fn is_complete(&self) -> bool {
        self.state == JobState::Complete
    }
}

/// Outcome of one [`SampleJob`], owned by the orchestrator once collected.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    /// Job that produced this result.
    pub job_id: JobId,
    /// Model the job sampled.
    pub model_id: ModelId,
    /// Number of machines the job asked for.
    pub requested: u64,
    /// Machines actually produced (empty on failure).
    pub machines: Vec<MachineSample>,
    /// Diagnostic text emitted by the generator.
    pub diagnostics: Option<String>,
    /// Completion status.
    pub status: JobStatus,
    /// Wall-clock time spent in the generator.
    pub elapsed: Duration,
}

impl SampleResult {
    /// Number of machines produced.
    pub fn produced(&self) -> u64 {
        self.machines.len() as u64
    }
}
