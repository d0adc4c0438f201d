#![deny(missing_docs)]
#![doc = "Allocation, dispatch and logging of machine sampling runs."]

/// Sample allocation by largest remainder.
pub mod allocate;
/// Sorted-key JSON and domain-labelled digests.
pub mod canonical;
/// Process-backed machine generator.
pub mod command;
/// Run settings and the settings report.
pub mod config;
/// Observed data loading and range slicing.
pub mod data;
/// Run state machine and job construction.
pub mod orchestrate;
/// Bounded worker pool.
pub mod pool;
/// Append-only run log.
pub mod runlog;
/// Run summary assembly and rendering.
pub mod summary;
/// Model probability table loading.
pub mod table;

pub use allocate::{allocate, SampleQuota};
pub use command::CommandGenerator;
pub use config::SampleSettings;
pub use orchestrate::{build_jobs, RunOutcome, RunState, SampleOrchestrator, SamplingMode};
pub use pool::{run_jobs, WorkerPool};
pub use summary::{ModeSummary, ModelSummary, RunSummary, SummaryBuilder};
pub use table::{ModelProbabilityTable, SUM_TOLERANCE};
