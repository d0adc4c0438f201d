use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_core::provenance::RunProvenance;
use msamp_core::{derive_substream_seed, DataSlice, JobId, MachineGenerator, SampleJob};
use tracing::{error, info};

use crate::allocate::{allocate, SampleQuota};
use crate::config::SampleSettings;
use crate::data;
use crate::canonical::{digest, DATA_DOMAIN};
use crate::pool::WorkerPool;
use crate::runlog;
use crate::summary::{ModeSummary, RunSummary, SummaryBuilder};
use crate::table::{self, ModelProbabilityTable};

/// Where the orchestrator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Settings accepted, nothing loaded yet.
    Configured,
    /// Probability table loaded, quota being computed.
    Allocating,
    /// Jobs handed to the worker pool.
    Dispatching,
    /// Pool returned, results being folded into the summary.
    Aggregating,
    /// Summary built and logged.
    Done,
    /// A fatal error stopped the run.
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Configured => "configured",
            RunState::Allocating => "allocating",
            RunState::Dispatching => "dispatching",
            RunState::Aggregating => "aggregating",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Prior or posterior sampling, chosen once per run.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingMode {
    /// No conditioning data.
    Prior,
    /// Every job is conditioned on the same read-only data window.
    Posterior {
        /// Shared data window.
        data: Arc<DataSlice>,
    },
}

impl SamplingMode {
    /// Resolves the mode from the settings, loading the data window for the
    /// posterior.
    ///
    /// The window comes from the run directory name and is cut out of
    /// `<database_directory>/datafile`.
    pub fn resolve(settings: &SampleSettings) -> Result<Self, SampleError> {
        if settings.this_is_prior {
            return Ok(SamplingMode::Prior);
        }
        let (lower, upper) = data::parse_range_name(&settings.inferem_directory)?;
        let full = data::load(&settings.data_file_path())?;
        let slice = data::slice(&full, lower, upper)?;
        Ok(SamplingMode::Posterior {
            data: Arc::new(slice),
        })
    }

    /// Shared data window in posterior mode.
    pub fn data(&self) -> Option<&Arc<DataSlice>> {
        match self {
            SamplingMode::Prior => None,
            SamplingMode::Posterior { data } => Some(data),
        }
    }

    fn summary(&self) -> ModeSummary {
        match self {
            SamplingMode::Prior => ModeSummary::Prior,
            SamplingMode::Posterior { data } => ModeSummary::Posterior {
                lower: data.lower(),
                upper: data.upper(),
            },
        }
    }
}

/// Header and summary produced by a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Settings block written to the log.
    pub header: String,
    /// Final summary.
    pub summary: RunSummary,
}

/// Drives one sampling run from settings to logged summary.
pub struct SampleOrchestrator<G> {
    settings: SampleSettings,
    generator: G,
    state: RunState,
    history: Vec<RunState>,
}

impl<G> fmt::Debug for SampleOrchestrator<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleOrchestrator")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<G: MachineGenerator> SampleOrchestrator<G> {
    /// Creates an orchestrator in the `Configured` state.
    pub fn new(settings: SampleSettings, generator: G) -> Self {
        Self {
            settings,
            generator,
            state: RunState::Configured,
            history: vec![RunState::Configured],
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state visited so far, in order.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Settings driving this run.
    pub fn settings(&self) -> &SampleSettings {
        &self.settings
    }

    /// Executes the run.
    ///
    /// Fatal input errors move the orchestrator to `Failed` and are returned
    /// before any job is dispatched; no log frame is written in that case.
    /// Failed jobs are not fatal and show up in the summary instead.
    pub fn run(&mut self) -> Result<RunOutcome, SampleError> {
        if self.state != RunState::Configured {
            return Err(SampleError::Config(
                ErrorInfo::new("orchestrator_reuse", "orchestrator has already run")
                    .with_context("state", self.state.to_string()),
            ));
        }
        match self.execute() {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(stage = %self.state, %err, "sampling run failed");
                self.transition(RunState::Failed);
                Err(err)
            }
        }
    }

    fn execute(&mut self) -> Result<RunOutcome, SampleError> {
        self.settings.validate()?;
        let mode = SamplingMode::resolve(&self.settings)?;

        self.transition(RunState::Allocating);
        let table = table::load(&self.settings.model_probabilities)?;
        let quota = allocate(&table, self.settings.number_samples)?;
        let requested = self.settings.number_samples.unsigned_abs();
        if quota.total() != requested {
            return Err(SampleError::Validation(
                ErrorInfo::new("quota_sum", "allocated counts do not add up")
                    .with_context("allocated", quota.total().to_string())
                    .with_context("requested", requested.to_string()),
            ));
        }
        let pool = WorkerPool::new(self.settings.nprocs)?;
        let jobs = build_jobs(&table, &quota, &mode, self.settings.seed);

        self.transition(RunState::Dispatching);
        info!(
            jobs = jobs.len(),
            workers = pool.max_workers(),
            samples = requested,
            "dispatching sampling jobs"
        );
        let results = pool.run(jobs, &self.generator);

        self.transition(RunState::Aggregating);
        let provenance = provenance(&table, &mode, self.settings.seed)?;
        let mut builder = SummaryBuilder::new(&table, &quota, mode.summary(), provenance);
        for result in results {
            builder.record(result);
        }
        let summary = builder.finish();
        info!(
            produced = summary.total_produced,
            requested = summary.total_requested,
            failed = summary.failed_jobs,
            "sampling jobs collected"
        );

        let header = self.settings.report();
        runlog::append(&self.settings.log_file_path(), &header, &summary.render())?;
        self.transition(RunState::Done);
        Ok(RunOutcome { header, summary })
    }

    fn transition(&mut self, next: RunState) {
        info!(from = %self.state, to = %next, "orchestrator transition");
        self.state = next;
        self.history.push(next);
    }
}

/// One job per model with a positive quota, in table order.
///
/// Each job's seed is derived from the master seed and the model's table
/// position, so it does not depend on which other models were dispatched.
pub fn build_jobs(
    table: &ModelProbabilityTable,
    quota: &SampleQuota,
    mode: &SamplingMode,
    master_seed: u64,
) -> Vec<SampleJob> {
    table
        .iter()
        .enumerate()
        .filter_map(|(position, (model, _))| {
            let count = quota.get(model);
            (count > 0).then(|| (position, model.clone(), count))
        })
        .enumerate()
        .map(|(idx, (position, model_id, count))| SampleJob {
            id: JobId::from_raw(idx),
            model_id,
            count,
            seed: derive_substream_seed(master_seed, position as u64),
            data: mode.data().cloned(),
        })
        .collect()
}

fn provenance(
    table: &ModelProbabilityTable,
    mode: &SamplingMode,
    seed: u64,
) -> Result<RunProvenance, SampleError> {
    let mut provenance = RunProvenance::new(table.table_hash()?, seed, Utc::now().to_rfc3339())
        .with_tool("msamp-run", env!("CARGO_PKG_VERSION"));
    if let Some(data) = mode.data() {
        provenance = provenance.with_data_hash(digest(DATA_DOMAIN, data.as_ref())?);
    }
    Ok(provenance)
}
