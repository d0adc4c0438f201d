use std::collections::BTreeMap;
use std::fmt::Write as _;

use msamp_core::provenance::{RunProvenance, SchemaVersion};
use msamp_core::{JobState, ModelId, SampleResult};
use serde::{Deserialize, Serialize};

use crate::allocate::SampleQuota;
use crate::table::ModelProbabilityTable;

/// Sampling mode as recorded in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModeSummary {
    /// Machines drawn from the prior.
    Prior,
    /// Machines drawn from the posterior given `[lower, upper)` of the data.
    Posterior {
        /// Inclusive lower bound of the data window.
        lower: usize,
        /// Exclusive upper bound of the data window.
        upper: usize,
    },
}

/// Per-model row of the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model the row describes.
    pub model_id: ModelId,
    /// Probability mass from the table.
    pub probability: f64,
    /// Machines requested by the allocator.
    pub requested: u64,
    /// Machines the generator actually produced.
    pub produced: u64,
    /// Terminal job state.
    pub state: JobState,
    /// Error text for failed jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Diagnostic text emitted by the generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    /// Wall-clock time spent in the generator.
    pub elapsed_ms: u64,
}

/// Immutable report of one sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version of the serialized summary.
    pub schema_version: SchemaVersion,
    /// Prior or posterior, with the data window.
    pub mode: ModeSummary,
    /// Models listed in the probability table.
    pub models_in_table: usize,
    /// Models whose quota was zero and were not dispatched.
    pub zero_quota_models: usize,
    /// Sum of requested machines.
    pub total_requested: u64,
    /// Sum of produced machines.
    pub total_produced: u64,
    /// Number of failed jobs.
    pub failed_jobs: usize,
    /// One row per table model in table order, zero-quota models included.
    pub models: Vec<ModelSummary>,
    /// Provenance of the run.
    pub provenance: RunProvenance,
}

impl RunSummary {
    /// True when some model produced fewer machines than requested.
    pub fn is_partial(&self) -> bool {
        self.models.iter().any(|row| row.produced < row.requested)
    }

    /// Renders the human readable summary printed and logged for a run.
    pub fn render(&self) -> String {
        let mut out = String::from("SUMMARY:\n");
        let mode = match &self.mode {
            ModeSummary::Prior => "prior".to_string(),
            ModeSummary::Posterior { lower, upper } => {
                format!("posterior, data [{lower}, {upper})")
            }
        };
        let _ = writeln!(out, "mode >> {mode}");
        let _ = writeln!(out, "models in table >> {}", self.models_in_table);
        let _ = writeln!(
            out,
            "models sampled >> {} ({} with zero quota)",
            self.models.len() - self.zero_quota_models,
            self.zero_quota_models
        );
        let _ = writeln!(out, "samples requested >> {}", self.total_requested);
        let _ = writeln!(out, "samples produced >> {}", self.total_produced);
        let _ = writeln!(out, "failed jobs >> {}", self.failed_jobs);

        if !self.models.is_empty() {
            let width = self
                .models
                .iter()
                .map(|row| row.model_id.as_str().len())
                .max()
                .unwrap_or(0)
                .max("model".len());
            out.push('\n');
            let _ = writeln!(
                out,
                "{:<width$}  {:>11}  {:>9}  {:>8}  status",
                "model", "probability", "requested", "produced"
            );
            for row in &self.models {
                let status = match row.state {
                    JobState::Failed => "failed",
                    JobState::Complete if row.produced < row.requested => "partial",
                    JobState::Complete => "complete",
                    JobState::NotDispatched => "not dispatched",
                };
                let _ = writeln!(
                    out,
                    "{:<width$}  {:>11.6}  {:>9}  {:>8}  {status}",
                    row.model_id.as_str(),
                    row.probability,
                    row.requested,
                    row.produced
                );
            }
        }

        let errors: Vec<_> = self
            .models
            .iter()
            .filter_map(|row| row.error.as_ref().map(|err| (&row.model_id, err)))
            .collect();
        if !errors.is_empty() {
            out.push_str("\nERRORS:\n");
            for (model, err) in errors {
                let _ = writeln!(out, "{model} >> {err}");
            }
        }

        let diagnostics: Vec<_> = self
            .models
            .iter()
            .filter_map(|row| row.diagnostics.as_ref().map(|text| (&row.model_id, text)))
            .collect();
        if !diagnostics.is_empty() {
            out.push_str("\nDIAGNOSTICS:\n");
            for (model, text) in diagnostics {
                let _ = writeln!(out, "{model} >> {text}");
            }
        }
        out
    }
}

/// Accumulates job results into a [`RunSummary`].
#[derive(Debug)]
pub struct SummaryBuilder<'a> {
    table: &'a ModelProbabilityTable,
    quota: &'a SampleQuota,
    mode: ModeSummary,
    provenance: RunProvenance,
    rows: BTreeMap<usize, ModelSummary>,
}

impl<'a> SummaryBuilder<'a> {
    /// Starts a summary holding a not-dispatched row per zero-quota model.
    pub fn new(
        table: &'a ModelProbabilityTable,
        quota: &'a SampleQuota,
        mode: ModeSummary,
        provenance: RunProvenance,
    ) -> Self {
        let rows = table
            .iter()
            .enumerate()
            .filter(|(_, (model, _))| quota.get(model) == 0)
            .map(|(position, (model, probability))| {
                let row = ModelSummary {
                    model_id: model.clone(),
                    probability,
                    requested: 0,
                    produced: 0,
                    state: JobState::NotDispatched,
                    error: None,
                    diagnostics: None,
                    elapsed_ms: 0,
                };
                (position, row)
            })
            .collect();
        Self {
            table,
            quota,
            mode,
            provenance,
            rows,
        }
    }

    /// Folds one job result into the summary.
    pub fn record(&mut self, result: SampleResult) {
        let position = self
            .table
            .position(&result.model_id)
            .unwrap_or(self.table.len() + self.rows.len());
        let produced = result.produced();
        let row = ModelSummary {
            probability: self.table.probability(&result.model_id).unwrap_or(0.0),
            requested: result.requested,
            produced,
            state: result.status.state,
            error: result.status.error,
            diagnostics: result.diagnostics,
            elapsed_ms: result.elapsed.as_millis() as u64,
            model_id: result.model_id,
        };
        self.rows.insert(position, row);
    }

    /// Finalizes the summary; rows follow table order.
    pub fn finish(self) -> RunSummary {
        let models: Vec<ModelSummary> = self.rows.into_values().collect();
        let total_requested = models.iter().map(|row| row.requested).sum();
        let total_produced = models.iter().map(|row| row.produced).sum();
        let failed_jobs = models
            .iter()
            .filter(|row| row.state == JobState::Failed)
            .count();
        RunSummary {
            schema_version: SchemaVersion::default(),
            mode: self.mode,
            models_in_table: self.table.len(),
            zero_quota_models: self.quota.len() - self.quota.positive_models(),
            total_requested,
            total_produced,
            failed_jobs,
            models,
            provenance: self.provenance,
        }
    }
}
