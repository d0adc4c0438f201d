use indexmap::IndexMap;
use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_core::ModelId;
use serde::Serialize;

use crate::table::ModelProbabilityTable;

/// Number of machines to draw per model, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleQuota {
    counts: IndexMap<ModelId, u64>,
}

impl SampleQuota {
    /// Count assigned to `model` (zero for unknown models).
    pub fn get(&self, model: &ModelId) -> u64 {
        self.counts.get(model).copied().unwrap_or(0)
    }

    /// Iterates over `(model, count)` in table order, including zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (&ModelId, u64)> + '_ {
        self.counts.iter().map(|(model, &count)| (model, count))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of models that received at least one sample.
    pub fn positive_models(&self) -> usize {
        self.counts.values().filter(|&&count| count > 0).count()
    }

    /// Number of models in the quota.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true when the quota lists no models.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Apportions `total` samples across the table by largest remainder.
///
/// Every model with positive probability first receives `floor(p * total)`.
/// The units left over go one at a time to the largest fractional
/// remainders, ties resolved by table order. Models with zero probability
/// never compete for remainder units and always receive zero.
pub fn allocate(table: &ModelProbabilityTable, total: i64) -> Result<SampleQuota, SampleError> {
    let target = u64::try_from(total).map_err(|_| {
        SampleError::Value(
            ErrorInfo::new("negative_total", "sample count must be non-negative")
                .with_context("total", total.to_string()),
        )
    })?;

    let mut counts: Vec<u64> = Vec::with_capacity(table.len());
    // (table position, fractional remainder) for every positive model.
    let mut ranking: Vec<(usize, f64)> = Vec::new();
    for (idx, (_, probability)) in table.iter().enumerate() {
        if probability <= 0.0 {
            counts.push(0);
            continue;
        }
        let raw = probability * target as f64;
        let base = raw.floor();
        counts.push(base as u64);
        ranking.push((idx, raw - base));
    }
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let assigned: u64 = counts.iter().sum();
    if assigned < target {
        if ranking.is_empty() {
            return Err(SampleError::Validation(ErrorInfo::new(
                "no_positive_models",
                "table has no model with positive probability",
            )));
        }
        // Equivalent to handing out units one at a time round the ranking.
        let remaining = target - assigned;
        let rounds = remaining / ranking.len() as u64;
        let extra = (remaining % ranking.len() as u64) as usize;
        for (rank, &(idx, _)) in ranking.iter().enumerate() {
            counts[idx] += rounds + u64::from(rank < extra);
        }
    } else if assigned > target {
        // Only reachable when the table sums slightly above one. Units come
        // off the smallest remainders first.
        let mut excess = assigned - target;
        while excess > 0 {
            let holders: Vec<usize> = ranking
                .iter()
                .rev()
                .map(|&(idx, _)| idx)
                .filter(|&idx| counts[idx] > 0)
                .collect();
            let share = excess / holders.len() as u64;
            if share == 0 {
                for &idx in holders.iter().take(excess as usize) {
                    counts[idx] -= 1;
                }
                excess = 0;
            } else {
                for &idx in &holders {
                    let taken = share.min(counts[idx]);
                    counts[idx] -= taken;
                    excess -= taken;
                }
            }
        }
    }

    let counts = table
        .iter()
        .zip(counts)
        .map(|((model, _), count)| (model.clone(), count))
        .collect();
    Ok(SampleQuota { counts })
}
