use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_core::ModelId;
use serde::Deserialize;

use crate::canonical::{digest, TABLE_DOMAIN};

/// Maximum distance between the probability sum and one.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Ordered mapping from model identifier to probability mass.
///
/// Iteration follows the order in which models were read, which is also the
/// tie-break order used by the allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProbabilityTable {
    entries: IndexMap<ModelId, f64>,
}

impl ModelProbabilityTable {
    /// Builds a validated table from `(model, probability)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, SampleError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<ModelId>,
    {
        let mut entries = IndexMap::new();
        for (model, probability) in pairs {
            let model = model.into();
            if entries.contains_key(&model) {
                return Err(SampleError::Format(
                    ErrorInfo::new("table_duplicate", "model listed more than once")
                        .with_context("model", model.to_string()),
                ));
            }
            entries.insert(model, probability);
        }
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), SampleError> {
        for (model, &probability) in &self.entries {
            if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
                return Err(SampleError::Validation(
                    ErrorInfo::new("table_probability", "probability outside [0, 1]")
                        .with_context("model", model.to_string())
                        .with_context("probability", probability.to_string()),
                ));
            }
        }
        let sum = self.total_mass();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(SampleError::Validation(
                ErrorInfo::new("table_sum", "probabilities do not sum to one")
                    .with_context("sum", format!("{sum:.9}"))
                    .with_context("models", self.entries.len().to_string())
                    .with_hint("renormalise the table before sampling"),
            ));
        }
        Ok(())
    }

    /// Number of models in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table lists no models.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(model, probability)` in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModelId, f64)> + '_ {
        self.entries.iter().map(|(model, &p)| (model, p))
    }

    /// Probability assigned to `model`, if listed.
    pub fn probability(&self, model: &ModelId) -> Option<f64> {
        self.entries.get(model).copied()
    }

    /// Position of `model` in table order.
    pub fn position(&self, model: &ModelId) -> Option<usize> {
        self.entries.get_index_of(model)
    }

    /// Sum of all probabilities.
    pub fn total_mass(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Stable content hash used for run provenance.
    pub fn table_hash(&self) -> Result<String, SampleError> {
        let pairs: Vec<(&str, f64)> = self
            .entries
            .iter()
            .map(|(model, &p)| (model.as_str(), p))
            .collect();
        digest(TABLE_DOMAIN, &pairs)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableDocument {
    Object(IndexMap<String, f64>),
    Pairs(Vec<(String, f64)>),
}

/// Loads a model probability table from disk.
///
/// Files with a `.json` extension hold either an object keyed by model or an
/// array of `[model, probability]` pairs. Anything else is read as text with
/// one pair per line.
pub fn load(path: &Path) -> Result<ModelProbabilityTable, SampleError> {
    let bytes = fs::read(path).map_err(|err| read_error(path, err))?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let result = if is_json {
        let document: TableDocument = serde_json::from_slice(&bytes).map_err(|err| {
            SampleError::Format(
                ErrorInfo::new("table_json", err.to_string())
                    .with_hint("expected an object of probabilities or a list of pairs"),
            )
        })?;
        match document {
            TableDocument::Object(map) => ModelProbabilityTable::from_pairs(map),
            TableDocument::Pairs(pairs) => ModelProbabilityTable::from_pairs(pairs),
        }
    } else {
        let contents = String::from_utf8(bytes).map_err(|err| {
            SampleError::Format(ErrorInfo::new("table_utf8", err.to_string()))
        })?;
        parse_text(&contents).and_then(ModelProbabilityTable::from_pairs)
    };
    result.map_err(|err| with_path(err, path))
}

/// Parses the text table format into raw pairs without validating the sum.
///
/// Each non-blank line holds a model identifier followed by its probability,
/// separated by whitespace or a comma. `#` starts a comment.
pub fn parse_text(contents: &str) -> Result<Vec<(String, f64)>, SampleError> {
    let mut pairs = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = match raw_line.split_once('#') {
            Some((before, _)) => before,
            None => raw_line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let line_error = |message: &str| {
            SampleError::Format(
                ErrorInfo::new("table_line", message)
                    .with_context("line", (idx + 1).to_string())
                    .with_context("content", raw_line.trim().to_string()),
            )
        };
        let (model, probability) = line
            .rsplit_once(|c: char| c.is_whitespace() || c == ',')
            .ok_or_else(|| line_error("expected `<model> <probability>`"))?;
        let model = model.trim().trim_end_matches(',').trim();
        if model.is_empty() {
            return Err(line_error("missing model identifier"));
        }
        let probability: f64 = probability
            .trim()
            .parse()
            .map_err(|_| line_error("probability is not a number"))?;
        pairs.push((model.to_string(), probability));
    }
    Ok(pairs)
}

fn read_error(path: &Path, err: io::Error) -> SampleError {
    let info = ErrorInfo::new("table_read", err.to_string())
        .with_context("path", path.display().to_string());
    if err.kind() == io::ErrorKind::NotFound {
        SampleError::NotFound(info)
    } else {
        SampleError::Io(info)
    }
}

fn with_path(err: SampleError, path: &Path) -> SampleError {
    let path = path.display().to_string();
    match err {
        SampleError::Format(info) => SampleError::Format(info.with_context("path", path)),
        SampleError::Validation(info) => SampleError::Validation(info.with_context("path", path)),
        other => other,
    }
}
