//! Where a run summary came from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Layout version of a serialized run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when fields are removed or change meaning.
    pub major: u32,
    /// Bumped when fields are added.
    pub minor: u32,
}

impl SchemaVersion {
    /// Layout written by this release.
    pub const CURRENT: Self = Self { major: 1, minor: 0 };
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Inputs and tooling behind one sampling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProvenance {
    /// Hash of the model probability table.
    pub table_hash: String,
    /// Hash of the data window; absent when sampling the prior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    /// Master seed the per-job seeds were derived from.
    pub seed: u64,
    /// RFC 3339 timestamp taken when the summary was assembled.
    pub created_at: String,
    /// Crate name to version.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Starts a record for a prior run; see [`RunProvenance::with_data_hash`].
    pub fn new(table_hash: impl Into<String>, seed: u64, created_at: impl Into<String>) -> Self {
        Self {
            table_hash: table_hash.into(),
            data_hash: None,
            seed,
            created_at: created_at.into(),
            tool_versions: BTreeMap::new(),
        }
    }

    /// Records the hash of the conditioning data.
    pub fn with_data_hash(mut self, hash: impl Into<String>) -> Self {
        self.data_hash = Some(hash.into());
        self
    }

    /// Records the version of a tool that took part in the run.
    pub fn with_tool(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.tool_versions.insert(name.into(), version.into());
        self
    }
}
