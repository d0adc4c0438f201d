use msamp_core::errors::{ErrorInfo, SampleError};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Digest label of the model probability table.
pub const TABLE_DOMAIN: &str = "msamp/table/v1";
/// Digest label of a posterior data window.
pub const DATA_DOMAIN: &str = "msamp/data/v1";

/// Compact JSON with every object's keys in sorted order.
///
/// Field order of the Rust type and the order of any `IndexMap` keys do not
/// leak into the bytes.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SampleError> {
    let mut tree = serde_json::to_value(value).map_err(|err| {
        SampleError::Format(ErrorInfo::new("json_encode", err.to_string()))
    })?;
    tree.sort_all_objects();
    serde_json::to_vec(&tree)
        .map_err(|err| SampleError::Format(ErrorInfo::new("json_encode", err.to_string())))
}

/// Hex SHA-256 of `domain`, a NUL byte and the canonical JSON of `value`.
///
/// The label keeps a table and a data window with the same JSON apart.
pub fn digest<T: Serialize + ?Sized>(domain: &str, value: &T) -> Result<String, SampleError> {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update([0u8]);
    hasher.update(to_json_bytes(value)?);
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}
