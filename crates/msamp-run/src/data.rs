use std::fs;
use std::io;
use std::path::Path;

use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_core::DataSlice;

/// File name of the observed sequence inside the database directory.
pub const DATA_FILE_NAME: &str = "datafile";

const RANGE_HINT: &str = "expected a run directory named `<label>_<lower>-<upper>`";

/// Reads the full observed sequence from `path`.
pub fn load(path: &Path) -> Result<Vec<String>, SampleError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        let info = ErrorInfo::new("data_read", err.to_string())
            .with_context("path", path.display().to_string());
        if err.kind() == io::ErrorKind::NotFound {
            SampleError::NotFound(info)
        } else {
            SampleError::Io(info)
        }
    })?;
    Ok(parse_observations(&contents))
}

/// Splits a data file into observations.
///
/// Observations are separated by whitespace or commas. A file holding a
/// single unseparated token is a symbol string and yields one observation
/// per character. Lines starting with `#` are ignored.
pub fn parse_observations(contents: &str) -> Vec<String> {
    let tokens: Vec<&str> = contents
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || c == ','))
        .filter(|token| !token.is_empty())
        .collect();
    match tokens.as_slice() {
        [symbols] => symbols.chars().map(String::from).collect(),
        _ => tokens.into_iter().map(String::from).collect(),
    }
}

/// Cuts the half-open window `[lower, upper)` out of `full`.
pub fn slice(full: &[String], lower: usize, upper: usize) -> Result<DataSlice, SampleError> {
    if lower > upper || upper > full.len() {
        return Err(SampleError::Range(
            ErrorInfo::new("slice_bounds", "data range outside the observed sequence")
                .with_context("lower", lower.to_string())
                .with_context("upper", upper.to_string())
                .with_context("len", full.len().to_string()),
        ));
    }
    DataSlice::new(lower, upper, full[lower..upper].to_vec())
}

/// Extracts `(lower, upper)` from an inference run directory name.
///
/// Only the last path component is considered. It is split on `_` and the
/// second field must read `<lower>-<upper>`, e.g. `em_100-2100`.
pub fn parse_range_name(name: &str) -> Result<(usize, usize), SampleError> {
    let trimmed = name.trim_end_matches(['/', '\\']);
    let name = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let config_error = |message: &str| {
        SampleError::Config(
            ErrorInfo::new("range_name", message)
                .with_context("name", name.to_string())
                .with_hint(RANGE_HINT),
        )
    };
    let field = name
        .split('_')
        .nth(1)
        .ok_or_else(|| config_error("no data range after `_`"))?;
    let (lower, upper) = field
        .split_once('-')
        .ok_or_else(|| config_error("data range is not `<lower>-<upper>`"))?;
    let lower = lower
        .parse::<usize>()
        .map_err(|_| config_error("lower bound is not an unsigned integer"))?;
    let upper = upper
        .parse::<usize>()
        .map_err(|_| config_error("upper bound is not an unsigned integer"))?;
    Ok((lower, upper))
}
