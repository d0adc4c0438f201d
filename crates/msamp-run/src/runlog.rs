use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use msamp_core::errors::{ErrorInfo, SampleError};

/// File name of the run log inside the database directory.
pub const LOG_FILE_NAME: &str = "summary.log";
/// First line of every frame.
pub const START_MARKER: &str = "*** start: generating machine samples ***";
/// Last line of every frame.
pub const END_MARKER: &str = "*** end: generating machine samples ***";

/// Renders one log frame: start marker, settings, blank line, summary, end marker.
pub fn render_frame(header_text: &str, summary_text: &str) -> String {
    format!("\n{START_MARKER}\n\n{header_text}\n{summary_text}\n{END_MARKER}\n")
}

/// Appends a frame to `log_path`, creating the file if needed.
///
/// The handle is opened in append mode and dropped before returning, so
/// existing content is never truncated.
pub fn append(log_path: &Path, header_text: &str, summary_text: &str) -> Result<(), SampleError> {
    let io_error = |code: &str, err: std::io::Error| {
        SampleError::Io(
            ErrorInfo::new(code, err.to_string())
                .with_context("path", log_path.display().to_string()),
        )
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|err| io_error("log_open", err))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render_frame(header_text, summary_text).as_bytes())
        .map_err(|err| io_error("log_write", err))?;
    writer.flush().map_err(|err| io_error("log_flush", err))
}
