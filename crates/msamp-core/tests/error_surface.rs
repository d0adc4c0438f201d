use msamp_core::errors::{ErrorInfo, SampleError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("path", "db/model_probs.txt")
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = SampleError::Config(sample_info("range_name", "missing data range"));
    assert_eq!(err.info().code, "range_name");
    assert!(err.info().context.contains_key("path"));
    assert!(err.is_fatal());
}

#[test]
fn format_and_validation_errors_are_fatal() {
    let format = SampleError::Format(sample_info("table_line", "bad pair"));
    let validation = SampleError::Validation(sample_info("table_sum", "sum is 0.9"));
    assert!(format.is_fatal());
    assert!(validation.is_fatal());
    assert_eq!(validation.info().message, "sum is 0.9");
}

#[test]
fn range_and_value_errors_are_fatal() {
    assert!(SampleError::Range(sample_info("slice_bounds", "upper past end")).is_fatal());
    assert!(SampleError::Value(sample_info("negative_total", "-1")).is_fatal());
    assert!(SampleError::NotFound(sample_info("table_missing", "absent")).is_fatal());
}

#[test]
fn job_error_is_recoverable() {
    let err = SampleError::Job(sample_info("generator_exit", "exit status 3"));
    assert!(!err.is_fatal());
}

#[test]
fn display_includes_context_and_hint() {
    let err = SampleError::Config(
        ErrorInfo::new("range_name", "bad name")
            .with_context("name", "run1")
            .with_hint("expected <label>_<lower>-<upper>"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("config error: bad name (code: range_name)"));
    assert!(rendered.contains("name=run1"));
    assert!(rendered.contains("hint: expected <label>_<lower>-<upper>"));
}
