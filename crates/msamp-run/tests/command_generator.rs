#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use msamp_core::{DataSlice, JobId, MachineGenerator, ModelId, SampleError, SampleJob};
use msamp_run::command::MODE_ENV;
use msamp_run::{run_jobs, CommandGenerator};

fn job(model: &str, count: u64, data: Option<Arc<DataSlice>>) -> SampleJob {
    SampleJob {
        id: JobId::from_raw(0),
        model_id: ModelId::new(model),
        count,
        seed: 42,
        data,
    }
}

fn shell(script: &str) -> CommandGenerator {
    // `sh -c script name` binds the per-job arguments to $1 (model), $2 (count), $3 (seed).
    CommandGenerator::new("sh").with_args(["-c", script, "msamp-generator"])
}

#[test]
fn stdout_lines_become_machines() {
    let generator = shell(
        r#"i=0; while [ "$i" -lt "$2" ]; do echo "$1 seed=$3 n=$i"; i=$((i+1)); done; echo "mode=$MSAMP_MODE" >&2"#,
    );
    let out = generator
        .generate_samples(&job("n2_k2_id5", 3, None))
        .expect("generate");
    let machines: Vec<&str> = out.machines.iter().map(|m| m.descriptor.as_str()).collect();
    assert_eq!(
        machines,
        vec![
            "n2_k2_id5 seed=42 n=0",
            "n2_k2_id5 seed=42 n=1",
            "n2_k2_id5 seed=42 n=2"
        ]
    );
    assert_eq!(out.diagnostics.as_deref(), Some("mode=prior"));
    assert_eq!(MODE_ENV, "MSAMP_MODE");
}

#[test]
fn posterior_observations_arrive_on_stdin() {
    let generator = shell(r#"n=$(wc -l | tr -d ' '); echo "$MSAMP_MODE $n""#);
    let data = Arc::new(
        DataSlice::new(0, 4, vec!["0".into(), "1".into(), "1".into(), "0".into()])
            .expect("slice"),
    );
    let out = generator
        .generate_samples(&job("A", 1, Some(data)))
        .expect("generate");
    assert_eq!(out.machines.len(), 1);
    assert_eq!(out.machines[0].descriptor, "posterior 4");
}

#[test]
fn non_zero_exit_is_a_job_error_with_stderr() {
    let generator = shell(r#"echo "topology $1 is invalid" >&2; exit 3"#);
    let err = generator
        .generate_samples(&job("bad", 2, None))
        .unwrap_err();
    assert!(matches!(err, SampleError::Job(_)));
    assert_eq!(err.info().code, "generator_exit");
    assert!(err.info().message.contains("topology bad is invalid"));
    assert_eq!(err.info().context.get("model").map(String::as_str), Some("bad"));
}

#[test]
fn missing_program_is_a_job_error() {
    let generator = CommandGenerator::new("/nonexistent/msamp-generator");
    let err = generator.generate_samples(&job("A", 1, None)).unwrap_err();
    assert_eq!(err.info().code, "generator_spawn");
    assert!(!err.is_fatal());
}

#[test]
fn hung_job_times_out_without_blocking_siblings() {
    let generator = shell(r#"if [ "$1" = "slow" ]; then exec sleep 30; fi; echo "$1""#)
        .with_timeout(Some(Duration::from_millis(300)));
    let jobs = ["fast-a", "slow", "fast-b"]
        .iter()
        .enumerate()
        .map(|(idx, model)| SampleJob {
            id: JobId::from_raw(idx),
            ..job(model, 1, None)
        })
        .collect();
    let start = Instant::now();
    let results = run_jobs(jobs, 3, &generator).expect("run");
    assert!(start.elapsed() < Duration::from_secs(20));

    assert!(results[0].status.is_complete());
    assert_eq!(results[0].machines[0].descriptor, "fast-a");
    assert!(results[2].status.is_complete());
    let slow = &results[1];
    assert!(!slow.status.is_complete());
    assert!(slow
        .status
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("timed out"));
}

#[test]
fn timeout_reaches_processes_spawned_by_the_generator() {
    // `sleep` runs as a grandchild here, holding stdout after `sh` is killed.
    let generator = shell("sleep 30; echo late").with_timeout(Some(Duration::from_millis(300)));
    let start = Instant::now();
    let err = generator
        .generate_samples(&job("A", 1, None))
        .unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(err.info().code, "generator_timeout");
    assert!(!err.is_fatal());
}
