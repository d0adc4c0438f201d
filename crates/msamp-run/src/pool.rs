use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_core::{JobStatus, MachineGenerator, SampleJob, SampleResult};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Bounded pool executing sampling jobs concurrently.
///
/// Backed by a dedicated rayon pool with exactly `max_workers` threads, so
/// no more than `max_workers` generator calls are in flight at once and the
/// remaining jobs wait in the pool's queue.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    max_workers: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Creates a pool with `max_workers` worker threads.
    pub fn new(max_workers: usize) -> Result<Self, SampleError> {
        if max_workers == 0 {
            return Err(SampleError::Config(
                ErrorInfo::new("pool_size", "worker count must be at least one")
                    .with_context("max_workers", "0"),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|idx| format!("msamp-worker-{idx}"))
            .build()
            .map_err(|err| SampleError::Io(ErrorInfo::new("thread_pool", err.to_string())))?;
        Ok(Self { pool, max_workers })
    }

    /// Maximum number of concurrently running jobs.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Runs every job and returns one result per job, ordered by job id.
    ///
    /// Blocks until all jobs finish. A job whose generator errors or panics
    /// yields a failed result; it never aborts the other jobs.
    pub fn run<G>(&self, jobs: Vec<SampleJob>, generator: &G) -> Vec<SampleResult>
    where
        G: MachineGenerator + ?Sized,
    {
        let mut results: Vec<SampleResult> = self.pool.install(|| {
            jobs.into_par_iter()
                .map(|job| execute(job, generator))
                .collect()
        });
        results.sort_by_key(|result| result.job_id);
        results
    }
}

/// Convenience wrapper building a pool of `max_workers` and running `jobs`.
pub fn run_jobs<G>(
    jobs: Vec<SampleJob>,
    max_workers: usize,
    generator: &G,
) -> Result<Vec<SampleResult>, SampleError>
where
    G: MachineGenerator + ?Sized,
{
    let pool = WorkerPool::new(max_workers)?;
    Ok(pool.run(jobs, generator))
}

fn execute<G>(job: SampleJob, generator: &G) -> SampleResult
where
    G: MachineGenerator + ?Sized,
{
    debug!(job = job.id.as_raw(), model = %job.model_id, count = job.count, "job started");
    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| generator.generate_samples(&job)));
    let elapsed = start.elapsed();
    let (machines, diagnostics, status) = match outcome {
        Ok(Ok(generated)) => (
            generated.machines,
            generated.diagnostics,
            JobStatus::success(),
        ),
        Ok(Err(err)) => (Vec::new(), None, JobStatus::failed(err.to_string())),
        Err(payload) => (
            Vec::new(),
            None,
            JobStatus::failed(format!("generator panicked: {}", panic_message(&*payload))),
        ),
    };
    if let Some(error) = &status.error {
        warn!(job = job.id.as_raw(), model = %job.model_id, %error, "job failed");
    } else {
        debug!(
            job = job.id.as_raw(),
            model = %job.model_id,
            produced = machines.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "job finished"
        );
    }
    SampleResult {
        job_id: job.id,
        model_id: job.model_id,
        requested: job.count,
        machines,
        diagnostics,
        status,
        elapsed,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
