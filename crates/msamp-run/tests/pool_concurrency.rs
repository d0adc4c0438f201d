use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use msamp_core::{
    ErrorInfo, GeneratedSamples, JobId, JobState, MachineGenerator, MachineSample, ModelId,
    SampleError, SampleJob,
};
use msamp_run::{run_jobs, WorkerPool};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Generator that records how many calls are in flight at once.
struct InstrumentedGenerator {
    active: AtomicUsize,
    peak: AtomicUsize,
    delays_ms: Vec<u64>,
}

impl InstrumentedGenerator {
    fn new(jobs: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delays_ms: (0..jobs).map(|_| rng.gen_range(1..15)).collect(),
        }
    }
}

impl MachineGenerator for InstrumentedGenerator {
    fn generate_samples(&self, job: &SampleJob) -> Result<GeneratedSamples, SampleError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(self.delays_ms[job.id.as_raw()]));
        self.active.fetch_sub(1, Ordering::SeqCst);
        let mut rng = job.rng();
        Ok(GeneratedSamples {
            machines: (0..job.count)
                .map(|i| MachineSample::new(format!("{}-{i}-{:08x}", job.model_id, rng.next_u32())))
                .collect(),
            diagnostics: None,
        })
    }
}

fn jobs(count: usize) -> Vec<SampleJob> {
    (0..count)
        .map(|idx| SampleJob {
            id: JobId::from_raw(idx),
            model_id: ModelId::new(format!("m{idx}")),
            count: (idx % 3 + 1) as u64,
            seed: idx as u64,
            data: None,
        })
        .collect()
}

#[test]
fn pool_never_exceeds_worker_cap() {
    for workers in [1usize, 2, 3] {
        let generator = InstrumentedGenerator::new(24, workers as u64);
        let pool = WorkerPool::new(workers).expect("pool");
        let results = pool.run(jobs(24), &generator);
        assert_eq!(results.len(), 24);
        let peak = generator.peak.load(Ordering::SeqCst);
        assert!(peak >= 1);
        assert!(peak <= workers, "peak {peak} exceeded cap {workers}");
    }
}

#[test]
fn results_match_jobs_regardless_of_completion_order() {
    let generator = InstrumentedGenerator::new(16, 99);
    let results = run_jobs(jobs(16), 4, &generator).expect("run");
    for (idx, result) in results.iter().enumerate() {
        assert_eq!(result.job_id, JobId::from_raw(idx));
        assert_eq!(result.model_id, ModelId::new(format!("m{idx}")));
        assert_eq!(result.requested, (idx % 3 + 1) as u64);
        assert_eq!(result.produced(), result.requested);
        assert!(result.machines[0].descriptor.starts_with(&format!("m{idx}-")));
    }
}

#[test]
fn failing_and_panicking_jobs_do_not_affect_siblings() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let generator = move |job: &SampleJob| -> Result<GeneratedSamples, SampleError> {
        counter.fetch_add(1, Ordering::SeqCst);
        match job.model_id.as_str() {
            "m1" => Err(SampleError::Job(ErrorInfo::new(
                "bad_topology",
                "topology is not strongly connected",
            ))),
            "m3" => panic!("generator crashed on m3"),
            _ => Ok(GeneratedSamples {
                machines: vec![MachineSample::new("ok"); job.count as usize],
                diagnostics: Some("fine".into()),
            }),
        }
    };
    let results = run_jobs(jobs(6), 2, &generator).expect("run");
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(results.len(), 6);

    let failed: Vec<_> = results
        .iter()
        .filter(|r| r.status.state == JobState::Failed)
        .map(|r| r.model_id.as_str().to_string())
        .collect();
    assert_eq!(failed, vec!["m1", "m3"]);

    let m1 = &results[1];
    assert!(m1
        .status
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("not strongly connected"));
    assert!(m1.machines.is_empty());
    let m3 = &results[3];
    assert!(m3
        .status
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("generator crashed on m3"));

    for idx in [0usize, 2, 4, 5] {
        assert!(results[idx].status.is_complete());
        assert_eq!(results[idx].produced(), results[idx].requested);
        assert_eq!(results[idx].diagnostics.as_deref(), Some("fine"));
    }
}

#[test]
fn zero_workers_is_rejected() {
    let err = WorkerPool::new(0).unwrap_err();
    assert!(matches!(err, SampleError::Config(_)));
    let generator = InstrumentedGenerator::new(1, 0);
    assert!(run_jobs(jobs(1), 0, &generator).is_err());
}

#[test]
fn empty_job_list_returns_no_results() {
    let generator = InstrumentedGenerator::new(0, 0);
    let pool = WorkerPool::new(2).expect("pool");
    assert!(pool.run(Vec::new(), &generator).is_empty());
    assert_eq!(pool.max_workers(), 2);
}
