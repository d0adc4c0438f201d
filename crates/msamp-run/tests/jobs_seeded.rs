use msamp_core::derive_substream_seed;
use msamp_run::{allocate, build_jobs, ModelProbabilityTable, SamplingMode};

#[test]
fn jobs_skip_zero_quota_and_keep_position_seeds() {
    let table =
        ModelProbabilityTable::from_pairs([("A", 0.0), ("B", 0.6), ("C", 0.4)]).expect("table");
    let quota = allocate(&table, 5).expect("allocate");
    let jobs = build_jobs(&table, &quota, &SamplingMode::Prior, 17);

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id.as_raw(), 0);
    assert_eq!(jobs[0].model_id.as_str(), "B");
    assert_eq!(jobs[0].count, 3);
    assert_eq!(jobs[0].seed, derive_substream_seed(17, 1));
    assert_eq!(jobs[1].model_id.as_str(), "C");
    assert_eq!(jobs[1].count, 2);
    assert_eq!(jobs[1].seed, derive_substream_seed(17, 2));
    assert!(jobs.iter().all(|job| job.data.is_none()));

    let again = build_jobs(&table, &quota, &SamplingMode::Prior, 17);
    let seeds: Vec<u64> = again.iter().map(|job| job.seed).collect();
    assert_eq!(seeds, vec![jobs[0].seed, jobs[1].seed]);
}
