use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_run::canonical::to_json_bytes;
use msamp_run::{CommandGenerator, SampleOrchestrator, SampleSettings};

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// YAML settings file; flags given on the command line take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Database root directory (holds `datafile` and `summary.log`).
    #[arg(short = 'd', long)]
    pub database_directory: Option<PathBuf>,
    /// Inference run sub-directory, named `<label>_<lower>-<upper>`.
    #[arg(short = 'i', long)]
    pub inferem_directory: Option<String>,
    /// Model probabilities file.
    #[arg(short = 'm', long)]
    pub model_probabilities: Option<PathBuf>,
    /// Number of machines to sample.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub number_samples: Option<i64>,
    /// Sample from the prior; no data file is read.
    #[arg(long)]
    pub this_is_prior: bool,
    /// Number of simultaneous generator processes (default 4).
    #[arg(long)]
    pub nprocs: Option<usize>,
    /// Master seed for per-job seeds.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Kill a generator process after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Program invoked once per model as `<program> <args..> <model> <count> <seed>`.
    #[arg(long)]
    pub generator: PathBuf,
    /// Extra argument passed to the generator ahead of the per-job arguments.
    #[arg(long = "generator-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub generator_args: Vec<String>,
    /// Also write the summary as canonical JSON to this path.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

pub fn run(args: &SampleArgs) -> Result<(), Box<dyn Error>> {
    let settings = resolve_settings(args)?;
    let generator = CommandGenerator::new(&args.generator)
        .with_args(args.generator_args.iter().cloned())
        .with_timeout(settings.job_timeout());

    println!("{}", settings.report());
    let mut orchestrator = SampleOrchestrator::new(settings, generator);
    let outcome = orchestrator.run()?;
    print!("{}", outcome.summary.render());

    if let Some(path) = &args.json {
        let json = to_json_bytes(&outcome.summary)?;
        fs::write(path, json)?;
    }
    Ok(())
}

fn resolve_settings(args: &SampleArgs) -> Result<SampleSettings, SampleError> {
    let mut settings = match &args.config {
        Some(path) => SampleSettings::from_yaml_path(path)?,
        None => SampleSettings::new(
            required(args.database_directory.clone(), "database-directory")?,
            required(args.inferem_directory.clone(), "inferem-directory")?,
            required(args.model_probabilities.clone(), "model-probabilities")?,
            required(args.number_samples, "number-samples")?,
        ),
    };
    if let Some(dir) = &args.database_directory {
        settings.database_directory = dir.clone();
    }
    if let Some(name) = &args.inferem_directory {
        settings.inferem_directory = name.clone();
    }
    if let Some(path) = &args.model_probabilities {
        settings.model_probabilities = path.clone();
    }
    if let Some(count) = args.number_samples {
        settings.number_samples = count;
    }
    if args.this_is_prior {
        settings.this_is_prior = true;
    }
    if let Some(nprocs) = args.nprocs {
        settings.nprocs = nprocs;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.timeout_secs.is_some() {
        settings.job_timeout_secs = args.timeout_secs;
    }
    Ok(settings)
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, SampleError> {
    value.ok_or_else(|| {
        SampleError::Config(
            ErrorInfo::new("missing_flag", format!("--{flag} is required"))
                .with_hint("pass the flag or provide it through --config"),
        )
    })
}
