use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use msamp_run::canonical::to_json_bytes;
use msamp_run::{allocate, table};

#[derive(Args, Debug)]
pub struct QuotaArgs {
    /// Model probabilities file.
    #[arg(short = 'm', long)]
    pub model_probabilities: PathBuf,
    /// Number of machines to allocate.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub number_samples: i64,
    /// Emit canonical JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &QuotaArgs) -> Result<(), Box<dyn Error>> {
    let table = table::load(&args.model_probabilities)?;
    let quota = allocate(&table, args.number_samples)?;
    if args.json {
        let json = to_json_bytes(&quota)?;
        println!("{}", String::from_utf8(json)?);
        return Ok(());
    }
    let width = table
        .iter()
        .map(|(model, _)| model.as_str().len())
        .max()
        .unwrap_or(0)
        .max("model".len());
    println!("{:<width$}  {:>11}  {:>9}", "model", "probability", "samples");
    for (model, probability) in table.iter() {
        println!(
            "{:<width$}  {:>11.6}  {:>9}",
            model.as_str(),
            probability,
            quota.get(model)
        );
    }
    Ok(())
}
