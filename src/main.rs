use anyhow::{Result, bail};
use clap::Parser;
use std::process;
use tracing::{error, info};
use trajectory_kml::cli::{self, Args};
use trajectory_kml::converter::convert;

fn main() {
    let args = Args::parse();
    cli::setup_logging(&args);

    match run(&args) {
        Ok(failed) if failed == 0 => process::exit(0),
        Ok(_) => process::exit(1),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Convert every input and return the number of failures
fn run(args: &Args) -> Result<usize> {
    let config = args.build_config()?;
    let inputs = cli::collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        bail!("No dataset files matched {:?}", args.inputs);
    }

    let batch = inputs.len() > 1;
    if batch {
        if let Some(dir) = &args.output {
            std::fs::create_dir_all(dir)?;
        }
    }
    info!("Converting {} dataset(s)", inputs.len());

    let progress = batch.then(|| cli::create_progress_bar(inputs.len() as u64, "Converting"));
    let mut converted = Vec::new();
    let mut failed = Vec::new();

    for input in &inputs {
        let output = args.output_path_for(input, batch);
        match convert(input, &output, &config) {
            Ok(stats) => converted.push(stats),
            Err(e) => {
                error!("Failed to convert {}: {}", input.display(), e);
                failed.push((input.clone(), e.to_string()));
            }
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Done");
    }
    cli::print_summary(&converted, &failed);
    Ok(failed.len())
}
