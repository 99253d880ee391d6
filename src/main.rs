mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use trimrescue::*;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut partial = args.to_partial_config();
    if let Some(path) = &args.config {
        let file = PartialConfig::from_yaml_file(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        partial = partial.or(file);
    }
    let config = partial.resolve()?;

    let oracle = BowtieOracle::new(&config.aligner).with_timeout(config.round_timeout);
    let pipeline = Pipeline::new(&config, &oracle, &PlacementConverter);
    let report = pipeline.execute()?;

    print_report(&report);

    let failed = report.failures().count();
    if failed > 0 {
        bail!(
            "{} of {} chains did not complete, partial results are in {}",
            failed,
            report.outcomes.len(),
            config.output_dir().display()
        );
    }

    tracing::info!(output = %config.output_dir().display(), "trimrescue: processing complete");
    Ok(())
}

fn print_report(report: &PipelineReport) {
    for (key, outcome) in &report.outcomes {
        let label = format!("{:<12}", key.to_string());
        match outcome {
            ChainOutcome::Merged { output, files, .. } => eprintln!(
                "{} {} rescued {}/{}, merged into {}",
                label,
                "ok".green().bold(),
                output.rescued(),
                output.total(),
                files.merged.display()
            ),
            ChainOutcome::MergeFailed { output, error } => eprintln!(
                "{} {} rescued {}/{}, {}",
                label,
                "merge failed".yellow().bold(),
                output.rescued(),
                output.total(),
                error
            ),
            ChainOutcome::Failed(error) => eprintln!(
                "{} {} ({} error) {}",
                label,
                "failed".red().bold(),
                error.kind(),
                error
            ),
        }
    }

    if let Some(summary) = &report.summary {
        eprintln!("summary: {}", summary.display());
    }
}
