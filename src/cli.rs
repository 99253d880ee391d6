use clap::Parser;
use std::path::PathBuf;

use trimrescue::PartialConfig;

#[derive(Parser, Debug)]
#[command(
    name = "trimrescue",
    about = "Rescue repeat-boundary reads by progressive 3' trimming",
    version
)]
pub struct Args {
    /// YAML run configuration; command line values take precedence
    #[arg(short = 'c', long = "config", value_name = "YAML")]
    pub config: Option<PathBuf>,

    /// Experiment identifier, used to name the output directory and files
    #[arg(short = 'e', long = "experiment")]
    pub experiment_id: Option<String>,

    /// Directory in which the experiment directory is created
    #[arg(short = 'd', long = "run-dir", value_name = "DIR")]
    pub run_dir: Option<PathBuf>,

    /// Basename of the primary genome index
    #[arg(short = 'g', long = "primary-index", value_name = "INDEX")]
    pub primary_index: Option<PathBuf>,

    /// Basename of the repeat region index
    #[arg(short = 'r', long = "repeat-index", value_name = "INDEX")]
    pub repeat_index: Option<PathBuf>,

    /// First read file of the pair (fastq, optionally gzipped)
    #[arg(short = '1', long = "reads1", value_name = "FASTQ")]
    pub reads1: Option<PathBuf>,

    /// Second read file of the pair (fastq, optionally gzipped)
    #[arg(short = '2', long = "reads2", value_name = "FASTQ")]
    pub reads2: Option<PathBuf>,

    /// Sequenced read length
    #[arg(short = 'l', long = "read-len")]
    pub read_len: Option<usize>,

    /// Number of threads (CPUs) to use
    #[arg(short = 'p', long = "threads")]
    pub threads: Option<usize>,

    /// Seed passed to the aligner for reproducible tie-breaking
    #[arg(long)]
    pub seed: Option<u64>,

    /// Aligner executable
    #[arg(long, value_name = "PATH")]
    pub aligner: Option<PathBuf>,

    /// Fail a round if the aligner runs longer than this
    #[arg(long = "round-timeout", value_name = "SECONDS")]
    pub round_timeout_secs: Option<u64>,

    /// Tag for the primary reference in output file names
    #[arg(long)]
    pub primary_tag: Option<String>,

    /// Tag for the repeat reference in output file names
    #[arg(long)]
    pub repeat_tag: Option<String>,

    /// Run the four chains one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Gzip the unmapped leftover reads
    #[arg(long)]
    pub compress_leftover: bool,

    /// Suppress progress logging and set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    /// Settings given on the command line. Flags that were not set are left empty so
    /// the configuration file can supply them.
    pub fn to_partial_config(&self) -> PartialConfig {
        PartialConfig {
            experiment_id: self.experiment_id.clone(),
            run_dir: self.run_dir.clone(),
            primary_index: self.primary_index.clone(),
            repeat_index: self.repeat_index.clone(),
            reads1: self.reads1.clone(),
            reads2: self.reads2.clone(),
            read_len: self.read_len,
            threads: self.threads,
            seed: self.seed,
            aligner: self.aligner.clone(),
            round_timeout_secs: self.round_timeout_secs,
            sequential: self.sequential.then_some(true),
            primary_tag: self.primary_tag.clone(),
            repeat_tag: self.repeat_tag.clone(),
            compress_leftover: self.compress_leftover.then_some(true),
        }
    }
}
