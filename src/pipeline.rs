use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::chain::*;
use crate::config::*;
use crate::errors::*;
use crate::fastq::*;
use crate::intervals::*;
use crate::layout::*;
use crate::oracle::*;
use crate::read::*;
use crate::reference::*;
use crate::schedule::*;

/// Files written for a chain that completed and merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainFiles {
    pub rounds: Vec<PathBuf>,
    pub merged: PathBuf,
    pub leftover: PathBuf,
}

/// What happened to one chain of a run.
#[derive(Debug)]
pub enum ChainOutcome {
    /// Every round aligned and the intervals were written.
    Merged {
        output: ChainOutput,
        intervals: ChainIntervals,
        files: ChainFiles,
    },
    /// Every round aligned but conversion or writing failed. The records are kept.
    MergeFailed { output: ChainOutput, error: Error },
    /// A round failed, so none of the chain's output is valid.
    Failed(Error),
}

impl ChainOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, ChainOutcome::Merged { .. })
    }

    pub fn output(&self) -> Option<&ChainOutput> {
        use ChainOutcome::*;
        match self {
            Merged { output, .. } | MergeFailed { output, .. } => Some(output),
            Failed(_) => None,
        }
    }

    pub fn intervals(&self) -> Option<&ChainIntervals> {
        match self {
            ChainOutcome::Merged { intervals, .. } => Some(intervals),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        use ChainOutcome::*;
        match self {
            Merged { .. } => None,
            MergeFailed { error, .. } | Failed(error) => Some(error),
        }
    }
}

/// Outcome of every chain of a run, including the failed ones.
#[derive(Debug)]
pub struct PipelineReport {
    pub outcomes: BTreeMap<ChainKey, ChainOutcome>,
    pub summary: Option<PathBuf>,
}

impl PipelineReport {
    /// Whether every chain merged.
    pub fn is_success(&self) -> bool {
        self.outcomes.values().all(|o| o.is_merged())
    }

    pub fn outcome(&self, key: ChainKey) -> Option<&ChainOutcome> {
        self.outcomes.get(&key)
    }

    pub fn failures(&self) -> impl Iterator<Item = (ChainKey, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| outcome.error().map(|e| (*key, e)))
    }
}

/// Runs the four rescue chains of an experiment and merges their intervals.
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    oracle: &'a dyn AlignmentOracle,
    converter: &'a dyn IntervalConverter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a RunConfig,
        oracle: &'a dyn AlignmentOracle,
        converter: &'a dyn IntervalConverter,
    ) -> Self {
        Self {
            config,
            oracle,
            converter,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(
            self.config.output_dir(),
            &self.config.experiment_id,
            self.config.compress_leftover,
        )
    }

    /// Run every chain and report each one's outcome.
    ///
    /// Only an output directory that cannot be created is returned as an error. Read files
    /// that fail to load fail the two chains of that read end, and chain failures are
    /// part of the report.
    pub fn execute(&self) -> Result<PipelineReport> {
        let layout = self.layout();
        create_output_dir(layout.dir())?;

        let reads1 = self.load_reads(ReadEnd::One);
        let reads2 = self.load_reads(ReadEnd::Two);

        let schedule = TrimSchedule::new(self.config.read_len);
        let threads = if self.config.sequential {
            self.config.threads
        } else {
            (self.config.threads / ChainKey::ALL.len()).max(1)
        };

        let batch = |key: ChainKey| match key.read_end {
            ReadEnd::One => reads1.as_ref(),
            ReadEnd::Two => reads2.as_ref(),
        };

        let outcomes: BTreeMap<ChainKey, ChainOutcome> = if self.config.sequential {
            ChainKey::ALL
                .iter()
                .map(|&key| {
                    let reads = batch(key);
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.run_chain(key, reads, &schedule, threads, &layout)
                    }))
                    .unwrap_or_else(|_| panicked(key));
                    (key, outcome)
                })
                .collect()
        } else {
            let schedule = &schedule;
            let layout = &layout;
            thread::scope(|s| {
                let handles = ChainKey::ALL
                    .iter()
                    .map(|&key| {
                        let reads = batch(key);
                        let handle = s.spawn(move || {
                            self.run_chain(key, reads, schedule, threads, layout)
                        });
                        (key, handle)
                    })
                    .collect::<Vec<_>>();

                handles
                    .into_iter()
                    .map(|(key, handle)| (key, handle.join().unwrap_or_else(|_| panicked(key))))
                    .collect()
            })
        };

        let summary = layout.summary();
        let summary = match write_summary(&summary, &outcomes) {
            Ok(()) => Some(summary),
            Err(e) => {
                tracing::error!(error = %e, "could not write rescue summary");
                None
            }
        };

        Ok(PipelineReport { outcomes, summary })
    }

    fn load_reads(&self, read_end: ReadEnd) -> LoadedReads {
        match load_fastq(self.config.reads(read_end)) {
            Ok(reads) => {
                tracing::info!(
                    experiment = %self.config.experiment_id,
                    %read_end,
                    reads = reads.len(),
                    "loaded reads"
                );
                Ok(reads)
            }
            Err(error) => {
                tracing::error!(%read_end, error = %error, "could not load reads");
                Err(Arc::new(error))
            }
        }
    }

    fn run_chain(
        &self,
        key: ChainKey,
        reads: std::result::Result<&ReadBatch, &Arc<Error>>,
        schedule: &TrimSchedule,
        threads: usize,
        layout: &OutputLayout,
    ) -> ChainOutcome {
        let reads = match reads {
            Ok(reads) => reads,
            Err(error) => {
                return ChainOutcome::Failed(Error::ReadsUnavailable {
                    read_end: key.read_end.to_string(),
                    source: Arc::clone(error),
                })
            }
        };

        let index = self.config.index(key.reference);
        let settings = ChainSettings {
            seed: self.config.seed,
            threads,
            work_dir: layout.work_dir(key.read_end, index.tag()),
        };

        let chain = RescueChain::new(key, self.oracle, settings);
        let output = match chain.run(reads, index, schedule) {
            Ok(output) => output,
            Err(error) => {
                tracing::error!(chain = %key, error = %error, "chain failed");
                return ChainOutcome::Failed(error);
            }
        };

        let merged = ChainIntervals::convert(&output, self.converter)
            .and_then(|intervals| {
                let files = write_chain(&output, &intervals, index.tag(), layout)?;
                Ok((intervals, files))
            });

        match merged {
            Ok((intervals, files)) => {
                tracing::info!(
                    chain = %key,
                    rescued = output.rescued(),
                    unmapped = output.leftover.len(),
                    intervals = intervals.len(),
                    "chain merged"
                );
                ChainOutcome::Merged {
                    output,
                    intervals,
                    files,
                }
            }
            Err(error) => {
                tracing::error!(chain = %key, error = %error, "chain merge failed");
                ChainOutcome::MergeFailed { output, error }
            }
        }
    }
}

/// Reads of one end, or the shared reason they could not be loaded.
type LoadedReads = std::result::Result<ReadBatch, Arc<Error>>;

fn panicked(key: ChainKey) -> ChainOutcome {
    tracing::error!(chain = %key, "chain panicked");
    ChainOutcome::Failed(Error::ChainPanicked(key.to_string()))
}

fn create_output_dir(dir: &Path) -> Result<()> {
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::file_io(parent.display(), e))?;
    }

    fs::create_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            Error::OutputExists(dir.to_owned())
        } else {
            Error::file_io(dir.display(), e)
        }
    })
}

fn write_chain(
    output: &ChainOutput,
    intervals: &ChainIntervals,
    tag: &str,
    layout: &OutputLayout,
) -> Result<ChainFiles> {
    let read_end = output.key.read_end;

    let rounds = intervals
        .rounds
        .iter()
        .map(|(effective_len, round)| {
            let path = layout.round_intervals(read_end, tag, *effective_len);
            write_bed(&path, round)?;
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;

    let merged = layout.merged_intervals(read_end, tag);
    write_bed(&merged, intervals.merged())?;

    let leftover = layout.leftover(read_end, tag);
    write_fastq(&leftover, &output.leftover)?;

    Ok(ChainFiles {
        rounds,
        merged,
        leftover,
    })
}

fn write_summary(path: &Path, outcomes: &BTreeMap<ChainKey, ChainOutcome>) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(
            writer,
            "read_end\treference\tstatus\tround\ttrim3\teffective_len\trescued\tremaining"
        )?;

        for (key, outcome) in outcomes {
            let status = match outcome {
                ChainOutcome::Merged { .. } => "ok",
                ChainOutcome::MergeFailed { .. } => "merge_failed",
                ChainOutcome::Failed(_) => "failed",
            };

            let Some(output) = outcome.output() else {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t-\t-\t-\t-\t-",
                    key.read_end, key.reference, status
                )?;
                continue;
            };

            for (record, remaining) in output.records.iter().zip(output.remaining()) {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    key.read_end,
                    key.reference,
                    status,
                    record.round,
                    record.trim.trim3,
                    record.effective_len,
                    record.reads.len(),
                    remaining
                )?;
            }
        }

        writer.flush()
    };

    write().map_err(|e| Error::file_io(path.display(), e))
}
