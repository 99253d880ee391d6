use rustc_hash::FxHashSet;

use std::borrow::Cow;
use std::path::PathBuf;

use crate::errors::*;
use crate::oracle::*;
use crate::read::*;
use crate::reference::*;
use crate::schedule::*;

/// Only exact matches are accepted in every round.
pub const MISMATCHES: usize = 0;

/// Reads with more than one placement are left unmapped.
pub const MAX_HITS: usize = 1;

/// Settings shared by every round of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    pub seed: u64,
    pub threads: usize,
    /// Each round gets its own subdirectory `round<k>` below this.
    pub work_dir: PathBuf,
}

/// The reads rescued by one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueRecord {
    pub round: usize,
    pub trim: TrimSpec,
    /// Number of bases that were aligned in this round.
    pub effective_len: usize,
    pub reads: Vec<MappedRead>,
}

/// Everything a chain produced: one record per round in order, and the reads that
/// were never uniquely placed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    pub key: ChainKey,
    pub records: Vec<RescueRecord>,
    pub leftover: ReadBatch,
}

impl ChainOutput {
    pub fn rescued(&self) -> usize {
        self.records.iter().map(|r| r.reads.len()).sum()
    }

    /// Number of reads the chain started with.
    pub fn total(&self) -> usize {
        self.rescued() + self.leftover.len()
    }

    /// Number of reads still unplaced after each round.
    pub fn remaining(&self) -> Vec<usize> {
        let mut left = self.total();
        self.records
            .iter()
            .map(|r| {
                left -= r.reads.len();
                left
            })
            .collect()
    }
}

/// Drives one (read end, reference) pair through a trim schedule.
pub struct RescueChain<'a> {
    key: ChainKey,
    oracle: &'a dyn AlignmentOracle,
    settings: ChainSettings,
}

impl<'a> RescueChain<'a> {
    pub fn new(key: ChainKey, oracle: &'a dyn AlignmentOracle, settings: ChainSettings) -> Self {
        Self {
            key,
            oracle,
            settings,
        }
    }

    pub fn key(&self) -> ChainKey {
        self.key
    }

    /// Align `initial` once per scheduled round, feeding each round's unmapped reads
    /// into the next.
    ///
    /// Any failed round aborts the chain, since later rounds depend on its output.
    pub fn run(
        &self,
        initial: &ReadBatch,
        index: &ReferenceIndex,
        schedule: &TrimSchedule,
    ) -> Result<ChainOutput> {
        let mut current = Cow::Borrowed(initial);
        let mut records = Vec::with_capacity(schedule.len());

        for (round, trim) in schedule.iter().enumerate() {
            let params = AlignParams {
                trim,
                mismatches: MISMATCHES,
                max_hits: MAX_HITS,
                seed: self.settings.seed,
                threads: self.settings.threads,
                work_dir: self.settings.work_dir.join(format!("round{round}")),
            };

            let result = self
                .oracle
                .align(&current, index, &params)
                .and_then(|result| check_partition(&current, result))
                .map_err(|e| Error::Oracle {
                    chain: self.key.to_string(),
                    round,
                    source: Box::new(e),
                })?;

            let effective_len = trim.effective_len(schedule.read_len());
            tracing::info!(
                chain = %self.key,
                oracle = self.oracle.name(),
                round,
                trim3 = trim.trim3,
                effective_len,
                rescued = result.mapped.len(),
                remaining = result.unmapped.len(),
                "round complete"
            );

            records.push(RescueRecord {
                round,
                trim,
                effective_len,
                reads: result.mapped,
            });
            current = Cow::Owned(result.unmapped);
        }

        Ok(ChainOutput {
            key: self.key,
            records,
            leftover: current.into_owned(),
        })
    }
}

/// Every input read must come back exactly once, either mapped or unmapped.
fn check_partition(input: &ReadBatch, result: AlignmentResult) -> Result<AlignmentResult> {
    let (mapped, unmapped) = (result.mapped.len(), result.unmapped.len());
    if mapped + unmapped != input.len() {
        return Err(Error::BrokenPartition {
            input: input.len(),
            mapped,
            unmapped,
        });
    }

    let mut pending = input.iter().map(|r| r.id()).collect::<FxHashSet<_>>();
    let returned = result
        .mapped
        .iter()
        .map(|m| &m.read)
        .chain(result.unmapped.iter());
    for read in returned {
        if !pending.remove(read.id()) {
            return Err(Error::UnexpectedRead {
                id: utf8(read.id()),
            });
        }
    }

    Ok(result)
}
