use rustc_hash::FxHashMap;

use std::path::PathBuf;

use crate::errors::*;
use crate::read::*;
use crate::reference::*;
use crate::schedule::*;

pub mod bowtie;
pub use bowtie::*;

/// Aligns a batch of reads against an index and splits it into uniquely placed and
/// everything else.
///
/// Implementations must classify every input read exactly once. A read that cannot be
/// placed within `max_hits` locations is unmapped, not an error.
pub trait AlignmentOracle: Send + Sync {
    fn align(
        &self,
        reads: &ReadBatch,
        index: &ReferenceIndex,
        params: &AlignParams,
    ) -> Result<AlignmentResult>;

    fn name(&self) -> &'static str;
}

/// Parameters for a single alignment round.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignParams {
    pub trim: TrimSpec,
    pub mismatches: usize,
    pub max_hits: usize,
    pub seed: u64,
    pub threads: usize,
    /// Scratch directory owned by this round.
    pub work_dir: PathBuf,
}

/// The reads of one round, split by whether they were uniquely placed.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub mapped: Vec<MappedRead>,
    pub unmapped: ReadBatch,
}

/// Collects reported hits by read identifier, remembering reads that were reported
/// more than once.
#[derive(Debug, Default)]
pub struct HitTable {
    hits: FxHashMap<Vec<u8>, Option<Placement>>,
}

impl HitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit. A second hit for the same read makes it ambiguous.
    pub fn insert(&mut self, id: &[u8], placement: Placement) {
        use std::collections::hash_map::Entry::*;
        match self.hits.entry(id.to_owned()) {
            Occupied(mut e) => {
                e.insert(None);
            }
            Vacant(e) => {
                e.insert(Some(placement));
            }
        }
    }

    /// Split `reads` into reads with exactly one hit and the rest, preserving input order.
    pub fn partition(mut self, reads: &ReadBatch) -> AlignmentResult {
        let mut mapped = Vec::new();
        let mut unmapped = Vec::new();

        for read in reads {
            match self.hits.remove(read.id()).flatten() {
                Some(placement) => mapped.push(MappedRead {
                    read: read.clone(),
                    placement,
                }),
                None => unmapped.push(read.clone()),
            }
        }

        AlignmentResult {
            mapped,
            unmapped: ReadBatch::from_subset(unmapped, reads.origin().clone()),
        }
    }
}
