use std::path::{Path, PathBuf};

use crate::reference::*;

/// Names of every file a run writes below its experiment directory.
///
/// Per chain, with `<end>` being `R1` or `R2` and `<tag>` the reference tag:
/// * `<exp>_<end>_<tag>_len<L>.bed`: intervals rescued at effective length `L`
/// * `<exp>_<end>_<tag>.bed`: all of the chain's intervals in round order
/// * `<exp>_<end>_<tag>_unmapped.fastq[.gz]`: reads never uniquely placed
/// * `work/<end>_<tag>/round<k>/`: scratch files of each alignment round
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    dir: PathBuf,
    experiment_id: String,
    compress_leftover: bool,
}

impl OutputLayout {
    pub fn new(
        dir: impl Into<PathBuf>,
        experiment_id: impl Into<String>,
        compress_leftover: bool,
    ) -> Self {
        Self {
            dir: dir.into(),
            experiment_id: experiment_id.into(),
            compress_leftover,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn prefix(&self, read_end: ReadEnd, tag: &str) -> String {
        format!("{}_{}_{}", self.experiment_id, read_end, tag)
    }

    pub fn round_intervals(&self, read_end: ReadEnd, tag: &str, effective_len: usize) -> PathBuf {
        self.dir
            .join(format!("{}_len{}.bed", self.prefix(read_end, tag), effective_len))
    }

    pub fn merged_intervals(&self, read_end: ReadEnd, tag: &str) -> PathBuf {
        self.dir.join(format!("{}.bed", self.prefix(read_end, tag)))
    }

    pub fn leftover(&self, read_end: ReadEnd, tag: &str) -> PathBuf {
        let ext = if self.compress_leftover { "fastq.gz" } else { "fastq" };
        self.dir
            .join(format!("{}_unmapped.{}", self.prefix(read_end, tag), ext))
    }

    pub fn work_dir(&self, read_end: ReadEnd, tag: &str) -> PathBuf {
        self.dir.join("work").join(format!("{}_{}", read_end, tag))
    }

    pub fn summary(&self) -> PathBuf {
        self.dir
            .join(format!("{}_rescue_summary.tsv", self.experiment_id))
    }
}
