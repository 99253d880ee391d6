use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::chain::*;
use crate::errors::*;
use crate::read::*;

/// Score written for every interval, the mapping quality of a unique placement.
pub const UNIQUE_SCORE: u8 = 255;

/// A BED6 interval for one uniquely placed read.
///
/// Coordinates are 0-based and half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRecord {
    pub contig: String,
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub score: u8,
    pub strand: Strand,
}

/// Turns the mapped reads of a round into interval records.
///
/// Conversion is record for record: every mapped read yields at most one interval.
pub trait IntervalConverter: Send + Sync {
    fn convert(&self, record: &RescueRecord) -> std::result::Result<Vec<IntervalRecord>, String>;
}

/// Converts each read's placement directly into a BED6 interval named after the read.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlacementConverter;

impl IntervalConverter for PlacementConverter {
    fn convert(&self, record: &RescueRecord) -> std::result::Result<Vec<IntervalRecord>, String> {
        record
            .reads
            .iter()
            .map(|m| {
                let p = &m.placement;
                if p.len == 0 {
                    return Err(format!("read \"{}\" has an empty placement", utf8(m.read.id())));
                }
                if p.contig.is_empty() || p.contig.contains(char::is_whitespace) {
                    return Err(format!(
                        "read \"{}\" is placed on an invalid contig name \"{}\"",
                        utf8(m.read.id()),
                        p.contig
                    ));
                }
                Ok(IntervalRecord {
                    contig: p.contig.clone(),
                    start: p.start,
                    end: p.end(),
                    name: utf8(m.read.id()),
                    score: UNIQUE_SCORE,
                    strand: p.strand,
                })
            })
            .collect()
    }
}

/// Intervals of one chain, one entry per round in ascending round order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainIntervals {
    /// Each round's effective length and its intervals.
    pub rounds: Vec<(usize, Vec<IntervalRecord>)>,
}

impl ChainIntervals {
    /// Convert every record of a finished chain, stopping at the first failure.
    pub fn convert(output: &ChainOutput, converter: &dyn IntervalConverter) -> Result<Self> {
        let rounds = output
            .records
            .iter()
            .map(|record| {
                converter
                    .convert(record)
                    .map(|intervals| (record.effective_len, intervals))
                    .map_err(|reason| Error::Conversion {
                        chain: output.key.to_string(),
                        round: record.round,
                        reason,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rounds })
    }

    /// All intervals concatenated in round order.
    pub fn merged(&self) -> impl Iterator<Item = &IntervalRecord> {
        self.rounds.iter().flat_map(|(_, intervals)| intervals)
    }

    pub fn len(&self) -> usize {
        self.rounds.iter().map(|(_, intervals)| intervals.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn write_bed<'a>(
    file: impl AsRef<Path>,
    intervals: impl IntoIterator<Item = &'a IntervalRecord>,
) -> Result<()> {
    let path = file.as_ref();

    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for interval in intervals {
            writeln!(writer, "{}", interval)?;
        }
        writer.flush()
    };

    write().map_err(|e| Error::file_io(path.display(), e))
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.contig, self.start, self.end, self.name, self.score, self.strand
        )
    }
}
