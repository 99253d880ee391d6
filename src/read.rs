use rustc_hash::FxHashSet;

use std::fmt;
use std::sync::Arc;

use crate::errors::*;

/// A single sequencing read: name, bases, and quality scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Read {
    name: Vec<u8>,
    seq: Vec<u8>,
    qual: Vec<u8>,
    idx: usize,
}

impl Read {
    /// Create a read from the parts of a fastq record.
    ///
    /// `idx` is the position of the record in the file it was loaded from.
    pub fn from_fastq(name: &[u8], seq: &[u8], qual: &[u8], idx: usize) -> Self {
        Self {
            name: name.to_owned(),
            seq: seq.to_owned(),
            qual: qual.to_owned(),
            idx,
        }
    }

    pub fn to_fastq(&self) -> (&[u8], &[u8], &[u8]) {
        (&self.name, &self.seq, &self.qual)
    }

    /// The full name line, without the leading `@`.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The read identifier: the name up to the first whitespace.
    pub fn id(&self) -> &[u8] {
        read_id(&self.name)
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn qual(&self) -> &[u8] {
        &self.qual
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn idx(&self) -> usize {
        self.idx
    }
}

/// Strip everything after the first whitespace character of a read name.
pub fn read_id(name: &[u8]) -> &[u8] {
    let end = name
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(name.len());
    &name[..end]
}

/// An ordered batch of reads with unique identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadBatch {
    reads: Vec<Read>,
    origin: Arc<Origin>,
}

impl ReadBatch {
    /// Build a batch, rejecting duplicate read identifiers.
    pub fn new(reads: Vec<Read>, origin: Arc<Origin>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for read in &reads {
            if !seen.insert(read.id()) {
                return Err(Error::ParseRecord {
                    origin: (*origin).clone(),
                    idx: read.idx(),
                    source: format!("duplicate read identifier \"{}\"", utf8(read.id())).into(),
                });
            }
        }
        drop(seen);

        Ok(Self { reads, origin })
    }

    /// Build a batch from reads already known to have unique identifiers,
    /// such as a subset of another batch.
    pub(crate) fn from_subset(reads: Vec<Read>, origin: Arc<Origin>) -> Self {
        Self { reads, origin }
    }

    pub fn empty(origin: Arc<Origin>) -> Self {
        Self {
            reads: Vec::new(),
            origin,
        }
    }

    pub fn reads(&self) -> &[Read] {
        &self.reads
    }

    pub fn into_reads(self) -> Vec<Read> {
        self.reads
    }

    pub fn origin(&self) -> &Arc<Origin> {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Read> {
        self.reads.iter()
    }
}

impl<'a> IntoIterator for &'a ReadBatch {
    type Item = &'a Read;
    type IntoIter = std::slice::Iter<'a, Read>;

    fn into_iter(self) -> Self::IntoIter {
        self.reads.iter()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn new(b: &[u8]) -> Option<Self> {
        match b {
            b"+" => Some(Strand::Forward),
            b"-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

/// Where a read was uniquely placed on a reference.
///
/// `start` is 0-based and the placement covers `start..start + len`.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub contig: String,
    pub start: usize,
    pub len: usize,
    pub strand: Strand,
}

impl Placement {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A read annotated with its unique placement.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRead {
    pub read: Read,
    pub placement: Placement,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Strand::*;
        match self {
            Forward => write!(f, "+"),
            Reverse => write!(f, "-"),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}({})", self.contig, self.start, self.end(), self.strand)
    }
}

impl fmt::Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "name: {}", utf8(&self.name))?;
        writeln!(f, "seq:  {}", utf8(&self.seq))?;
        writeln!(f, "qual: {}", utf8(&self.qual))?;
        write!(f, "from record {}", self.idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(name: &str, idx: usize) -> Read {
        Read::from_fastq(name.as_bytes(), b"ACGT", b"IIII", idx)
    }

    #[test]
    fn id_stops_at_whitespace() {
        assert_eq!(read("r1 1:N:0:ACGT", 0).id(), b"r1");
        assert_eq!(read("r2\tcomment", 0).id(), b"r2");
        assert_eq!(read("r3", 0).id(), b"r3");
    }

    #[test]
    fn duplicate_ids_rejected() {
        let origin = Arc::new(Origin::Bytes);
        let reads = vec![read("a", 0), read("b", 1), read("a extra", 2)];
        let err = ReadBatch::new(reads, origin).unwrap_err();
        match err {
            Error::ParseRecord { idx, .. } => assert_eq!(idx, 2),
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn placement_end_is_exclusive() {
        let p = Placement {
            contig: "chr1".to_owned(),
            start: 10,
            len: 5,
            strand: Strand::Reverse,
        };
        assert_eq!(p.end(), 15);
        assert_eq!(p.to_string(), "chr1:10-15(-)");
    }
}
