//! Shared fixtures: a synthetic genome with a tandem repeat, reads sampled from it, and an
//! in-process exact-match aligner standing in for bowtie.
#![allow(dead_code)]

use memchr::memmem;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use std::path::{Path, PathBuf};

use trimrescue::*;

pub const READ_LEN: usize = 50;

pub fn random_seq(rng: &mut Xoshiro256PlusPlus, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b => b,
        })
        .collect()
}

/// Replace the base at `idx` with a different one.
pub fn mutate(seq: &mut [u8], idx: usize) {
    seq[idx] = match seq[idx] {
        b'A' => b'C',
        b'C' => b'G',
        b'G' => b'T',
        _ => b'A',
    };
}

pub fn fastq(reads: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, seq) in reads {
        out.extend_from_slice(format!("@{name}\n").as_bytes());
        out.extend_from_slice(seq);
        out.extend_from_slice(b"\n+\n");
        out.extend(std::iter::repeat(b'I').take(seq.len()));
        out.push(b'\n');
    }
    out
}

/// Aligns exactly against in-memory contigs, on both strands, honouring the trim and
/// reporting only reads with at most `max_hits` placements.
pub struct ExactOracle {
    primary: Vec<(String, Vec<u8>)>,
    repeat: Vec<(String, Vec<u8>)>,
}

impl ExactOracle {
    pub fn new(primary: Vec<(String, Vec<u8>)>, repeat: Vec<(String, Vec<u8>)>) -> Self {
        Self { primary, repeat }
    }

    fn hits(&self, reference: Reference, query: &[u8]) -> Vec<Placement> {
        let contigs = match reference {
            Reference::Primary => &self.primary,
            Reference::Repeat => &self.repeat,
        };
        let rc = revcomp(query);

        let mut hits = Vec::new();
        for (name, contig) in contigs {
            let mut strands = vec![(query, Strand::Forward)];
            if rc != query {
                strands.push((rc.as_slice(), Strand::Reverse));
            }

            for (needle, strand) in strands {
                let finder = memmem::Finder::new(needle);
                let mut pos = 0;
                while let Some(i) = finder.find(&contig[pos..]) {
                    hits.push(Placement {
                        contig: name.clone(),
                        start: pos + i,
                        len: needle.len(),
                        strand,
                    });
                    pos += i + 1;
                }
            }
        }
        hits
    }
}

impl AlignmentOracle for ExactOracle {
    fn align(
        &self,
        reads: &ReadBatch,
        index: &ReferenceIndex,
        params: &AlignParams,
    ) -> trimrescue::Result<AlignmentResult> {
        assert_eq!(params.mismatches, 0);

        let mut table = HitTable::new();
        for read in reads {
            let end = read.len().saturating_sub(params.trim.trim3);
            let start = params.trim.anchor5.min(end);
            let query = &read.seq()[start..end];
            if query.is_empty() {
                continue;
            }

            let hits = self.hits(index.reference(), query);
            if !hits.is_empty() && hits.len() <= params.max_hits {
                for hit in hits {
                    table.insert(read.id(), hit);
                }
            }
        }
        Ok(table.partition(reads))
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// A genome made of two unique flanks around two copies of a repeat unit, and the repeat
/// unit alone as the second reference.
pub struct Genome {
    pub flank_a: Vec<u8>,
    pub unit: Vec<u8>,
    pub flank_b: Vec<u8>,
}

impl Genome {
    pub fn new(seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        Self {
            flank_a: random_seq(&mut rng, 3000),
            unit: random_seq(&mut rng, 800),
            flank_b: random_seq(&mut rng, 3000),
        }
    }

    pub fn primary(&self) -> Vec<u8> {
        let mut seq = self.flank_a.clone();
        seq.extend_from_slice(&self.unit);
        seq.extend_from_slice(&self.unit);
        seq.extend_from_slice(&self.flank_b);
        seq
    }

    pub fn oracle(&self) -> ExactOracle {
        ExactOracle::new(
            vec![("chr1".to_owned(), self.primary())],
            vec![("rDNA".to_owned(), self.unit.clone())],
        )
    }
}

/// Files for a run: two read files, two fake indices, and a run directory.
pub struct RunFiles {
    pub dir: tempfile::TempDir,
}

impl RunFiles {
    pub fn new(reads1: &[(String, Vec<u8>)], reads2: &[(String, Vec<u8>)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("r1.fastq"), fastq(reads1)).unwrap();
        std::fs::write(dir.path().join("r2.fastq"), fastq(reads2)).unwrap();
        std::fs::write(dir.path().join("genome.1.ebwt"), b"").unwrap();
        std::fs::write(dir.path().join("rdna.1.ebwt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("runs")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn run_dir(&self) -> PathBuf {
        self.path().join("runs")
    }

    pub fn partial(&self, experiment_id: &str) -> PartialConfig {
        PartialConfig {
            experiment_id: Some(experiment_id.to_owned()),
            run_dir: Some(self.run_dir()),
            primary_index: Some(self.path().join("genome")),
            repeat_index: Some(self.path().join("rdna")),
            reads1: Some(self.path().join("r1.fastq")),
            reads2: Some(self.path().join("r2.fastq")),
            read_len: Some(READ_LEN),
            threads: Some(4),
            primary_tag: Some("genome".to_owned()),
            repeat_tag: Some("rdna".to_owned()),
            ..Default::default()
        }
    }

    pub fn config(&self, experiment_id: &str) -> RunConfig {
        self.partial(experiment_id).resolve().unwrap()
    }
}
