use rustc_hash::FxHashSet;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::*;
use crate::fastq::write_fastq;
use crate::oracle::*;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Only the end of the aligner's stderr is kept in error messages.
const STDERR_TAIL: usize = 2048;

/// Runs the external `bowtie` short-read aligner once per round.
///
/// Reads are written to `reads.fastq` in the round's work directory, hits are written
/// to `hits.txt` and the aligner's stderr to `bowtie.log`. None of these are removed.
pub struct BowtieOracle {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl BowtieOracle {
    const NAME: &'static str = "bowtie";

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the aligner and fail the round if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(
        &self,
        index: &ReferenceIndex,
        params: &AlignParams,
        reads_path: &Path,
        hits_path: &Path,
    ) -> Command {
        #[rustfmt::skip]
        let args: [&str; 14] = [
            "-q",                                   // Fastq input,
            "--phred33",                            // Sanger quality encoding,
            "-5", &params.trim.anchor5.to_string(), // Clip the 5' anchor,
            "-3", &params.trim.trim3.to_string(),   // Clip this round's 3' tail,
            "-v", &params.mismatches.to_string(),   // Allowed mismatches,
            "-m", &params.max_hits.to_string(),     // Suppress reads with more alignments,
            "--seed", &params.seed.to_string(),     // Reproducible tie-breaking,
            "-p", &params.threads.to_string(),      // Aligner threads.
        ];

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .arg(index.basename())
            .arg(reads_path)
            .arg(hits_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let program = self.program.display().to_string();

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| Error::file_io(&program, e));
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|e| Error::file_io(&program, e))? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                // the round has failed either way, so errors from killing are not interesting
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::AlignerTimeout {
                    program,
                    secs: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl AlignmentOracle for BowtieOracle {
    fn align(
        &self,
        reads: &ReadBatch,
        index: &ReferenceIndex,
        params: &AlignParams,
    ) -> Result<AlignmentResult> {
        if reads.is_empty() {
            return Ok(HitTable::new().partition(reads));
        }

        let work_dir = &params.work_dir;
        fs::create_dir_all(work_dir).map_err(|e| Error::file_io(work_dir.display(), e))?;

        let reads_path = work_dir.join("reads.fastq");
        let hits_path = work_dir.join("hits.txt");
        let log_path = work_dir.join("bowtie.log");
        write_fastq(&reads_path, reads)?;

        let log = File::create(&log_path).map_err(|e| Error::file_io(log_path.display(), e))?;
        let mut command = self.command(index, params, &reads_path, &hits_path);
        command.stderr(log);

        tracing::debug!(command = ?command, "running aligner");
        let mut child = command.spawn().map_err(|source| Error::AlignerSpawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let status = self.wait(&mut child)?;

        if !status.success() {
            let stderr = fs::read(&log_path).unwrap_or_default();
            let tail = &stderr[stderr.len().saturating_sub(STDERR_TAIL)..];
            return Err(Error::AlignerFailed {
                program: self.program.display().to_string(),
                status: status.to_string(),
                stderr: utf8(tail).trim().to_owned(),
            });
        }

        let file = File::open(&hits_path).map_err(|e| Error::file_io(hits_path.display(), e))?;
        let table = parse_hits(BufReader::new(file), &hits_path.display().to_string(), reads)?;
        Ok(table.partition(reads))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// Parse bowtie's default tab-separated output.
///
/// Columns are read name, strand, reference name, 0-based offset, aligned sequence,
/// qualities, and optional trailing columns which are ignored. Every hit must name
/// a read of `reads`.
pub fn parse_hits(reader: impl BufRead, file: &str, reads: &ReadBatch) -> Result<HitTable> {
    let ids = reads.iter().map(|r| r.id()).collect::<FxHashSet<_>>();
    let mut table = HitTable::new();

    for (i, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| Error::file_io(file, e))?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let malformed = |reason: &str| Error::MalformedHits {
            file: file.to_owned(),
            line: i + 1,
            reason: reason.to_owned(),
        };

        let fields = line.split(|&b| b == b'\t').collect::<Vec<_>>();
        let &[name, strand, contig, offset, seq, ..] = fields.as_slice() else {
            return Err(malformed("expected at least 5 tab-separated columns"));
        };

        let id = read_id(name);
        if !ids.contains(id) {
            return Err(malformed(&format!("unknown read \"{}\"", utf8(id))));
        }
        let strand = Strand::new(strand).ok_or_else(|| malformed("strand must be '+' or '-'"))?;
        let start = std::str::from_utf8(offset)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| malformed("offset is not a non-negative integer"))?;
        if seq.is_empty() {
            return Err(malformed("empty aligned sequence"));
        }

        table.insert(
            id,
            Placement {
                contig: utf8(read_id(contig)),
                start,
                len: seq.len(),
                strand,
            },
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fastq::load_fastq_bytes;
    use crate::schedule::TrimSpec;

    fn batch() -> ReadBatch {
        load_fastq_bytes(
            b"@r1 1:N\nACGTACGT\n+\nIIIIIIII\n\
              @r2\nTTTTAAAA\n+\nIIIIIIII\n\
              @r3\nGGGGCCCC\n+\nIIIIIIII\n",
        )
        .unwrap()
    }

    #[test]
    fn parses_default_output() {
        let hits = b"r1\t+\tchr1 description\t100\tCGTACGT\tIIIIIII\t0\t\n\
                     r3\t-\trDNA\t7\tGGGCCCC\tIIIIIII\t0\t\n";
        let table = parse_hits(&hits[..], "hits.txt", &batch()).unwrap();
        let result = table.partition(&batch());

        assert_eq!(result.mapped.len(), 2);
        assert_eq!(
            result.mapped[0].placement,
            Placement {
                contig: "chr1".to_owned(),
                start: 100,
                len: 7,
                strand: Strand::Forward,
            }
        );
        assert_eq!(result.mapped[1].placement.strand, Strand::Reverse);
        assert_eq!(result.unmapped.len(), 1);
        assert_eq!(result.unmapped.reads()[0].id(), b"r2");
    }

    #[test]
    fn rejects_unknown_reads_and_bad_offsets() {
        let parse = |hits: &[u8]| parse_hits(hits, "hits.txt", &batch());

        let err = parse(b"r9\t+\tchr1\t1\tACGT\tIIII\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHits { line: 1, .. }), "{err}");

        let err = parse(b"\nr1\t+\tchr1\t-4\tACGT\tIIII\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHits { line: 2, .. }), "{err}");

        let err = parse(b"r1\t*\tchr1\t4\tACGT\tIIII\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHits { .. }), "{err}");
    }

    #[test]
    fn command_line_carries_round_parameters() {
        let oracle = BowtieOracle::new("bowtie");
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hg.1.ebwt"), b"").unwrap();
        let index =
            ReferenceIndex::open(Reference::Primary, "genome", dir.path().join("hg")).unwrap();
        let params = AlignParams {
            trim: TrimSpec { anchor5: 1, trim3: 15 },
            mismatches: 0,
            max_hits: 1,
            seed: 7,
            threads: 2,
            work_dir: dir.path().to_owned(),
        };

        let command = oracle.command(&index, &params, Path::new("in.fq"), Path::new("out.txt"));
        let args = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        let flag = |name: &str| {
            let i = args.iter().position(|a| a == name).unwrap();
            args[i + 1].clone()
        };
        assert_eq!(flag("-5"), "1");
        assert_eq!(flag("-3"), "15");
        assert_eq!(flag("-v"), "0");
        assert_eq!(flag("-m"), "1");
        assert_eq!(flag("--seed"), "7");
        assert_eq!(flag("-p"), "2");
        assert_eq!(&args[args.len() - 2..], ["in.fq", "out.txt"]);
    }

    #[test]
    fn empty_batch_skips_the_aligner() {
        let oracle = BowtieOracle::new("/nonexistent/bowtie");
        let dir = tempfile::tempdir().unwrap();
        let index = ReferenceIndex::open(Reference::Repeat, "repeat", dir.path()).unwrap();
        let empty = load_fastq_bytes(b"").unwrap();
        let params = AlignParams {
            trim: TrimSpec { anchor5: 1, trim3: 0 },
            mismatches: 0,
            max_hits: 1,
            seed: 0,
            threads: 1,
            work_dir: dir.path().join("round0"),
        };

        let result = oracle.align(&empty, &index, &params).unwrap();
        assert!(result.mapped.is_empty());
        assert!(result.unmapped.is_empty());
    }
}
