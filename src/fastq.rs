use needletail::*;

use flate2::{write::GzEncoder, Compression};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::errors::*;
use crate::read::*;

/// Load every fastq record of a file into a batch.
///
/// Gzipped input is detected automatically. An empty file yields an empty batch.
pub fn load_fastq(file: impl AsRef<Path>) -> Result<ReadBatch> {
    let path = file.as_ref();
    let display = path.display().to_string();
    let origin = Arc::new(Origin::File(display.clone()));

    let metadata = std::fs::metadata(path).map_err(|e| Error::file_io(&display, e))?;
    if metadata.len() == 0 {
        return Ok(ReadBatch::empty(origin));
    }

    let reader = parse_fastx_file(path).map_err(|e| Error::file_io(&display, e))?;
    collect_records(reader, origin)
}

/// Load every fastq record of a byte slice into a batch.
pub fn load_fastq_bytes(bytes: &[u8]) -> Result<ReadBatch> {
    let origin = Arc::new(Origin::Bytes);
    if bytes.is_empty() {
        return Ok(ReadBatch::empty(origin));
    }

    let reader = parse_fastx_reader(bytes).map_err(|e| Error::BytesIo(Box::new(e)))?;
    collect_records(reader, origin)
}

fn collect_records(
    mut reader: Box<dyn FastxReader + '_>,
    origin: Arc<Origin>,
) -> Result<ReadBatch> {
    let mut reads = Vec::new();

    while let Some(record) = reader.next() {
        let idx = reads.len();
        let record = record.map_err(|e| Error::ParseRecord {
            origin: (*origin).clone(),
            idx,
            source: Box::new(e),
        })?;
        let Some(qual) = record.qual() else {
            return Err(Error::ParseRecord {
                origin: (*origin).clone(),
                idx,
                source: "record has no quality scores".into(),
            });
        };

        reads.push(Read::from_fastq(record.id(), &record.seq(), qual, idx));
    }

    ReadBatch::new(reads, origin)
}

pub fn write_fastq_record(
    writer: &mut (dyn Write + Send),
    record: (&[u8], &[u8], &[u8]),
) -> std::io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(record.0)?;
    writer.write_all(b"\n")?;
    writer.write_all(record.1)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(record.2)?;
    writer.write_all(b"\n")
}

/// Write a batch of reads as fastq, gzip-compressing when the path ends with `.gz`.
pub fn write_fastq<'a>(
    file: impl AsRef<Path>,
    reads: impl IntoIterator<Item = &'a Read>,
) -> Result<()> {
    let path = file.as_ref();
    let display = path.display().to_string();

    let write = || -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer: Box<dyn Write + Send> = if display.ends_with(".gz") {
            Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            Box::new(BufWriter::new(file))
        };

        for read in reads {
            write_fastq_record(&mut *writer, read.to_fastq())?;
        }
        writer.flush()
    };

    write().map_err(|e| Error::file_io(&display, e))
}
