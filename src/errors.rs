use thiserror;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading or writing \"{file}\": {source}")]
    FileIo { file: String, source: BoxedError },

    #[error("Error reading bytes: {0}")]
    BytesIo(BoxedError),

    #[error("Error parsing record {idx} in {origin}: {source}")]
    ParseRecord {
        origin: Origin,
        idx: usize,
        source: BoxedError,
    },

    #[error("Missing required configuration value \"{0}\"")]
    MissingConfig(&'static str),

    #[error("Invalid configuration value for \"{field}\": {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Cannot find the {what} at \"{}\"", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("Output directory \"{}\" already exists, refusing to overwrite", .0.display())]
    OutputExists(PathBuf),

    #[error("Could not run aligner \"{program}\": {source}")]
    AlignerSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Aligner \"{program}\" failed with {status}: {stderr}")]
    AlignerFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Aligner \"{program}\" did not finish within {secs} seconds")]
    AlignerTimeout { program: String, secs: u64 },

    #[error("Malformed aligner output on line {line} of \"{file}\": {reason}")]
    MalformedHits {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Aligner split {input} reads into {mapped} mapped and {unmapped} unmapped")]
    BrokenPartition {
        input: usize,
        mapped: usize,
        unmapped: usize,
    },

    #[error("Aligner returned read \"{id}\" that was not in its input or was classified twice")]
    UnexpectedRead { id: String },

    #[error("Alignment failed in round {round} of chain {chain}: {source}")]
    Oracle {
        chain: String,
        round: usize,
        source: Box<Error>,
    },

    #[error("Could not convert round {round} of chain {chain} to intervals: {reason}")]
    Conversion {
        chain: String,
        round: usize,
        reason: String,
    },

    #[error("Cannot load the {read_end} reads: {source}")]
    ReadsUnavailable {
        read_end: String,
        source: Arc<Error>,
    },

    #[error("Chain {0} panicked")]
    ChainPanicked(String),
}

/// Coarse classification of errors, used when reporting per-chain outcomes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    OracleInvocation,
    Conversion,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            MissingConfig(_) | InvalidConfig { .. } | MissingInput { .. } | OutputExists(_) => {
                ErrorKind::Configuration
            }
            Oracle { .. }
            | AlignerSpawn { .. }
            | AlignerFailed { .. }
            | AlignerTimeout { .. }
            | MalformedHits { .. }
            | BrokenPartition { .. }
            | UnexpectedRead { .. }
            | ChainPanicked(_) => ErrorKind::OracleInvocation,
            Conversion { .. } => ErrorKind::Conversion,
            FileIo { .. } | BytesIo(_) | ParseRecord { .. } => ErrorKind::Io,
            ReadsUnavailable { source, .. } => source.kind(),
        }
    }

    pub(crate) fn file_io(file: impl fmt::Display, source: impl Into<BoxedError>) -> Self {
        Error::FileIo {
            file: file.to_string(),
            source: source.into(),
        }
    }
}

/// Where a batch of reads came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    File(String),
    Bytes,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Origin::*;
        match self {
            File(file) => write!(f, "file: \"{}\"", file),
            Bytes => write!(f, "bytes"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorKind::*;
        match self {
            Configuration => write!(f, "configuration"),
            OracleInvocation => write!(f, "alignment"),
            Conversion => write!(f, "conversion"),
            Io => write!(f, "io"),
        }
    }
}

pub fn utf8(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}
