use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::*;

/// Files that mark a bowtie index with a given basename.
const INDEX_SUFFIXES: [&str; 2] = [".1.ebwt", ".1.ebwtl"];

/// Which reference a chain aligns against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reference {
    Primary,
    Repeat,
}

/// Which file of a read pair a chain processes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadEnd {
    One,
    Two,
}

/// Identifies one of the four rescue chains of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainKey {
    pub read_end: ReadEnd,
    pub reference: Reference,
}

impl ChainKey {
    /// All chains of a run, in the order they are reported.
    pub const ALL: [ChainKey; 4] = [
        ChainKey::new(ReadEnd::One, Reference::Primary),
        ChainKey::new(ReadEnd::One, Reference::Repeat),
        ChainKey::new(ReadEnd::Two, Reference::Primary),
        ChainKey::new(ReadEnd::Two, Reference::Repeat),
    ];

    pub const fn new(read_end: ReadEnd, reference: Reference) -> Self {
        Self {
            read_end,
            reference,
        }
    }
}

/// Read-only handle to a prebuilt alignment index.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceIndex {
    reference: Reference,
    tag: String,
    basename: PathBuf,
}

impl ReferenceIndex {
    /// Open the index at `basename`, tagged with `tag` in output file names.
    ///
    /// The basename must either exist itself or have bowtie index files next to it.
    pub fn open(
        reference: Reference,
        tag: impl Into<String>,
        basename: impl AsRef<Path>,
    ) -> Result<Self> {
        let basename = basename.as_ref().to_owned();

        let found = basename.exists()
            || INDEX_SUFFIXES.iter().any(|suffix| {
                let mut file = basename.clone().into_os_string();
                file.push(suffix);
                Path::new(&file).is_file()
            });
        if !found {
            return Err(Error::MissingInput {
                what: "reference index",
                path: basename,
            });
        }

        Ok(Self {
            reference,
            tag: tag.into(),
            basename,
        })
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn basename(&self) -> &Path {
        &self.basename
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Reference::*;
        match self {
            Primary => write!(f, "primary"),
            Repeat => write!(f, "repeat"),
        }
    }
}

impl fmt::Display for ReadEnd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ReadEnd::*;
        match self {
            One => write!(f, "R1"),
            Two => write!(f, "R2"),
        }
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.read_end, self.reference)
    }
}

impl fmt::Display for ReferenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} index \"{}\"", self.tag, self.basename.display())
    }
}
