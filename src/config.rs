use serde::Deserialize;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::*;
use crate::reference::*;

pub const DEFAULT_ALIGNER: &str = "bowtie";
pub const DEFAULT_PRIMARY_TAG: &str = "primary";
pub const DEFAULT_REPEAT_TAG: &str = "repeat";

/// Run settings as read from a YAML file or the command line, before validation.
///
/// ```yaml
/// experiment_id: sample42
/// run_dir: /scratch/runs
/// primary_index: /ref/hg38/hg38
/// repeat_index: /ref/rdna/rdna
/// reads1: sample42_R1.fastq.gz
/// reads2: sample42_R2.fastq.gz
/// read_len: 100
/// threads: 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub experiment_id: Option<String>,
    pub run_dir: Option<PathBuf>,
    pub primary_index: Option<PathBuf>,
    pub repeat_index: Option<PathBuf>,
    pub reads1: Option<PathBuf>,
    pub reads2: Option<PathBuf>,
    pub read_len: Option<usize>,
    pub threads: Option<usize>,
    pub seed: Option<u64>,
    pub aligner: Option<PathBuf>,
    pub round_timeout_secs: Option<u64>,
    pub sequential: Option<bool>,
    pub primary_tag: Option<String>,
    pub repeat_tag: Option<String>,
    pub compress_leftover: Option<bool>,
}

/// Validated settings for a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub experiment_id: String,
    pub run_dir: PathBuf,
    pub primary: ReferenceIndex,
    pub repeat: ReferenceIndex,
    pub reads1: PathBuf,
    pub reads2: PathBuf,
    pub read_len: usize,
    pub threads: usize,
    pub seed: u64,
    pub aligner: PathBuf,
    pub round_timeout: Option<Duration>,
    pub sequential: bool,
    pub compress_leftover: bool,
}

impl PartialConfig {
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(yaml).map_err(|e| Error::InvalidConfig {
            field: "config",
            reason: e.to_string(),
        })
    }

    pub fn from_yaml_file(file: impl AsRef<Path>) -> Result<Self> {
        let path = file.as_ref();
        let yaml = std::fs::read(path).map_err(|e| Error::file_io(path.display(), e))?;
        Self::from_yaml(&yaml)
    }

    /// Fill every value that is missing here with the one from `other`.
    pub fn or(self, other: PartialConfig) -> Self {
        Self {
            experiment_id: self.experiment_id.or(other.experiment_id),
            run_dir: self.run_dir.or(other.run_dir),
            primary_index: self.primary_index.or(other.primary_index),
            repeat_index: self.repeat_index.or(other.repeat_index),
            reads1: self.reads1.or(other.reads1),
            reads2: self.reads2.or(other.reads2),
            read_len: self.read_len.or(other.read_len),
            threads: self.threads.or(other.threads),
            seed: self.seed.or(other.seed),
            aligner: self.aligner.or(other.aligner),
            round_timeout_secs: self.round_timeout_secs.or(other.round_timeout_secs),
            sequential: self.sequential.or(other.sequential),
            primary_tag: self.primary_tag.or(other.primary_tag),
            repeat_tag: self.repeat_tag.or(other.repeat_tag),
            compress_leftover: self.compress_leftover.or(other.compress_leftover),
        }
    }

    /// Check that every required value is present and every path exists.
    ///
    /// Fails if the output directory of the experiment already exists.
    pub fn resolve(self) -> Result<RunConfig> {
        let experiment_id = self.experiment_id.ok_or(Error::MissingConfig("experiment_id"))?;
        let run_dir = self.run_dir.ok_or(Error::MissingConfig("run_dir"))?;
        let primary_index = self.primary_index.ok_or(Error::MissingConfig("primary_index"))?;
        let repeat_index = self.repeat_index.ok_or(Error::MissingConfig("repeat_index"))?;
        let reads1 = self.reads1.ok_or(Error::MissingConfig("reads1"))?;
        let reads2 = self.reads2.ok_or(Error::MissingConfig("reads2"))?;
        let read_len = self.read_len.ok_or(Error::MissingConfig("read_len"))?;
        let threads = self.threads.ok_or(Error::MissingConfig("threads"))?;

        check_name("experiment_id", &experiment_id)?;
        let primary_tag = self.primary_tag.unwrap_or_else(|| DEFAULT_PRIMARY_TAG.to_owned());
        let repeat_tag = self.repeat_tag.unwrap_or_else(|| DEFAULT_REPEAT_TAG.to_owned());
        check_name("primary_tag", &primary_tag)?;
        check_name("repeat_tag", &repeat_tag)?;
        if primary_tag == repeat_tag {
            return Err(Error::InvalidConfig {
                field: "repeat_tag",
                reason: format!("must differ from primary_tag \"{primary_tag}\""),
            });
        }

        if read_len == 0 {
            return Err(Error::InvalidConfig {
                field: "read_len",
                reason: "must be a positive integer".to_owned(),
            });
        }
        if threads == 0 {
            return Err(Error::InvalidConfig {
                field: "threads",
                reason: "must be at least 1".to_owned(),
            });
        }

        for reads in [&reads1, &reads2] {
            if !reads.is_file() {
                return Err(Error::MissingInput {
                    what: "read file",
                    path: reads.clone(),
                });
            }
        }

        let primary = ReferenceIndex::open(Reference::Primary, primary_tag, primary_index)?;
        let repeat = ReferenceIndex::open(Reference::Repeat, repeat_tag, repeat_index)?;

        let config = RunConfig {
            experiment_id,
            run_dir,
            primary,
            repeat,
            reads1,
            reads2,
            read_len,
            threads,
            seed: self.seed.unwrap_or(0),
            aligner: self.aligner.unwrap_or_else(|| PathBuf::from(DEFAULT_ALIGNER)),
            round_timeout: self.round_timeout_secs.map(Duration::from_secs),
            sequential: self.sequential.unwrap_or(false),
            compress_leftover: self.compress_leftover.unwrap_or(false),
        };

        if config.output_dir().exists() {
            return Err(Error::OutputExists(config.output_dir()));
        }

        Ok(config)
    }
}

impl RunConfig {
    /// Directory holding every output of the experiment.
    pub fn output_dir(&self) -> PathBuf {
        self.run_dir.join(&self.experiment_id)
    }

    pub fn index(&self, reference: Reference) -> &ReferenceIndex {
        match reference {
            Reference::Primary => &self.primary,
            Reference::Repeat => &self.repeat,
        }
    }

    pub fn reads(&self, read_end: ReadEnd) -> &Path {
        match read_end {
            ReadEnd::One => &self.reads1,
            ReadEnd::Two => &self.reads2,
        }
    }
}

fn check_name(field: &'static str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && name != "."
        && name != "..";

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            field,
            reason: format!(
                "\"{name}\" must be one or more alphanumeric characters, '_', '-', or '.'"
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            for file in ["r1.fq", "r2.fq", "hg.1.ebwt", "rdna.1.ebwt"] {
                std::fs::write(dir.path().join(file), b"").unwrap();
            }
            Self { dir }
        }

        fn yaml(&self) -> String {
            let d = self.dir.path().display();
            format!(
                "experiment_id: exp1
run_dir: {d}
primary_index: {d}/hg
repeat_index: {d}/rdna
reads1: {d}/r1.fq
reads2: {d}/r2.fq
read_len: 50
threads: 4
"
            )
        }
    }

    #[test]
    fn resolves_with_defaults() {
        let fixture = Fixture::new();
        let config = PartialConfig::from_yaml(fixture.yaml().as_bytes())
            .unwrap()
            .resolve()
            .unwrap();

        assert_eq!(config.experiment_id, "exp1");
        assert_eq!(config.read_len, 50);
        assert_eq!(config.seed, 0);
        assert_eq!(config.aligner, PathBuf::from("bowtie"));
        assert_eq!(config.round_timeout, None);
        assert!(!config.sequential);
        assert_eq!(config.primary.tag(), "primary");
        assert_eq!(config.index(Reference::Repeat).tag(), "repeat");
        assert_eq!(config.output_dir(), fixture.dir.path().join("exp1"));
    }

    #[test]
    fn every_required_field_is_checked() {
        let fixture = Fixture::new();
        let full = PartialConfig::from_yaml(fixture.yaml().as_bytes()).unwrap();

        let cases: [(&str, fn(&mut PartialConfig)); 8] = [
            ("experiment_id", |c| c.experiment_id = None),
            ("run_dir", |c| c.run_dir = None),
            ("primary_index", |c| c.primary_index = None),
            ("repeat_index", |c| c.repeat_index = None),
            ("reads1", |c| c.reads1 = None),
            ("reads2", |c| c.reads2 = None),
            ("read_len", |c| c.read_len = None),
            ("threads", |c| c.threads = None),
        ];

        for (field, clear) in cases {
            let mut partial = full.clone();
            clear(&mut partial);
            match partial.resolve() {
                Err(Error::MissingConfig(missing)) => assert_eq!(missing, field),
                other => panic!("expected missing {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn command_line_values_take_precedence() {
        let fixture = Fixture::new();
        let file = PartialConfig::from_yaml(fixture.yaml().as_bytes()).unwrap();
        let cli = PartialConfig {
            read_len: Some(76),
            seed: Some(9),
            ..Default::default()
        };

        let config = cli.or(file).resolve().unwrap();
        assert_eq!(config.read_len, 76);
        assert_eq!(config.seed, 9);
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn rejects_invalid_values() {
        let fixture = Fixture::new();
        let full = PartialConfig::from_yaml(fixture.yaml().as_bytes()).unwrap();

        let zero_len = PartialConfig {
            read_len: Some(0),
            ..full.clone()
        };
        assert!(matches!(zero_len.resolve(), Err(Error::InvalidConfig { field: "read_len", .. })));

        let bad_id = PartialConfig {
            experiment_id: Some("../escape".to_owned()),
            ..full.clone()
        };
        assert!(matches!(
            bad_id.resolve(),
            Err(Error::InvalidConfig { field: "experiment_id", .. })
        ));

        let same_tags = PartialConfig {
            primary_tag: Some("ref".to_owned()),
            repeat_tag: Some("ref".to_owned()),
            ..full.clone()
        };
        assert!(matches!(
            same_tags.resolve(),
            Err(Error::InvalidConfig { field: "repeat_tag", .. })
        ));

        let missing_reads = PartialConfig {
            reads2: Some(fixture.dir.path().join("absent.fq")),
            ..full
        };
        assert!(matches!(missing_reads.resolve(), Err(Error::MissingInput { .. })));
    }

    #[test]
    fn refuses_existing_output_dir() {
        let fixture = Fixture::new();
        std::fs::create_dir(fixture.dir.path().join("exp1")).unwrap();

        let err = PartialConfig::from_yaml(fixture.yaml().as_bytes())
            .unwrap()
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PartialConfig::from_yaml(b"read_length: 50\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "config", .. }));
    }
}
