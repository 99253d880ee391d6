//! Rescue sequencing reads that straddle a repetitive region by progressively trimming
//! their 3' ends until they align uniquely.
//!
//! # Overview
//! Reads that overlap the boundary of a highly repetitive region often fail to align:
//! their tail either carries bases that do not match the reference exactly, or extends into
//! sequence that occurs many times. Shortening the tail a few bases at a time, and retrying
//! only the reads that are still unplaced, recovers many of them. This crate records the
//! length at which each read was rescued.
//!
//! ## Trim schedule
//! Every read loses one base at its 5' end (the *anchor*). Round 0 aligns the rest of the
//! read as is. Round `k` additionally trims `5 * k` bases from the 3' end, for `k` up to
//! `(read_len - 20) / 10`. See [`TrimSchedule`].
//!
//! ## Rescue chains
//! A [`RescueChain`] takes one read file through every round of the schedule against one
//! reference. Each round hands the still-unplaced reads to an [`AlignmentOracle`], which
//! aligns them exactly (no mismatches) and keeps only reads with a single placement.
//! Reads placed in a round form that round's [`RescueRecord`]; the rest go on to the next
//! round. Whatever is left at the end is kept as the chain's leftover.
//!
//! For 50 base reads the effective lengths are 49, 44, 39, and 34:
//! ```text
//! round  trim3  effective_len  rescued  remaining
//! 0      0      49             6        4
//! 1      5      44             0        4
//! 2      10     39             0        4
//! 3      15     34             3        1
//! ```
//!
//! ## Pipeline
//! A [`Pipeline`] runs four independent chains, one for each combination of read end
//! (R1, R2) and reference (the primary genome and the isolated repeat), optionally in
//! parallel. Each chain's records are converted to BED intervals with an
//! [`IntervalConverter`] and written per round and merged. A chain that fails does not
//! stop the others; every outcome is returned in a [`PipelineReport`].
//!
//! The bundled [`BowtieOracle`] runs the external `bowtie` aligner. Any other aligner can be
//! used by implementing [`AlignmentOracle`].

pub mod chain;
pub mod config;
pub mod errors;
pub mod fastq;
pub mod intervals;
pub mod layout;
pub mod oracle;
pub mod pipeline;
pub mod read;
pub mod reference;
pub mod schedule;

// commonly used functions and types

pub use crate::chain::*;
pub use crate::config::*;
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::fastq::*;
pub use crate::intervals::*;
pub use crate::layout::*;
pub use crate::oracle::*;
pub use crate::pipeline::*;
pub use crate::read::*;
pub use crate::reference::*;
pub use crate::schedule::*;
