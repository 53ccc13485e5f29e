// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

mod bitvec;
mod hierarchy;
mod markers;
pub mod simple;
mod sorted;
mod transitions;
mod vcd;
pub mod viewers;

/// Cargo.toml version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation time, normalized to nanoseconds.
pub type Time = u64;

#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum FileFormat {
    Vcd,
    Unknown,
}

#[derive(Debug, Copy, Clone)]
pub struct LoadOptions {
    /// Nanoseconds per tick used when the input does not declare a `$timescale`.
    pub default_timescale_ns: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            default_timescale_ns: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WavetraceError {
    #[error("failed to load VCD: {0}")]
    Vcd(#[from] VcdParseError),
    #[error("unknown file format, only VCD is supported")]
    UnknownFileFormat,
    #[error("io error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WavetraceError>;

pub use bitvec::{BitVector, FormatError, LogicState};
pub use hierarchy::{
    NetRef, ScopeRef, TraceBuilder, TraceDataModel, TraceDataModelBuilder, TreeNode,
};
pub use markers::{Marker, MarkerList};
pub use sorted::SortedVec;
pub use transitions::{Transition, TransitionCursor, TransitionVector};
pub use vcd::{LoadStats, VcdLoader, VcdParseError};
