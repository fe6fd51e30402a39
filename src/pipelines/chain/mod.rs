//! Priority-ordered aligner chain.
//!
//! # Module Organization
//!
//! - `dispatch` - `AlignerChain`, one per worker thread
//! - `factory` - `AlignerFactory`, shared and immutable, builds chains
//! - `stats` - `ChainStats` accumulator passed by the caller
//!
//! # Dispatch
//!
//! Heuristic aligners run first in configured order, each with the bound
//! shrunk to the best accepted score so far. The exact banded aligner always
//! runs last and only replaces the incumbent when strictly better, so a
//! tighter bound changes an outcome only by turning it into the sentinel.

use std::fmt;
use std::str::FromStr;

use crate::align_opt::ConfigError;

mod dispatch;
mod factory;
mod stats;

pub use dispatch::AlignerChain;
pub use factory::AlignerFactory;
pub use stats::{AlignerTally, ChainStats, CrossCheck};

/// Closed set of aligners the chain can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlignerKind {
    NoIndel,
    SingleIndel,
    Seeded,
    SplitRead,
    Banded,
}

impl AlignerKind {
    pub const ALL: [AlignerKind; 5] = [
        AlignerKind::NoIndel,
        AlignerKind::SingleIndel,
        AlignerKind::Seeded,
        AlignerKind::SplitRead,
        AlignerKind::Banded,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            AlignerKind::NoIndel => "noindel",
            AlignerKind::SingleIndel => "single",
            AlignerKind::Seeded => "seeded",
            AlignerKind::SplitRead => "split",
            AlignerKind::Banded => "banded",
        }
    }

    /// Only the exact aligner's results are trusted unconditionally.
    pub const fn is_exact(self) -> bool {
        matches!(self, AlignerKind::Banded)
    }
}

impl fmt::Display for AlignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlignerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlignerKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::AlignerOrder(format!("unknown aligner '{s}'")))
    }
}
