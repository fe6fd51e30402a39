//! Per-aligner tallies for the dispatcher.

use std::time::Duration;

use super::AlignerKind;
use crate::core::alignment::seeding::SeedStats;
use crate::core::alignment::split_read::SplitStats;

/// Outcomes of one aligner kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignerTally {
    pub calls: u64,
    /// Returned no result.
    pub declined: u64,
    /// Proved nothing scores below the bound.
    pub sentinel: u64,
    pub accepted: u64,
    /// Rejected by the validator.
    pub invalid: u64,
    pub nanos: u64,
}

impl AlignerTally {
    pub fn average_latency(&self) -> Duration {
        if self.calls == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.nanos / self.calls)
    }

    fn merge(&mut self, other: &AlignerTally) {
        self.calls += other.calls;
        self.declined += other.declined;
        self.sentinel += other.sentinel;
        self.accepted += other.accepted;
        self.invalid += other.invalid;
        self.nanos += other.nanos;
    }
}

/// Comparison of returned results with an unbounded exact run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossCheck {
    pub correct: u64,
    /// Scored below the band optimum (structural or off-band alternatives).
    pub too_low: u64,
    /// Scored above the band optimum, or a sentinel where an alignment exists.
    pub too_high: u64,
}

/// Statistics accumulated over many chain calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub calls: u64,
    pub reverse_complement: u64,
    pub no_alignment: u64,
    tallies: [AlignerTally; AlignerKind::ALL.len()],
    pub cross_check: CrossCheck,
    pub seed: SeedStats,
    pub split: SplitStats,
}

impl ChainStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self, kind: AlignerKind) -> &AlignerTally {
        &self.tallies[kind.index()]
    }

    pub fn tally_mut(&mut self, kind: AlignerKind) -> &mut AlignerTally {
        &mut self.tallies[kind.index()]
    }

    pub fn merge(&mut self, other: &ChainStats) {
        self.calls += other.calls;
        self.reverse_complement += other.reverse_complement;
        self.no_alignment += other.no_alignment;
        for (mine, theirs) in self.tallies.iter_mut().zip(other.tallies.iter()) {
            mine.merge(theirs);
        }
        self.cross_check.correct += other.cross_check.correct;
        self.cross_check.too_low += other.cross_check.too_low;
        self.cross_check.too_high += other.cross_check.too_high;
        self.seed.merge(&other.seed);
        self.split.merge(&other.split);
    }

    pub fn log_summary(&self, label: &str) {
        log::info!(
            "[{label}] {} calls ({} reverse complement), {} without alignment",
            self.calls,
            self.reverse_complement,
            self.no_alignment
        );
        for kind in AlignerKind::ALL {
            let t = self.tally(kind);
            if t.calls == 0 {
                continue;
            }
            log::info!(
                "[{label}] {:>8}: calls {} null {} sentinel {} accepted {} invalid {} avg {:?}",
                kind.name(),
                t.calls,
                t.declined,
                t.sentinel,
                t.accepted,
                t.invalid,
                t.average_latency()
            );
        }
        let c = &self.cross_check;
        if c.correct + c.too_low + c.too_high > 0 {
            log::info!(
                "[{label}] cross-check: correct {} too low {} too high {}",
                c.correct,
                c.too_low,
                c.too_high
            );
        }
        if self.seed.calls > 0 {
            self.seed.log_summary(label);
        }
        if self.split != SplitStats::default() {
            self.split.log_summary(label);
        }
    }
}
