//! Seed-and-extend failure and delegation counters.

/// Why seeded calls gave up, and how often regions went to the exact
/// aligner. Accumulated by the caller and merged across workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub calls: u64,
    pub aligned: u64,
    pub too_short: u64,
    pub cannot_sync: u64,
    pub off_template: u64,
    pub indels_too_close: u64,
    pub hard_start: u64,
    pub hard_middle: u64,
    pub hard_end: u64,
}

impl SeedStats {
    /// Calls that returned no result.
    pub fn failures(&self) -> u64 {
        self.too_short + self.cannot_sync + self.off_template + self.indels_too_close
    }

    pub fn merge(&mut self, other: &SeedStats) {
        self.calls += other.calls;
        self.aligned += other.aligned;
        self.too_short += other.too_short;
        self.cannot_sync += other.cannot_sync;
        self.off_template += other.off_template;
        self.indels_too_close += other.indels_too_close;
        self.hard_start += other.hard_start;
        self.hard_middle += other.hard_middle;
        self.hard_end += other.hard_end;
    }

    pub fn log_summary(&self, label: &str) {
        log::info!(
            "[{label}] seeded: {} calls, {} aligned, {} failed",
            self.calls,
            self.aligned,
            self.failures()
        );
        log::info!(
            "[{label}] seeded failures: too short {} cannot sync {} off template {} indels too close {}",
            self.too_short,
            self.cannot_sync,
            self.off_template,
            self.indels_too_close
        );
        log::info!(
            "[{label}] seeded delegations: start {} middle {} end {}",
            self.hard_start,
            self.hard_middle,
            self.hard_end
        );
    }
}
