use std::time::Instant;

use super::stats::ChainStats;
use super::AlignerKind;
use crate::core::alignment::actions::{ActionSequence, NO_ALIGNMENT};
use crate::core::alignment::banded::BandedAligner;
use crate::core::alignment::no_indel::NoIndelAligner;
use crate::core::alignment::request::AlignRequest;
use crate::core::alignment::reverse_complement::ReverseComplementAdapter;
use crate::core::alignment::seeding::SeededAligner;
use crate::core::alignment::single_indel::SingleIndelAligner;
use crate::core::alignment::soft_clip::SoftClipper;
use crate::core::alignment::split_read::SplitReadAligner;
use crate::core::alignment::validator::Validator;

/// Forward-strand kernels of one chain.
#[derive(Debug)]
pub(super) struct Kernels {
    pub(super) heuristics: Vec<AlignerKind>,
    pub(super) no_indel: Option<NoIndelAligner>,
    pub(super) single_indel: Option<SingleIndelAligner>,
    pub(super) seeded: Option<SeededAligner>,
    pub(super) split: Option<SplitReadAligner>,
    pub(super) banded: BandedAligner,
    pub(super) validator: Validator,
    pub(super) validate_heuristics: bool,
    pub(super) cross_check: bool,
}

impl Kernels {
    fn run(&mut self, kind: AlignerKind, req: &AlignRequest, stats: &mut ChainStats) -> Option<ActionSequence> {
        match kind {
            AlignerKind::NoIndel => self.no_indel.as_ref()?.align(req),
            AlignerKind::SingleIndel => self.single_indel.as_mut()?.align(req),
            AlignerKind::Seeded => self.seeded.as_mut()?.align(req, &mut stats.seed),
            AlignerKind::SplitRead => self.split.as_mut()?.align(req, &mut stats.split),
            AlignerKind::Banded => Some(self.banded.align(req)),
        }
    }

    /// Run the chain on a forward-strand request.
    pub(super) fn dispatch(&mut self, req: &AlignRequest, stats: &mut ChainStats) -> ActionSequence {
        let mut bound = req.max_score;
        let mut incumbent: Option<(AlignerKind, ActionSequence)> = None;

        for i in 0..self.heuristics.len() {
            if bound <= 0 {
                break;
            }
            let kind = self.heuristics[i];
            let bounded = req.with_max_score(bound);
            let timer = Instant::now();
            let result = self.run(kind, &bounded, stats);
            let tally = stats.tally_mut(kind);
            tally.calls += 1;
            tally.nanos += timer.elapsed().as_nanos() as u64;
            let Some(result) = result else {
                tally.declined += 1;
                continue;
            };
            if result.is_no_alignment() {
                tally.sentinel += 1;
                continue;
            }
            if self.validate_heuristics {
                if let Err(violation) = self.validator.validate_actions(&result, req.read, req.template, bound) {
                    log::debug!("{kind} result rejected: {violation}");
                    stats.tally_mut(kind).invalid += 1;
                    continue;
                }
            }
            stats.tally_mut(kind).accepted += 1;
            bound = result.score();
            incumbent = Some((kind, result));
        }

        if bound > 0 {
            let bounded = req.with_max_score(bound);
            let timer = Instant::now();
            let exact = self.banded.align(&bounded);
            let tally = stats.tally_mut(AlignerKind::Banded);
            tally.calls += 1;
            tally.nanos += timer.elapsed().as_nanos() as u64;
            if exact.is_no_alignment() {
                tally.sentinel += 1;
            } else {
                tally.accepted += 1;
                incumbent = Some((AlignerKind::Banded, exact));
            }
        }

        let result = match incumbent {
            Some((kind, result)) => {
                log::debug!(
                    "{kind} won: score {} at {}",
                    result.score(),
                    result.template_start()
                );
                result
            }
            None => ActionSequence::no_alignment(req.template_start),
        };

        if self.cross_check {
            self.check_against_exact(req, &result, stats);
        }
        result
    }

    fn check_against_exact(&mut self, req: &AlignRequest, result: &ActionSequence, stats: &mut ChainStats) {
        let exact = self.banded.align(&req.with_max_score(NO_ALIGNMENT));
        let expected = if exact.score() < req.max_score {
            exact.score()
        } else {
            NO_ALIGNMENT
        };
        let c = &mut stats.cross_check;
        match result.score().cmp(&expected) {
            std::cmp::Ordering::Equal => c.correct += 1,
            std::cmp::Ordering::Less => c.too_low += 1,
            std::cmp::Ordering::Greater => {
                log::warn!(
                    "chain returned {} where the exact aligner finds {} (start {})",
                    result.score(),
                    exact.score(),
                    req.template_start
                );
                c.too_high += 1;
            }
        }
    }
}

/// One worker's aligner chain. Owns every scratch buffer it uses, so it is
/// cheap to call repeatedly but must not be shared between threads.
#[derive(Debug)]
pub struct AlignerChain {
    pub(super) kernels: Kernels,
    pub(super) rc: ReverseComplementAdapter,
    pub(super) clipper: Option<SoftClipper>,
}

impl AlignerChain {
    /// Heuristic aligners in the order they run; the exact aligner follows.
    pub fn heuristics(&self) -> &[AlignerKind] {
        &self.kernels.heuristics
    }

    /// Align `req.read` (or its reverse complement when `reverse_complement`
    /// is set) against `req.template`. The result is in forward template
    /// coordinates.
    pub fn align(&mut self, req: &AlignRequest, reverse_complement: bool, stats: &mut ChainStats) -> ActionSequence {
        stats.calls += 1;
        if reverse_complement {
            stats.reverse_complement += 1;
        }
        let kernels = &mut self.kernels;
        let result = match &self.clipper {
            None => self
                .rc
                .align(req, reverse_complement, |fwd| kernels.dispatch(fwd, stats)),
            // The bound applies to the clipped score.
            Some(clipper) => {
                let unbounded = req.with_max_score(NO_ALIGNMENT);
                let full = self
                    .rc
                    .align(&unbounded, reverse_complement, |fwd| kernels.dispatch(fwd, stats));
                let clipped = if full.is_no_alignment() { full } else { clipper.clip(&full) };
                if clipped.score() >= req.max_score {
                    ActionSequence::no_alignment(req.template_start)
                } else {
                    clipped
                }
            }
        };
        if result.is_no_alignment() {
            stats.no_alignment += 1;
        }
        result
    }

    /// Run a single kernel without the chain, for comparisons and tests.
    pub fn align_with(
        &mut self,
        kind: AlignerKind,
        req: &AlignRequest,
        reverse_complement: bool,
        stats: &mut ChainStats,
    ) -> Option<ActionSequence> {
        let kernels = &mut self.kernels;
        self.rc
            .align(req, reverse_complement, |fwd| kernels.run(kind, fwd, stats))
    }
}
