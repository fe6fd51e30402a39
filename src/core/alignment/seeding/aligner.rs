use crate::align_opt::SeedParams;
use crate::core::alignment::actions::{classify, template_base, Action, ActionSequence, NO_ALIGNMENT};
use crate::core::alignment::banded::BandedAligner;
use crate::core::alignment::penalties::Penalties;
use crate::core::alignment::request::AlignRequest;

use super::index::{blocks_from_chain, chain_hits, extend_blocks, Block, KmerIndex, SeedHit};
use super::stats::SeedStats;
use super::walk::{walk, Region};

/// Seed-and-extend aligner handle. Owns its index and buffers.
#[derive(Debug)]
pub struct SeededAligner {
    penalties: Penalties,
    params: SeedParams,
    index: KmerIndex,
    banded: BandedAligner,
    hits: Vec<SeedHit>,
    reversed_read: Vec<u8>,
    reversed_template: Vec<u8>,
}

/// Largest number of non-matches a gap of `len` bases may hold before it is
/// handed to the exact aligner.
fn allowed_misses(params: &SeedParams, len: usize) -> usize {
    ((len as f64 * params.max_mismatch_density).ceil() as usize).max(1)
}

struct Diagonal<'a> {
    read: &'a [u8],
    template: &'a [u8],
    start: i64,
}

impl Diagonal<'_> {
    #[inline]
    fn classify(&self, i: usize, d: i32) -> Action {
        classify(self.read[i], template_base(self.template, self.start + i as i64 + d as i64))
    }

    fn misses(&self, from: usize, to: usize, d: i32) -> usize {
        (from..to).filter(|&i| self.classify(i, d) != Action::Match).count()
    }

    fn push(&self, actions: &mut ActionSequence, from: usize, to: usize, d: i32) {
        for i in from..to {
            actions.push(self.classify(i, d), 1);
        }
    }
}

impl SeededAligner {
    pub fn new(penalties: Penalties, params: SeedParams) -> Self {
        Self {
            banded: BandedAligner::new(penalties),
            penalties,
            params,
            index: KmerIndex::new(),
            hits: Vec::new(),
            reversed_read: Vec::new(),
            reversed_template: Vec::new(),
        }
    }

    pub fn params(&self) -> &SeedParams {
        &self.params
    }

    /// Returns `None` when seeding fails or the call is arm-anchored.
    pub fn align(&mut self, req: &AlignRequest, stats: &mut SeedStats) -> Option<ActionSequence> {
        if req.arm.is_some() {
            return None;
        }
        stats.calls += 1;
        let k = self.params.seed_len;
        let read = req.read;
        let template = req.template;
        let n = read.len();
        let shift = req.shift();
        if n < 2 * k {
            stats.too_short += 1;
            return None;
        }
        if req.max_score <= 0 {
            return Some(ActionSequence::no_alignment(req.template_start));
        }

        self.index.build(read, k);
        self.index
            .find_hits(n, template, req.template_start, shift, &mut self.hits);
        let chain = chain_hits(&self.hits, k, self.params.max_indel);
        if chain.len() < self.params.min_chain_seeds.max(1) {
            stats.cannot_sync += 1;
            return None;
        }
        let mut blocks = blocks_from_chain(&chain, k);
        extend_blocks(&mut blocks, read, template, req.template_start);
        let s = req.template_start as i64;
        for b in &blocks {
            if s + b.start as i64 + (b.diagonal as i64) < 0
                || s + b.end as i64 + b.diagonal as i64 > template.len() as i64
            {
                stats.off_template += 1;
                return None;
            }
        }
        let (Some(&first), Some(&last)) = (blocks.first(), blocks.last()) else {
            stats.cannot_sync += 1;
            return None;
        };
        let diag = Diagonal {
            read,
            template,
            start: s,
        };
        let mut indels: Vec<usize> = Vec::new();

        // Towards the read start, walking the mirrored prefix.
        let head_end = s + first.start as i64 + first.diagonal as i64;
        let mut rev_read = std::mem::take(&mut self.reversed_read);
        let mut rev_template = std::mem::take(&mut self.reversed_template);
        rev_read.clear();
        rev_read.extend(read[..first.start].iter().rev());
        rev_template.clear();
        rev_template.extend(template[..head_end.clamp(0, template.len() as i64) as usize].iter().rev());
        let head = walk(
            &mut self.banded,
            &self.params,
            &rev_read,
            &rev_template,
            0,
            Region::Start,
            stats,
        );
        self.reversed_read = rev_read;
        self.reversed_template = rev_template;
        let head = head?;
        indels.extend(head.indels.iter().map(|&i| first.start - i));

        let start = head_end - head.template_span;
        let mut actions = ActionSequence::new(0, start as i32);
        actions.extend_runs(head.actions.runs().iter().rev().copied());

        for (bi, block) in blocks.iter().enumerate() {
            actions.push(Action::Match, (block.end - block.start) as u32);
            if let Some(next) = blocks.get(bi + 1) {
                self.resolve_gap(&diag, block, next, &mut actions, &mut indels, stats)?;
            }
        }

        let tail_start = s + last.end as i64 + last.diagonal as i64;
        let tail = walk(
            &mut self.banded,
            &self.params,
            &read[last.end..],
            template,
            tail_start,
            Region::End,
            stats,
        )?;
        indels.extend(tail.indels.iter().map(|&i| last.end + i));
        actions.extend_runs(tail.actions.operations());

        indels.sort_unstable();
        if indels.windows(2).any(|w| w[1] - w[0] < self.params.indel_spacing) {
            stats.indels_too_close += 1;
            return None;
        }
        if !self.within_band(&actions, template.len(), req) {
            stats.off_template += 1;
            return None;
        }

        let score = self.penalties.score_operations(actions.operations());
        stats.aligned += 1;
        log::debug!(
            "seeded: {} blocks, {} indels, score {score} at {}",
            blocks.len(),
            indels.len(),
            actions.template_start()
        );
        if score >= req.max_score {
            return Some(ActionSequence::no_alignment(req.template_start));
        }
        actions.set_score(score);
        Some(actions)
    }

    /// Fill the read between `block` and `next`.
    fn resolve_gap(
        &mut self,
        diag: &Diagonal,
        block: &Block,
        next: &Block,
        actions: &mut ActionSequence,
        indels: &mut Vec<usize>,
        stats: &mut SeedStats,
    ) -> Option<()> {
        let (q0, q1) = (block.end, next.start);
        let shift = next.diagonal - block.diagonal;
        let allowed = allowed_misses(&self.params, q1 - q0);
        let delegate = |banded: &mut BandedAligner, actions: &mut ActionSequence, half_width: u32| {
            let t0 = diag.start + q0 as i64 + block.diagonal as i64;
            let t1 = diag.start + q1 as i64 + next.diagonal as i64;
            let piece = banded.align_fixed_both(
                diag.read,
                q0,
                q1,
                diag.template,
                t0 as i32,
                t1 as i32,
                NO_ALIGNMENT,
                half_width,
            );
            if piece.is_no_alignment() {
                return None;
            }
            actions.extend_runs(piece.operations());
            Some(())
        };

        if shift == 0 {
            if diag.misses(q0, q1, block.diagonal) > allowed {
                stats.hard_middle += 1;
                return delegate(&mut self.banded, actions, self.params.max_indel);
            }
            diag.push(actions, q0, q1, block.diagonal);
            return Some(());
        }

        let len = shift.unsigned_abs();
        let l = len as usize;
        let sub = |i: usize, d: i32| self.penalties.substitution_cost(diag.classify(i, d));
        // Read offsets after the indel continue on the next diagonal.
        let resume = |kp: usize| if shift > 0 { kp } else { kp + l };
        let last_kp = if shift > 0 { q1 } else { q1.saturating_sub(l).max(q0) };

        let mut before = 0i32;
        let after_total: i32 = (resume(q0).min(q1)..q1).map(|i| sub(i, next.diagonal)).sum();
        let mut after = after_total;
        let mut best: Option<(i32, usize)> = None;
        for kp in q0..=last_kp {
            if kp > q0 {
                before += sub(kp - 1, block.diagonal);
                after -= sub(resume(kp) - 1, next.diagonal);
            }
            let cost = before + after;
            if best.map_or(true, |(c, _)| cost < c) {
                best = Some((cost, kp));
            }
        }
        let (_, kp) = best?;
        let misses = diag.misses(q0, kp, block.diagonal) + diag.misses(resume(kp), q1, next.diagonal);
        if misses > allowed {
            stats.hard_middle += 1;
            return delegate(&mut self.banded, actions, self.params.max_indel.max(len));
        }
        diag.push(actions, q0, kp, block.diagonal);
        if shift > 0 {
            actions.push(Action::DeleteTemplateBase, len);
        } else {
            actions.push(Action::InsertReadBase, len);
        }
        diag.push(actions, resume(kp), q1, next.diagonal);
        indels.push(kp);
        Some(())
    }

    /// The path stays on the template and inside the band.
    fn within_band(&self, actions: &ActionSequence, template_len: usize, req: &AlignRequest) -> bool {
        let start = actions.template_start() as i64;
        if start < 0 || actions.template_end() as i64 > template_len as i64 {
            return false;
        }
        let expected = req.template_start as i64;
        let shift = req.shift() as i64;
        let mut r = 0i64;
        let mut t = start;
        if (t - expected).abs() > shift {
            return false;
        }
        for (action, len) in actions.operations() {
            if action.consumes_read() {
                r += len as i64;
            }
            if action.consumes_template() {
                t += len as i64;
            }
            if (t - expected - r).abs() > shift {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::validator::Validator;
    use crate::core::compute::encoding::encode_dna;

    const TEMPLATE: &str = "TTGACCATGGCATTACGGATCCGTAGCTTGACAAGTCGTTACGCATGGACTTGCAGTCATCGGATAACTG";

    fn aligner() -> SeededAligner {
        SeededAligner::new(Penalties::default(), SeedParams::default())
    }

    fn check(read: &[u8], template: &[u8], a: &ActionSequence) {
        let validator = Validator::new(Penalties::default());
        validator
            .validate_actions(a, read, template, NO_ALIGNMENT)
            .unwrap();
    }

    #[test]
    fn test_exact_read() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let read = template[10..50].to_vec();
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10).with_max_shift(4);
        let a = aligner().align(&req, &mut stats).unwrap();
        assert_eq!((a.score(), a.template_start(), a.run_string().as_str()), (0, 10, "40="));
        assert_eq!(stats.aligned, 1);
    }

    #[test]
    fn test_shifted_read() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let read = template[12..52].to_vec();
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10).with_max_shift(4);
        let a = aligner().align(&req, &mut stats).unwrap();
        assert_eq!((a.score(), a.template_start()), (0, 12));
    }

    #[test]
    fn test_mismatches_and_deletion() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let mut read = template[10..30].to_vec();
        read.extend_from_slice(&template[32..55]);
        read[5] = if read[5] == 1 { 2 } else { 1 };
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10).with_max_shift(4);
        let a = aligner().align(&req, &mut stats).unwrap();
        check(&read, &template, &a);
        assert_eq!(a.template_start(), 10);
        assert_eq!(a.template_end(), 55);
        assert_eq!(a.score(), 9 + 19 + 2);
    }

    #[test]
    fn test_too_short_and_declines() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let read = template[10..20].to_vec();
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10);
        assert!(aligner().align(&req, &mut stats).is_none());
        assert_eq!(stats.too_short, 1);
        let long = template[10..50].to_vec();
        let req = AlignRequest::new(&long, &template, 10)
            .with_arm(Some(crate::core::alignment::request::Arm::Left));
        assert!(aligner().align(&req, &mut stats).is_none());
    }

    #[test]
    fn test_cannot_sync_on_unrelated_template() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let read = encode_dna(b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10);
        assert!(aligner().align(&req, &mut stats).is_none());
        assert_eq!(stats.cannot_sync, 1);
    }

    #[test]
    fn test_read_off_template_end() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let mut read = template[40..70].to_vec();
        read.extend(encode_dna(b"ACGTAC"));
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 40).with_max_shift(4);
        assert!(aligner().align(&req, &mut stats).is_none());
        assert_eq!(stats.hard_end, 1);
        assert_eq!(stats.off_template, 1);
        assert_eq!(stats.aligned, 0);
    }

    #[test]
    fn test_indels_too_close() {
        // Deletions of template bases 27 and 34, six read bases apart.
        let template = encode_dna(TEMPLATE.as_bytes());
        let mut read = template[10..27].to_vec();
        read.extend_from_slice(&template[28..34]);
        read.extend_from_slice(&template[35..60]);
        let short_seeds = SeedParams {
            seed_len: 4,
            ..SeedParams::default()
        };
        let req = AlignRequest::new(&read, &template, 10).with_max_shift(4);

        let mut stats = SeedStats::default();
        let mut seeded = SeededAligner::new(Penalties::default(), short_seeds.clone());
        assert!(seeded.align(&req, &mut stats).is_none());
        assert_eq!(stats.indels_too_close, 1);
        assert_eq!(stats.hard_middle, 0);

        let loose = SeedParams {
            indel_spacing: 4,
            ..short_seeds
        };
        let mut stats = SeedStats::default();
        let a = SeededAligner::new(Penalties::default(), loose)
            .align(&req, &mut stats)
            .unwrap();
        check(&read, &template, &a);
        assert_eq!((a.score(), a.template_start(), a.run_string().as_str()), (40, 10, "18=1D5=1D25="));
        assert_eq!(stats.indels_too_close, 0);
    }

    #[test]
    fn test_hard_middle_delegated() {
        // Four adjacent substitutions leave a gap the seeds cannot bridge.
        let template = encode_dna(TEMPLATE.as_bytes());
        let mut read = template[10..50].to_vec();
        for b in &mut read[15..19] {
            *b = *b % 4 + 1;
        }
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10).with_max_shift(4);
        let a = aligner().align(&req, &mut stats).unwrap();
        check(&read, &template, &a);
        assert_eq!((a.score(), a.template_start(), a.run_string().as_str()), (36, 10, "15=4X21="));
        assert_eq!(stats.hard_middle, 1);
    }

    #[test]
    fn test_hard_start_delegated() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let mut read = encode_dna(b"CAGTCA");
        read.extend_from_slice(&template[16..50]);
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10).with_max_shift(4);
        let a = aligner().align(&req, &mut stats).unwrap();
        check(&read, &template, &a);
        assert_eq!((a.score(), a.template_start()), (27, 10));
        assert_eq!(a.read_length() as usize, read.len());
        assert_eq!(stats.hard_start, 1);
        assert_eq!(stats.hard_end, 0);
    }

    #[test]
    fn test_bound_gives_sentinel() {
        let template = encode_dna(TEMPLATE.as_bytes());
        let mut read = template[10..50].to_vec();
        read[20] = if read[20] == 4 { 1 } else { 4 };
        let mut stats = SeedStats::default();
        let req = AlignRequest::new(&read, &template, 10).with_max_score(9);
        let a = aligner().align(&req, &mut stats).unwrap();
        assert!(a.is_no_alignment());
        let req = AlignRequest::new(&read, &template, 10).with_max_score(10);
        assert_eq!(aligner().align(&req, &mut stats).unwrap().score(), 9);
    }
}
