//! Gap-free aligner: scores every diagonal in the band and keeps the best.

use super::actions::{classify, template_base, ActionSequence};
use super::penalties::Penalties;
use super::request::AlignRequest;

/// Diagonals in search order: `0, -1, +1, -2, +2, ...`.
pub fn diagonal_order(shift: i32) -> impl Iterator<Item = i32> {
    std::iter::once(0).chain((1..=shift).flat_map(|x| [-x, x]))
}

#[derive(Debug, Clone)]
pub struct NoIndelAligner {
    penalties: Penalties,
}

impl NoIndelAligner {
    pub fn new(penalties: Penalties) -> Self {
        Self { penalties }
    }

    /// Returns `None` for arm-anchored calls.
    pub fn align(&self, req: &AlignRequest) -> Option<ActionSequence> {
        if req.arm.is_some() {
            return None;
        }
        if req.max_score <= 0 {
            return Some(ActionSequence::no_alignment(req.template_start));
        }
        let mut best: Option<(i32, i32)> = None;
        for d in diagonal_order(req.shift()) {
            let limit = best.map_or(req.max_score, |(s, _)| s.min(req.max_score));
            if let Some(score) = self.diagonal_score(req, d, limit) {
                best = Some((score, d));
            }
        }
        let Some((score, d)) = best else {
            return Some(ActionSequence::no_alignment(req.template_start));
        };
        let start = req.template_start + d;
        let mut actions = ActionSequence::new(score, start);
        for (i, &b) in req.read.iter().enumerate() {
            let action = classify(b, template_base(req.template, start as i64 + i as i64));
            actions.push(action, 1);
        }
        Some(actions)
    }

    /// Score of diagonal `d`, or `None` once it reaches `limit`.
    fn diagonal_score(&self, req: &AlignRequest, d: i32, limit: i32) -> Option<i32> {
        let start = req.template_start as i64 + d as i64;
        let mut score = 0i32;
        for (i, &b) in req.read.iter().enumerate() {
            let action = classify(b, template_base(req.template, start + i as i64));
            score = score.saturating_add(self.penalties.substitution_cost(action));
            if score >= limit {
                return None;
            }
        }
        Some(score)
    }
}
