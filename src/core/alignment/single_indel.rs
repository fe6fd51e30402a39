//! Aligner for reads with at most one indel.
//!
//! Prefix and suffix substitution costs are computed once per diagonal.
//! Every placement of a single insertion or deletion is then a constant-time
//! lookup: `prefix[d1][k] + indel(L) + suffix[d2][k']` with `d2 = d1 + L`
//! for a deletion and `d2 = d1 - L` for an insertion.
//!
//! Candidates are visited in a fixed order and only a strictly cheaper one
//! replaces the incumbent, so the result does not depend on the bound.

use super::actions::{classify, template_base, Action, ActionSequence};
use super::no_indel::diagonal_order;
use super::penalties::{IndelPenaltyTable, Penalties};
use super::request::AlignRequest;
use super::workspace::DiagonalScratch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    None { diagonal: i32 },
    Deletion { diagonal: i32, len: u32, at: usize },
    Insertion { diagonal: i32, len: u32, at: usize },
}

#[derive(Debug)]
pub struct SingleIndelAligner {
    penalties: Penalties,
    indels: IndelPenaltyTable,
    scratch: DiagonalScratch,
}

impl SingleIndelAligner {
    pub fn new(penalties: Penalties, indels: IndelPenaltyTable) -> Self {
        Self {
            penalties,
            indels,
            scratch: DiagonalScratch::new(),
        }
    }

    /// Uses a table equivalent to the affine penalties.
    pub fn affine(penalties: Penalties) -> Self {
        let indels = IndelPenaltyTable::from_affine(&penalties);
        Self::new(penalties, indels)
    }

    /// Returns `None` for arm-anchored calls. The reported score is the
    /// affine score of the chosen actions.
    pub fn align(&mut self, req: &AlignRequest) -> Option<ActionSequence> {
        if req.arm.is_some() {
            return None;
        }
        if req.max_score <= 0 {
            return Some(ActionSequence::no_alignment(req.template_start));
        }
        let shift = req.shift();
        let n = req.read.len();
        self.fill_costs(req, shift);

        let mut best_cost = i32::MAX;
        let mut best = Placement::None { diagonal: 0 };
        for d in diagonal_order(shift) {
            let c = self.prefix(shift, d, n);
            if c < best_cost {
                best_cost = c;
                best = Placement::None { diagonal: d };
            }
        }
        for len in 1..=(2 * shift) as u32 {
            let l = len as i32;
            let deletion = self.indels.deletion(len);
            let insertion = self.indels.insertion(len);
            for d1 in diagonal_order(shift) {
                let d2 = d1 + l;
                if d2.abs() <= shift {
                    for k in 1..n {
                        let c = self
                            .prefix(shift, d1, k)
                            .saturating_add(deletion)
                            .saturating_add(self.suffix(shift, d2, k));
                        if c < best_cost {
                            best_cost = c;
                            best = Placement::Deletion { diagonal: d1, len, at: k };
                        }
                    }
                }
                let d2 = d1 - l;
                if d2.abs() <= shift {
                    for k in 1..n.saturating_sub(len as usize) {
                        let c = self
                            .prefix(shift, d1, k)
                            .saturating_add(insertion)
                            .saturating_add(self.suffix(shift, d2, k + len as usize));
                        if c < best_cost {
                            best_cost = c;
                            best = Placement::Insertion { diagonal: d1, len, at: k };
                        }
                    }
                }
            }
        }

        let mut actions = self.build(req, best);
        let score = self.penalties.score_operations(actions.operations());
        if score >= req.max_score {
            return Some(ActionSequence::no_alignment(req.template_start));
        }
        actions.set_score(score);
        Some(actions)
    }

    fn fill_costs(&mut self, req: &AlignRequest, shift: i32) {
        let n = req.read.len();
        let diagonals = (2 * shift + 1) as usize;
        self.scratch.reset(diagonals, n);
        for col in 0..diagonals {
            let d = col as i64 - shift as i64;
            let origin = req.template_start as i64 + d;
            for i in 0..n {
                let action = classify(req.read[i], template_base(req.template, origin + i as i64));
                let c = self.penalties.substitution_cost(action);
                let at = self.scratch.at(col, i);
                self.scratch.prefix[at + 1] = self.scratch.prefix[at].saturating_add(c);
            }
            for i in (0..n).rev() {
                let action = classify(req.read[i], template_base(req.template, origin + i as i64));
                let c = self.penalties.substitution_cost(action);
                let at = self.scratch.at(col, i);
                self.scratch.suffix[at] = self.scratch.suffix[at + 1].saturating_add(c);
            }
        }
    }

    #[inline(always)]
    fn prefix(&self, shift: i32, d: i32, k: usize) -> i32 {
        self.scratch.prefix[self.scratch.at((d + shift) as usize, k)]
    }

    #[inline(always)]
    fn suffix(&self, shift: i32, d: i32, k: usize) -> i32 {
        self.scratch.suffix[self.scratch.at((d + shift) as usize, k)]
    }

    fn build(&self, req: &AlignRequest, placement: Placement) -> ActionSequence {
        let n = req.read.len();
        let s = req.template_start as i64;
        let push_diagonal = |actions: &mut ActionSequence, from: usize, to: usize, d: i32| {
            for i in from..to {
                let pos = s + i as i64 + d as i64;
                actions.push(classify(req.read[i], template_base(req.template, pos)), 1);
            }
        };
        match placement {
            Placement::None { diagonal } => {
                let mut actions = ActionSequence::new(0, req.template_start + diagonal);
                push_diagonal(&mut actions, 0, n, diagonal);
                actions
            }
            Placement::Deletion { diagonal, len, at } => {
                let mut actions = ActionSequence::new(0, req.template_start + diagonal);
                push_diagonal(&mut actions, 0, at, diagonal);
                actions.push(Action::DeleteTemplateBase, len);
                push_diagonal(&mut actions, at, n, diagonal + len as i32);
                actions
            }
            Placement::Insertion { diagonal, len, at } => {
                let mut actions = ActionSequence::new(0, req.template_start + diagonal);
                push_diagonal(&mut actions, 0, at, diagonal);
                actions.push(Action::InsertReadBase, len);
                push_diagonal(&mut actions, at + len as usize, n, diagonal - len as i32);
                actions
            }
        }
    }
}
