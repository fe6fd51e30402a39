//! Exact banded affine-gap aligner.
//!
//! Three-state (match / insertion / deletion) dynamic programming restricted
//! to a diagonal band of half-width `max_shift`. Cell `(i, d)` holds the
//! cheapest way to consume `i` read bases while sitting on diagonal `d`,
//! i.e. having consumed template up to `band_start + i + d`.
//!
//! ```text
//!            d = -S ... 0 ... +S
//!   i = 0    [ M0  M0  M0  M0  M0 ]   start row (floating or pinned)
//!   i = 1    [ .   .   .   .   .  ]   M: from (i-1, d)
//!   ...                               I: from (i-1, d+1)   read base only
//!   i = n    [ .   .   .   .   .  ]   D: from (i,   d-1)   template base only
//! ```
//!
//! Cells that reach `max_score` are pruned to infinity and a fully pruned row
//! ends the call with the sentinel. This aligner is the baseline the
//! heuristics are checked against, so it never returns anything but the
//! band optimum.

use super::actions::{classify, template_base, Action, ActionSequence};
use super::penalties::Penalties;
use super::request::{AlignRequest, Arm};
use super::workspace::{BandScratch, INF};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Match,
    Insert,
    Delete,
}

/// Exact aligner handle. Owns its DP matrices; not for concurrent use.
#[derive(Debug)]
pub struct BandedAligner {
    penalties: Penalties,
    scratch: BandScratch,
    trace: Vec<Action>,
}

impl BandedAligner {
    pub fn new(penalties: Penalties) -> Self {
        Self {
            penalties,
            scratch: BandScratch::new(),
            trace: Vec::new(),
        }
    }

    pub fn penalties(&self) -> &Penalties {
        &self.penalties
    }

    /// Align a whole read. `arm` selects which end is pinned:
    /// none floats both, `Left` pins the start, `Right` pins the end at
    /// `template_start + read_len`.
    pub fn align(&mut self, req: &AlignRequest) -> ActionSequence {
        let (start_pin, end_pin) = match req.arm {
            None => (None, None),
            Some(Arm::Left) => (Some(0), None),
            Some(Arm::Right) => (None, Some(0)),
        };
        self.solve(
            req.read,
            req.template,
            req.template_start,
            req.shift(),
            req.max_score,
            start_pin,
            end_pin,
        )
    }

    /// Align `read[read_start..read_end]` with the first template position
    /// pinned at `template_start`; the end floats.
    pub fn align_fixed_start(
        &mut self,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        template_start: i32,
        max_score: i32,
        max_shift: u32,
    ) -> ActionSequence {
        let shift = clamp_shift(max_shift);
        self.solve(
            &read[read_start..read_end],
            template,
            template_start,
            shift,
            max_score,
            Some(0),
            None,
        )
    }

    /// Align `read[read_start..read_end]` ending exactly at `template_end`;
    /// the start floats within `max_shift` of `expected_template_start`.
    #[allow(clippy::too_many_arguments)]
    pub fn align_fixed_end(
        &mut self,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        expected_template_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: u32,
    ) -> ActionSequence {
        let shift = clamp_shift(max_shift);
        let len = (read_end - read_start) as i32;
        let end_diagonal = template_end - (expected_template_start + len);
        if end_diagonal.abs() > shift {
            return ActionSequence::no_alignment(expected_template_start);
        }
        self.solve(
            &read[read_start..read_end],
            template,
            expected_template_start,
            shift,
            max_score,
            None,
            Some(end_diagonal),
        )
    }

    /// Align `read[read_start..read_end]` covering exactly
    /// `[template_start, template_end)`.
    #[allow(clippy::too_many_arguments)]
    pub fn align_fixed_both(
        &mut self,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        template_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: u32,
    ) -> ActionSequence {
        let shift = clamp_shift(max_shift);
        let len = (read_end - read_start) as i32;
        let end_diagonal = template_end - (template_start + len);
        if end_diagonal.abs() > shift {
            return ActionSequence::no_alignment(template_start);
        }
        self.solve(
            &read[read_start..read_end],
            template,
            template_start,
            shift,
            max_score,
            Some(0),
            Some(end_diagonal),
        )
    }

    // ========================================================================
    // DP KERNEL
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    fn solve(
        &mut self,
        read: &[u8],
        template: &[u8],
        band_start: i32,
        shift: i32,
        max_score: i32,
        start_diagonal: Option<i32>,
        end_diagonal: Option<i32>,
    ) -> ActionSequence {
        if max_score <= 0 {
            return ActionSequence::no_alignment(band_start);
        }
        let n = read.len();
        let width = (2 * shift + 1) as usize;
        let bound = max_score.min(INF);
        let p = self.penalties;
        let open = p.gap_cost(1);
        let extend = p.gap_extend;
        let cap = |v: i32| if v < bound { v } else { INF };

        let sc = &mut self.scratch;
        sc.reset(n + 1, width);
        for k in 0..width {
            if start_diagonal.map_or(true, |d| d + shift == k as i32) {
                let idx = sc.at(0, k);
                sc.matched[idx] = 0;
            }
        }
        fill_deletions(sc, 0, width, open, extend, &cap);

        for i in 1..=n {
            let read_base = read[i - 1];
            let row_template = band_start as i64 + (i - 1) as i64 - shift as i64;
            for k in 0..width {
                let prev = sc.at(i - 1, k);
                let here = sc.at(i, k);
                let h = sc.matched[prev].min(sc.inserted[prev]).min(sc.deleted[prev]);
                if h < INF {
                    let action = classify(read_base, template_base(template, row_template + k as i64));
                    sc.matched[here] = cap(h.saturating_add(p.substitution_cost(action)));
                }
                if k + 1 < width {
                    let up = sc.at(i - 1, k + 1);
                    let opened = sc.matched[up].min(sc.deleted[up]).saturating_add(open);
                    let extended = sc.inserted[up].saturating_add(extend);
                    sc.inserted[here] = cap(opened.min(extended));
                }
            }
            fill_deletions(sc, i, width, open, extend, &cap);
            if row_minimum(sc, i, width) >= INF {
                return ActionSequence::no_alignment(band_start);
            }
        }

        // Pick the end cell: cheapest, then closest to the main diagonal,
        // then the lower diagonal.
        let mut best: Option<(i32, i32, usize)> = None;
        for k in 0..width {
            let d = k as i32 - shift;
            if end_diagonal.is_some_and(|e| e != d) {
                continue;
            }
            let idx = sc.at(n, k);
            let v = sc.matched[idx].min(sc.inserted[idx]).min(sc.deleted[idx]);
            if v >= INF {
                continue;
            }
            let key = (v, d.abs(), k);
            if best.map_or(true, |b| key < b) {
                best = Some(key);
            }
        }
        let Some((score, _, end_k)) = best else {
            return ActionSequence::no_alignment(band_start);
        };

        let start_k = self.traceback(read, template, band_start, shift, n, end_k, score);
        let mut actions = ActionSequence::new(score, band_start + start_k as i32 - shift);
        for &action in self.trace.iter().rev() {
            actions.push(action, 1);
        }
        actions
    }

    /// Walk back from `(n, end_k)`; fills `self.trace` end-to-start and
    /// returns the start column.
    #[allow(clippy::too_many_arguments)]
    fn traceback(
        &mut self,
        read: &[u8],
        template: &[u8],
        band_start: i32,
        shift: i32,
        n: usize,
        end_k: usize,
        score: i32,
    ) -> usize {
        let sc = &self.scratch;
        let p = &self.penalties;
        let open = p.gap_cost(1);
        let extend = p.gap_extend;
        self.trace.clear();

        let end = sc.at(n, end_k);
        let mut state = if sc.matched[end] == score {
            State::Match
        } else if sc.inserted[end] == score {
            State::Insert
        } else {
            State::Delete
        };
        let (mut i, mut k) = (n, end_k);
        loop {
            match state {
                State::Match => {
                    if i == 0 {
                        break;
                    }
                    let pos = band_start as i64 + (i - 1) as i64 + k as i64 - shift as i64;
                    let action = classify(read[i - 1], template_base(template, pos));
                    let target = sc.matched[sc.at(i, k)] - p.substitution_cost(action);
                    self.trace.push(action);
                    i -= 1;
                    let prev = sc.at(i, k);
                    state = if sc.matched[prev] == target {
                        State::Match
                    } else if sc.inserted[prev] == target {
                        State::Insert
                    } else {
                        State::Delete
                    };
                }
                State::Insert => {
                    self.trace.push(Action::InsertReadBase);
                    let value = sc.inserted[sc.at(i, k)];
                    let up = sc.at(i - 1, k + 1);
                    state = if sc.matched[up].saturating_add(open) == value {
                        State::Match
                    } else if sc.inserted[up].saturating_add(extend) == value {
                        State::Insert
                    } else {
                        State::Delete
                    };
                    i -= 1;
                    k += 1;
                }
                State::Delete => {
                    self.trace.push(Action::DeleteTemplateBase);
                    let value = sc.deleted[sc.at(i, k)];
                    let left = sc.at(i, k - 1);
                    state = if sc.matched[left].saturating_add(open) == value {
                        State::Match
                    } else if sc.deleted[left].saturating_add(extend) == value {
                        State::Delete
                    } else {
                        State::Insert
                    };
                    k -= 1;
                }
            }
        }
        k
    }
}

#[inline]
fn clamp_shift(max_shift: u32) -> i32 {
    max_shift.min(i32::MAX as u32 / 4) as i32
}

#[inline]
fn fill_deletions(
    sc: &mut BandScratch,
    row: usize,
    width: usize,
    open: i32,
    extend: i32,
    cap: &impl Fn(i32) -> i32,
) {
    for k in 1..width {
        let left = sc.at(row, k - 1);
        let opened = sc.matched[left].min(sc.inserted[left]).saturating_add(open);
        let extended = sc.deleted[left].saturating_add(extend);
        let here = sc.at(row, k);
        sc.deleted[here] = cap(opened.min(extended));
    }
}

#[inline]
fn row_minimum(sc: &BandScratch, row: usize, width: usize) -> i32 {
    let lo = sc.at(row, 0);
    let hi = lo + width;
    let m = sc.matched[lo..hi].iter().copied().min().unwrap_or(INF);
    let i = sc.inserted[lo..hi].iter().copied().min().unwrap_or(INF);
    let d = sc.deleted[lo..hi].iter().copied().min().unwrap_or(INF);
    m.min(i).min(d)
}
