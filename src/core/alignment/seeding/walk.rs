//! Resynchronising extension from a seed block towards a read end.
//!
//! The walk consumes matches one base at a time. At a non-match it looks at
//! the next `resync_length` positions under a substitution and under every
//! indel up to `max_indel`, and takes the alternative that matches most
//! (substitution first, then deletion before insertion, shorter first). When
//! even the best alternative misses more than one base in a full window the
//! remainder is handed to the exact aligner with a pinned start.

use crate::align_opt::SeedParams;
use crate::core::alignment::actions::{classify, template_base, Action, ActionSequence, NO_ALIGNMENT};
use crate::core::alignment::banded::BandedAligner;

use super::stats::SeedStats;

/// Which read end a walk heads for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Start,
    End,
}

/// Result of one walk.
#[derive(Debug, Default)]
pub struct Walk {
    pub actions: ActionSequence,
    pub template_span: i64,
    /// Read offsets (relative to the walk) where an indel was placed.
    pub indels: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Substitute,
    Delete(u32),
    Insert(u32),
}

/// Matches and positions compared in the window at `(read_pos, template_pos)`.
fn window(params: &SeedParams, read: &[u8], template: &[u8], read_pos: usize, template_pos: i64) -> (usize, usize) {
    let mut matches = 0;
    let mut width = 0;
    for x in 0..params.resync_length {
        if read_pos + x >= read.len() {
            break;
        }
        width += 1;
        if classify(read[read_pos + x], template_base(template, template_pos + x as i64)) == Action::Match {
            matches += 1;
        }
    }
    (matches, width)
}

/// Walk `read` along `template` from `template_start`. Returns `None` only
/// when the exact fallback produces the sentinel.
pub fn walk(
    banded: &mut BandedAligner,
    params: &SeedParams,
    read: &[u8],
    template: &[u8],
    template_start: i64,
    region: Region,
    stats: &mut SeedStats,
) -> Option<Walk> {
    let mut out = Walk::default();
    let mut i = 0usize;
    let mut p = template_start;
    while i < read.len() {
        let action = classify(read[i], template_base(template, p));
        if action == Action::Match {
            out.actions.push(Action::Match, 1);
            i += 1;
            p += 1;
            continue;
        }

        let (mut best_matches, mut best_width) = window(params, read, template, i + 1, p + 1);
        let mut best = Step::Substitute;
        for len in 1..=params.max_indel {
            let l = len as usize;
            let (m, w) = window(params, read, template, i, p + l as i64);
            if m > best_matches {
                (best_matches, best_width, best) = (m, w, Step::Delete(len));
            }
            if i + l < read.len() {
                let (m, w) = window(params, read, template, i + l, p);
                if m > best_matches {
                    (best_matches, best_width, best) = (m, w, Step::Insert(len));
                }
            }
        }

        if best_width > 0 && best_matches + 1 < best_width {
            match region {
                Region::Start => stats.hard_start += 1,
                Region::End => stats.hard_end += 1,
            }
            let rest = banded.align_fixed_start(read, i, read.len(), template, p as i32, NO_ALIGNMENT, params.max_indel);
            if rest.is_no_alignment() {
                return None;
            }
            out.actions.extend_runs(rest.operations());
            p += rest.template_length() as i64;
            break;
        }

        match best {
            Step::Substitute => {
                out.actions.push(action, 1);
                i += 1;
                p += 1;
            }
            Step::Delete(len) => {
                out.actions.push(Action::DeleteTemplateBase, len);
                out.indels.push(i);
                p += len as i64;
            }
            Step::Insert(len) => {
                out.actions.push(Action::InsertReadBase, len);
                out.indels.push(i);
                i += len as usize;
            }
        }
    }
    out.template_span = p - template_start;
    Some(out)
}
