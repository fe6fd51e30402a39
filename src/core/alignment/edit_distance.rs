//! Edit distance (NM) and MD tag computation from action sequences.
//!
//! # NM Calculation
//! NM = mismatches + unknowns + inserted bases + deleted bases. Soft clips and
//! both structural actions do not count.
//!
//! # MD Tag Format
//! - Numbers: count of matching bases
//! - Letters: template base at a mismatch (unknowns included)
//! - ^LETTERS: deleted template bases
//! - Consecutive mismatches are separated by 0: "A0T" not "AT"
//!
//! Structural gaps are skipped like SAM `N` operations, so their template
//! bases do not appear in the tag.

use super::actions::{template_base, Action, ActionSequence};
use crate::core::compute::encoding::dna_code_to_char;

/// Compute exact NM and the MD tag in a single pass.
///
/// ```ignore
/// let (nm, md) = compute_nm_and_md(&actions, &template);
/// // 50 matches, 1 mismatch (template A), 49 matches: nm=1, md="50A49"
/// // 25 matches, 2bp deletion (AC), 25 matches: nm=2, md="25^AC25"
/// ```
pub fn compute_nm_and_md(actions: &ActionSequence, template: &[u8]) -> (u32, String) {
    let mut nm: u32 = 0;
    let mut md = String::with_capacity(actions.runs().len() * 3 + 8);
    let mut match_count: u32 = 0;
    let mut ti = actions.template_start() as i64;

    for (action, len) in actions.operations() {
        match action {
            Action::Match => {
                match_count += len;
                ti += len as i64;
            }
            Action::Mismatch | Action::UnknownInRead | Action::UnknownInTemplate => {
                for _ in 0..len {
                    nm += 1;
                    // SAM: emit match count (even if 0), then the template base
                    push_number(&mut md, match_count);
                    match_count = 0;
                    md.push(dna_code_to_char(template_base(template, ti)));
                    ti += 1;
                }
            }
            Action::InsertReadBase => {
                nm += len;
            }
            Action::DeleteTemplateBase => {
                nm += len;
                push_number(&mut md, match_count);
                match_count = 0;
                md.push('^');
                for _ in 0..len {
                    md.push(dna_code_to_char(template_base(template, ti)));
                    ti += 1;
                }
            }
            Action::StructuralGap => {
                ti += len as i64;
            }
            Action::SoftClip | Action::StructuralOverlap => {}
        }
    }
    push_number(&mut md, match_count);
    (nm, md)
}

/// NM without building the MD string.
#[inline]
pub fn compute_nm_only(actions: &ActionSequence) -> u32 {
    actions
        .operations()
        .filter(|(a, _)| a.is_edit())
        .map(|(_, len)| len)
        .sum()
}

#[inline]
fn push_number(md: &mut String, n: u32) {
    use std::fmt::Write;
    // Writing to a String cannot fail.
    let _ = write!(md, "{n}");
}
