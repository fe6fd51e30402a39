//! CIGAR projection of action sequences.
//!
//! Three renderings are provided:
//! - `cigar()`: SAM extended operators `= X I D S N`. Unknown bases render
//!   as `X`; structural overlaps are omitted and their neighbours merge.
//! - `legacy_cigar()`: as above but `M` for every aligned pair.
//! - `super_cigar()`: as `cigar()` but overlaps render as `B`.

use std::fmt::Write;

use super::actions::{Action, ActionSequence};
use super::edit_distance;

/// CIGAR operation type with zero-cost conversion to/from bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CigarOp {
    M = b'M',  // Match or mismatch (legacy)
    I = b'I',  // Insertion to the template
    D = b'D',  // Deletion from the template
    S = b'S',  // Soft clip
    N = b'N',  // Structural gap between arms
    X = b'X',  // Mismatch
    Eq = b'=', // Match
    B = b'B',  // Structural overlap (super CIGAR only)
}

impl CigarOp {
    #[inline(always)]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'M' => Some(Self::M),
            b'I' => Some(Self::I),
            b'D' => Some(Self::D),
            b'S' => Some(Self::S),
            b'N' => Some(Self::N),
            b'X' => Some(Self::X),
            b'=' => Some(Self::Eq),
            b'B' => Some(Self::B),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if this operation consumes query bases
    #[inline(always)]
    pub const fn consumes_query(self) -> bool {
        matches!(self, Self::M | Self::I | Self::S | Self::Eq | Self::X | Self::B)
    }

    /// Returns true if this operation consumes reference bases
    #[inline(always)]
    pub const fn consumes_ref(self) -> bool {
        matches!(self, Self::M | Self::D | Self::N | Self::Eq | Self::X)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Flavour {
    Extended,
    Legacy,
    Super,
}

fn project(action: Action, flavour: Flavour) -> Option<CigarOp> {
    let op = match action {
        Action::Match if flavour == Flavour::Legacy => CigarOp::M,
        Action::Mismatch | Action::UnknownInRead | Action::UnknownInTemplate if flavour == Flavour::Legacy => {
            CigarOp::M
        }
        Action::Match => CigarOp::Eq,
        Action::Mismatch | Action::UnknownInRead | Action::UnknownInTemplate => CigarOp::X,
        Action::InsertReadBase => CigarOp::I,
        Action::DeleteTemplateBase => CigarOp::D,
        Action::SoftClip => CigarOp::S,
        Action::StructuralGap => CigarOp::N,
        Action::StructuralOverlap if flavour == Flavour::Super => CigarOp::B,
        Action::StructuralOverlap => return None,
    };
    Some(op)
}

/// Project runs into merged CIGAR operations.
fn cigar_ops(actions: &ActionSequence, flavour: Flavour) -> Vec<(CigarOp, u32)> {
    let mut ops: Vec<(CigarOp, u32)> = Vec::with_capacity(actions.runs().len());
    for (action, len) in actions.operations() {
        let Some(op) = project(action, flavour) else {
            continue;
        };
        match ops.last_mut() {
            Some((last, n)) if *last == op => *n += len,
            _ => ops.push((op, len)),
        }
    }
    ops
}

/// Convert CIGAR to string representation (e.g., "50=2I48=").
#[inline]
pub fn to_string(cigar: &[(CigarOp, u32)]) -> String {
    if cigar.is_empty() {
        return "*".to_string();
    }
    let mut result = String::with_capacity(cigar.len() * 4);
    for &(op, len) in cigar {
        // Writing to a String cannot fail.
        let _ = write!(&mut result, "{}{}", len, op.to_byte() as char);
    }
    result
}

/// Parse a CIGAR string into operations.
pub fn parse(cigar: &str) -> Option<Vec<(CigarOp, u32)>> {
    if cigar == "*" {
        return Some(Vec::new());
    }
    let mut ops = Vec::new();
    let mut len: u32 = 0;
    let mut have_len = false;
    for b in cigar.bytes() {
        if b.is_ascii_digit() {
            len = len.checked_mul(10)?.checked_add((b - b'0') as u32)?;
            have_len = true;
        } else {
            if !have_len {
                return None;
            }
            ops.push((CigarOp::from_byte(b)?, len));
            len = 0;
            have_len = false;
        }
    }
    if have_len {
        return None;
    }
    Some(ops)
}

/// Calculate the query-consuming length from a CIGAR.
#[inline]
pub fn query_length(cigar: &[(CigarOp, u32)]) -> u32 {
    cigar.iter().filter(|(op, _)| op.consumes_query()).map(|&(_, len)| len).sum()
}

/// Calculate the reference-consuming length from a CIGAR.
#[inline]
pub fn reference_length(cigar: &[(CigarOp, u32)]) -> u32 {
    cigar.iter().filter(|(op, _)| op.consumes_ref()).map(|&(_, len)| len).sum()
}

// ============================================================================
// ALIGNMENT RESULT
// ============================================================================

/// An action sequence together with the sequences it aligns.
#[derive(Debug, Clone)]
pub struct AlignmentResult<'a> {
    actions: ActionSequence,
    read: &'a [u8],
    template: &'a [u8],
}

impl<'a> AlignmentResult<'a> {
    pub fn new(actions: ActionSequence, read: &'a [u8], template: &'a [u8]) -> Self {
        Self {
            actions,
            read,
            template,
        }
    }

    pub fn actions(&self) -> &ActionSequence {
        &self.actions
    }

    pub fn read(&self) -> &'a [u8] {
        self.read
    }

    pub fn template(&self) -> &'a [u8] {
        self.template
    }

    pub fn into_actions(self) -> ActionSequence {
        self.actions
    }

    pub fn score(&self) -> i32 {
        self.actions.score()
    }

    pub fn template_start(&self) -> i32 {
        self.actions.template_start()
    }

    pub fn template_end(&self) -> i32 {
        self.actions.template_end()
    }

    pub fn is_no_alignment(&self) -> bool {
        self.actions.is_no_alignment()
    }

    fn count(&self, wanted: impl Fn(Action) -> bool) -> u32 {
        self.actions
            .operations()
            .filter(|&(a, _)| wanted(a))
            .map(|(_, len)| len)
            .sum()
    }

    pub fn mismatches(&self) -> u32 {
        self.count(|a| a == Action::Mismatch)
    }

    pub fn unknowns(&self) -> u32 {
        self.count(|a| matches!(a, Action::UnknownInRead | Action::UnknownInTemplate))
    }

    pub fn insertions(&self) -> u32 {
        self.count(|a| a == Action::InsertReadBase)
    }

    pub fn deletions(&self) -> u32 {
        self.count(|a| a == Action::DeleteTemplateBase)
    }

    pub fn cigar_ops(&self) -> Vec<(CigarOp, u32)> {
        cigar_ops(&self.actions, Flavour::Extended)
    }

    pub fn cigar(&self) -> String {
        to_string(&cigar_ops(&self.actions, Flavour::Extended))
    }

    pub fn legacy_cigar(&self) -> String {
        to_string(&cigar_ops(&self.actions, Flavour::Legacy))
    }

    pub fn super_cigar(&self) -> String {
        to_string(&cigar_ops(&self.actions, Flavour::Super))
    }

    /// SAM NM: mismatches (unknowns included) plus inserted and deleted bases.
    pub fn nm(&self) -> u32 {
        edit_distance::compute_nm_only(&self.actions)
    }

    /// SAM MD tag against the template.
    pub fn md(&self) -> String {
        edit_distance::compute_nm_and_md(&self.actions, self.template).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(ops: &str, start: i32) -> AlignmentResult<'static> {
        AlignmentResult::new(ActionSequence::build(ops, start, 0).unwrap(), &[], &[])
    }

    #[test]
    fn test_cigar_op_from_byte() {
        assert_eq!(CigarOp::from_byte(b'='), Some(CigarOp::Eq));
        assert_eq!(CigarOp::from_byte(b'B'), Some(CigarOp::B));
        assert_eq!(CigarOp::from_byte(b'H'), None);
    }

    #[test]
    fn test_overlap_is_omitted_and_neighbours_merge() {
        let r = result("1=1X3=2B18=7N10=", 10);
        assert_eq!(r.cigar(), "1=1X21=7N10=");
        assert_eq!(r.super_cigar(), "1=1X3=2B18=7N10=");
        assert_eq!(r.legacy_cigar(), "23M7N10M");
    }

    #[test]
    fn test_unknowns_render_as_mismatch() {
        let r = result("4=1R3=1T1=", 2);
        assert_eq!(r.cigar(), "4=1X3=1X1=");
        assert_eq!(r.legacy_cigar(), "10M");
        assert_eq!(r.unknowns(), 2);
        assert_eq!(r.mismatches(), 0);
    }

    #[test]
    fn test_counts_and_lengths() {
        let r = result("2S10=2I3=1D5=1X", 100);
        assert_eq!(r.insertions(), 2);
        assert_eq!(r.deletions(), 1);
        assert_eq!(r.mismatches(), 1);
        assert_eq!(r.template_end(), 120);
        let ops = r.cigar_ops();
        assert_eq!(query_length(&ops), 23);
        assert_eq!(reference_length(&ops), 20);
    }

    #[test]
    fn test_parse() {
        let ops = parse("20=1I30=").unwrap();
        assert_eq!(ops, vec![(CigarOp::Eq, 20), (CigarOp::I, 1), (CigarOp::Eq, 30)]);
        assert_eq!(to_string(&ops), "20=1I30=");
        assert_eq!(parse("*"), Some(vec![]));
        assert_eq!(parse("=3"), None);
        assert_eq!(parse("3Q"), None);
    }

    #[test]
    fn test_sentinel_has_no_cigar() {
        let r = AlignmentResult::new(ActionSequence::no_alignment(3), &[], &[]);
        assert_eq!(r.cigar(), "*");
    }
}
