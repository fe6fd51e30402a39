//! Alignment actions and the run-length encoded action sequence.
//!
//! An [`ActionSequence`] is the common currency of every aligner in the crate:
//! a score, the template position of the first template-consuming action, and
//! an ordered list of `(Action, run length)` pairs. The sequence can be
//! flattened into a compact word array (`[run_count, score, template_start,
//! (code, len)*]`) which is what the validator consumes.
//!
//! Builders always merge adjacent runs of the same action and never emit
//! zero-length runs, so two sequences describing the same alignment compare
//! equal.

use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

use thiserror::Error;

/// Score reserved for "no alignment within the bound".
pub const NO_ALIGNMENT: i32 = i32::MAX;

/// Number of header words in the flattened form.
pub const HEADER_WORDS: usize = 3;

/// A single alignment operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    Match = 0,
    Mismatch = 1,
    InsertReadBase = 2,
    DeleteTemplateBase = 3,
    UnknownInRead = 4,
    UnknownInTemplate = 5,
    SoftClip = 6,
    StructuralGap = 7,
    StructuralOverlap = 8,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Match,
        Action::Mismatch,
        Action::InsertReadBase,
        Action::DeleteTemplateBase,
        Action::UnknownInRead,
        Action::UnknownInTemplate,
        Action::SoftClip,
        Action::StructuralGap,
        Action::StructuralOverlap,
    ];

    /// Convert from the encoded word value.
    #[inline(always)]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Match),
            1 => Some(Self::Mismatch),
            2 => Some(Self::InsertReadBase),
            3 => Some(Self::DeleteTemplateBase),
            4 => Some(Self::UnknownInRead),
            5 => Some(Self::UnknownInTemplate),
            6 => Some(Self::SoftClip),
            7 => Some(Self::StructuralGap),
            8 => Some(Self::StructuralOverlap),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Character used by the textual fixture form.
    #[inline(always)]
    pub const fn to_char(self) -> char {
        match self {
            Self::Match => '=',
            Self::Mismatch => 'X',
            Self::InsertReadBase => 'I',
            Self::DeleteTemplateBase => 'D',
            Self::UnknownInRead => 'R',
            Self::UnknownInTemplate => 'T',
            Self::SoftClip => 'S',
            Self::StructuralGap => 'N',
            Self::StructuralOverlap => 'B',
        }
    }

    #[inline(always)]
    pub const fn from_char(c: u8) -> Option<Self> {
        match c {
            b'=' => Some(Self::Match),
            b'X' => Some(Self::Mismatch),
            b'I' => Some(Self::InsertReadBase),
            b'D' => Some(Self::DeleteTemplateBase),
            b'R' => Some(Self::UnknownInRead),
            b'T' => Some(Self::UnknownInTemplate),
            b'S' => Some(Self::SoftClip),
            b'N' => Some(Self::StructuralGap),
            b'B' => Some(Self::StructuralOverlap),
            _ => None,
        }
    }

    /// Returns true if this action consumes read bases
    #[inline(always)]
    pub const fn consumes_read(self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Mismatch
                | Self::InsertReadBase
                | Self::UnknownInRead
                | Self::UnknownInTemplate
                | Self::SoftClip
                | Self::StructuralOverlap
        )
    }

    /// Returns true if this action consumes template bases
    #[inline(always)]
    pub const fn consumes_template(self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Mismatch
                | Self::DeleteTemplateBase
                | Self::UnknownInRead
                | Self::UnknownInTemplate
                | Self::StructuralGap
        )
    }

    /// Actions that pair one read base with one template base and are
    /// therefore checkable against the bytes.
    #[inline(always)]
    pub const fn is_byte_checked(self) -> bool {
        matches!(
            self,
            Self::Match | Self::Mismatch | Self::UnknownInRead | Self::UnknownInTemplate
        )
    }

    #[inline(always)]
    pub const fn is_gap(self) -> bool {
        matches!(self, Self::InsertReadBase | Self::DeleteTemplateBase)
    }

    /// Mismatches, unknowns and indels: the actions soft clipping may remove.
    #[inline(always)]
    pub const fn is_edit(self) -> bool {
        matches!(
            self,
            Self::Mismatch
                | Self::InsertReadBase
                | Self::DeleteTemplateBase
                | Self::UnknownInRead
                | Self::UnknownInTemplate
        )
    }
}

/// Classify a read byte against a template byte.
///
/// Unknown in the read wins over unknown in the template.
#[inline(always)]
pub const fn classify(read_base: u8, template_base: u8) -> Action {
    if read_base == 0 {
        Action::UnknownInRead
    } else if template_base == 0 {
        Action::UnknownInTemplate
    } else if read_base == template_base {
        Action::Match
    } else {
        Action::Mismatch
    }
}

/// Template byte at `pos`, with positions off either end reading as unknown.
#[inline(always)]
pub fn template_base(template: &[u8], pos: i64) -> u8 {
    if pos < 0 || pos >= template.len() as i64 {
        0
    } else {
        template[pos as usize]
    }
}

// ============================================================================
// ACTION SEQUENCE
// ============================================================================

/// Error raised when parsing the textual run form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseActionsError {
    #[error("unknown action character '{0}'")]
    UnknownAction(char),
    #[error("repeat count without an action at end of '{0}'")]
    DanglingCount(String),
    #[error("repeat count {0} is out of range")]
    BadCount(String),
}

/// Run-length encoded alignment with its score and anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSequence {
    score: i32,
    template_start: i32,
    runs: Vec<(Action, u32)>,
}

impl ActionSequence {
    pub fn new(score: i32, template_start: i32) -> Self {
        Self {
            score,
            template_start,
            runs: Vec::new(),
        }
    }

    /// Sentinel result: nothing scores below the bound.
    pub fn no_alignment(template_start: i32) -> Self {
        Self::new(NO_ALIGNMENT, template_start)
    }

    /// Build from a textual run description such as `"20=1I30="`.
    pub fn build(ops: &str, template_start: i32, claimed_score: i32) -> Result<Self, ParseActionsError> {
        let mut seq = Self::new(claimed_score, template_start);
        let mut count: Option<u32> = None;
        let mut digits = String::new();
        for &b in ops.as_bytes() {
            if b.is_ascii_digit() {
                digits.push(b as char);
                count = Some(
                    digits
                        .parse::<u32>()
                        .map_err(|_| ParseActionsError::BadCount(digits.clone()))?,
                );
                continue;
            }
            if b.is_ascii_whitespace() {
                continue;
            }
            let action = Action::from_char(b).ok_or(ParseActionsError::UnknownAction(b as char))?;
            seq.push(action, count.take().unwrap_or(1));
            digits.clear();
        }
        if count.is_some() {
            return Err(ParseActionsError::DanglingCount(ops.to_string()));
        }
        Ok(seq)
    }

    /// Rebuild from the flattened word form. Returns `None` for malformed
    /// input; use the validator to find out why.
    pub fn from_words(words: &[i32]) -> Option<Self> {
        if words.len() < HEADER_WORDS || words[0] < 0 {
            return None;
        }
        let count = words[0] as usize;
        if words.len() != HEADER_WORDS + 2 * count {
            return None;
        }
        let mut seq = Self::new(words[1], words[2]);
        for pair in words[HEADER_WORDS..].chunks_exact(2) {
            let action = Action::from_code(pair[0])?;
            if pair[1] <= 0 {
                return None;
            }
            seq.push(action, pair[1] as u32);
        }
        Some(seq)
    }

    /// Flatten to `[run_count, score, template_start, (code, len)*]`.
    pub fn to_words(&self) -> Vec<i32> {
        let mut words = Vec::with_capacity(HEADER_WORDS + 2 * self.runs.len());
        words.push(self.runs.len() as i32);
        words.push(self.score);
        words.push(self.template_start);
        for &(action, len) in &self.runs {
            words.push(action.code());
            words.push(len as i32);
        }
        words
    }

    #[inline]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[inline]
    pub fn template_start(&self) -> i32 {
        self.template_start
    }

    #[inline]
    pub fn is_no_alignment(&self) -> bool {
        self.score == NO_ALIGNMENT
    }

    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    pub fn set_template_start(&mut self, template_start: i32) {
        self.template_start = template_start;
    }

    /// Append a run, merging with the last one when the action repeats.
    #[inline]
    pub fn push(&mut self, action: Action, len: u32) {
        if len == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some((last, n)) if *last == action => *n += len,
            _ => self.runs.push((action, len)),
        }
    }

    pub fn extend_runs<I: IntoIterator<Item = (Action, u32)>>(&mut self, runs: I) {
        for (action, len) in runs {
            self.push(action, len);
        }
    }

    /// Restartable iterator over `(action, run length)`.
    pub fn operations(&self) -> impl Iterator<Item = (Action, u32)> + Clone + '_ {
        self.runs.iter().copied()
    }

    #[inline]
    pub fn runs(&self) -> &[(Action, u32)] {
        &self.runs
    }

    /// Iterate one entry per individual action.
    pub fn expanded(&self) -> impl Iterator<Item = Action> + '_ {
        self.runs
            .iter()
            .flat_map(|&(action, len)| std::iter::repeat(action).take(len as usize))
    }

    pub fn read_length(&self) -> u32 {
        self.runs
            .iter()
            .filter(|(a, _)| a.consumes_read())
            .map(|&(_, len)| len)
            .sum()
    }

    pub fn template_length(&self) -> u32 {
        self.runs
            .iter()
            .filter(|(a, _)| a.consumes_template())
            .map(|&(_, len)| len)
            .sum()
    }

    /// One past the last template position consumed.
    #[inline]
    pub fn template_end(&self) -> i32 {
        self.template_start + self.template_length() as i32
    }

    /// Reverse the run order and re-anchor the result in a coordinate
    /// system reflected about `window_end` (position `x` maps to
    /// `window_end - 1 - x`).
    pub fn mirrored(&self, window_end: i32) -> Self {
        if self.is_no_alignment() && self.runs.is_empty() {
            return self.clone();
        }
        Self {
            score: self.score,
            template_start: window_end - self.template_end(),
            runs: self.runs.iter().rev().copied().collect(),
        }
    }

    /// Textual run form, always with explicit counts.
    pub fn run_string(&self) -> String {
        let mut out = String::with_capacity(self.runs.len() * 4);
        for &(action, len) in &self.runs {
            // Writing to a String cannot fail.
            let _ = write!(out, "{}{}", len, action.to_char());
        }
        out
    }
}

impl fmt::Display for ActionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_no_alignment() {
            write!(f, "score=none start={} {}", self.template_start, self.run_string())
        } else {
            write!(f, "score={} start={} {}", self.score, self.template_start, self.run_string())
        }
    }
}

impl FromStr for ActionSequence {
    type Err = ParseActionsError;

    /// Parses the run form only; score and start are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::build(s, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_code(action.code()), Some(action));
            assert_eq!(Action::from_char(action.to_char() as u8), Some(action));
        }
        assert_eq!(Action::from_code(9), None);
        assert_eq!(Action::from_code(-1), None);
        assert_eq!(Action::from_char(b'M'), None);
    }

    #[test]
    fn test_consumption() {
        assert!(Action::InsertReadBase.consumes_read());
        assert!(!Action::InsertReadBase.consumes_template());
        assert!(!Action::DeleteTemplateBase.consumes_read());
        assert!(Action::DeleteTemplateBase.consumes_template());
        assert!(Action::SoftClip.consumes_read());
        assert!(!Action::SoftClip.consumes_template());
        assert!(Action::StructuralGap.consumes_template());
        assert!(!Action::StructuralOverlap.consumes_template());
        assert!(Action::StructuralOverlap.consumes_read());
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(0, 0), Action::UnknownInRead);
        assert_eq!(classify(0, 3), Action::UnknownInRead);
        assert_eq!(classify(2, 0), Action::UnknownInTemplate);
        assert_eq!(classify(2, 2), Action::Match);
        assert_eq!(classify(2, 3), Action::Mismatch);
        assert_eq!(template_base(&[1, 2], -1), 0);
        assert_eq!(template_base(&[1, 2], 2), 0);
        assert_eq!(template_base(&[1, 2], 1), 2);
    }

    #[test]
    fn test_build_merges_runs() {
        let seq = ActionSequence::build("==2=X1I", 4, 30).unwrap();
        assert_eq!(seq.runs(), &[(Action::Match, 4), (Action::Mismatch, 1), (Action::InsertReadBase, 1)]);
        assert_eq!(seq.score(), 30);
        assert_eq!(seq.template_start(), 4);
        assert_eq!(seq.read_length(), 6);
        assert_eq!(seq.template_length(), 5);
        assert_eq!(seq.template_end(), 9);
        assert_eq!(seq.run_string(), "4=1X1I");
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(ActionSequence::build("3=Q", 0, 0), Err(ParseActionsError::UnknownAction('Q')));
        assert!(matches!(ActionSequence::build("3=4", 0, 0), Err(ParseActionsError::DanglingCount(_))));
    }

    #[test]
    fn test_zero_length_runs_are_dropped() {
        let mut seq = ActionSequence::new(0, 0);
        seq.push(Action::Match, 0);
        assert!(seq.runs().is_empty());
        seq.push(Action::Match, 3);
        seq.push(Action::Match, 2);
        assert_eq!(seq.runs(), &[(Action::Match, 5)]);
    }

    #[test]
    fn test_words_round_trip() {
        let seq = ActionSequence::build("20=1I30=", 0, 20).unwrap();
        let words = seq.to_words();
        assert_eq!(words, vec![3, 20, 0, 0, 20, 2, 1, 0, 30]);
        assert_eq!(ActionSequence::from_words(&words), Some(seq));
        assert_eq!(ActionSequence::from_words(&[1, 0, 0, 0]), None);
        assert_eq!(ActionSequence::from_words(&[1, 0, 0, 0, 0]), None);
    }

    #[test]
    fn test_mirrored() {
        // template window of length 20, alignment covering [3, 11)
        let seq = ActionSequence::build("2=3D3=1I", 3, 26).unwrap();
        let m = seq.mirrored(20);
        assert_eq!(m.run_string(), "1I3=3D2=");
        assert_eq!(m.template_start(), 20 - 11);
        assert_eq!(m.mirrored(20), seq);
    }

    #[test]
    fn test_sentinel_display() {
        let seq = ActionSequence::no_alignment(7);
        assert!(seq.is_no_alignment());
        assert_eq!(seq.to_string(), "score=none start=7 ");
        assert_eq!(seq.mirrored(100), seq);
    }
}
