//! Per-call alignment inputs.

use super::actions::NO_ALIGNMENT;
use crate::defaults;

/// Which end of a split read anchors the alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm {
    /// The start of the read is anchored at `template_start`.
    Left,
    /// The end of the read is anchored at `template_start + read_len`.
    Right,
}

impl Arm {
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Arm::Left => Arm::Right,
            Arm::Right => Arm::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Arm::Left => 0,
            Arm::Right => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Arm::Left => "left",
            Arm::Right => "right",
        }
    }
}

/// A forward-strand alignment call.
///
/// `template_start` is the expected template position of the first read
/// base. Alignments may start anywhere within `max_shift` of it; anything
/// scoring `max_score` or more is reported as the no-alignment sentinel.
#[derive(Debug, Clone, Copy)]
pub struct AlignRequest<'a> {
    pub read: &'a [u8],
    pub template: &'a [u8],
    pub template_start: i32,
    pub max_score: i32,
    pub max_shift: u32,
    pub arm: Option<Arm>,
}

impl<'a> AlignRequest<'a> {
    /// Unbounded request with the default shift.
    pub fn new(read: &'a [u8], template: &'a [u8], template_start: i32) -> Self {
        Self {
            read,
            template,
            template_start,
            max_score: NO_ALIGNMENT,
            max_shift: defaults::MAX_SHIFT,
            arm: None,
        }
    }

    pub fn with_max_score(mut self, max_score: i32) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn with_max_shift(mut self, max_shift: u32) -> Self {
        self.max_shift = max_shift;
        self
    }

    pub fn with_arm(mut self, arm: Option<Arm>) -> Self {
        self.arm = arm;
        self
    }

    #[inline]
    pub fn shift(&self) -> i32 {
        self.max_shift.min(i32::MAX as u32 / 4) as i32
    }

    #[inline]
    pub fn read_len(&self) -> i32 {
        self.read.len() as i32
    }
}
