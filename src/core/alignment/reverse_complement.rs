//! Reverse-complement orientation adapter.
//!
//! A reverse-strand call aligns the reverse complement of the read against
//! the forward template. Instead of copying the read, the adapter takes the
//! equivalent mirrored problem: the read as given against the reverse
//! complement of the template window
//!
//! ```text
//!   lo = start - shift - margin            hi = start + len + shift + margin
//!   forward  [lo ............................................ hi)
//!   window   x = hi - 1 - y, base = complement(template[y]), 0 off-template
//! ```
//!
//! The forward read position `start` lands at window position
//! `hi - (start + len)`. Results are mirrored back about `hi`, and the arm
//! anchor flips because the read's left end now sits at the template's
//! right.

use super::actions::{template_base, ActionSequence};
use super::request::AlignRequest;
use crate::core::compute::encoding::complement_code;

/// Coordinates of one reverse-complement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcFrame {
    window_end: i64,
    window_start: i32,
    original_start: i32,
}

impl RcFrame {
    /// Fill `window` with the reverse-complemented template window for `req`.
    pub fn prepare(req: &AlignRequest, margin: u32, window: &mut Vec<u8>) -> Self {
        let pad = req.shift() as i64 + margin as i64;
        let lo = req.template_start as i64 - pad;
        let hi = req.template_start as i64 + req.read.len() as i64 + pad;
        window.clear();
        window.extend((lo..hi).rev().map(|y| complement_code(template_base(req.template, y))));
        Self {
            window_end: hi,
            window_start: (hi - (req.template_start as i64 + req.read.len() as i64)) as i32,
            original_start: req.template_start,
        }
    }

    /// The mirrored request against `window`.
    pub fn request<'a>(&self, req: &AlignRequest<'a>, window: &'a [u8]) -> AlignRequest<'a> {
        AlignRequest {
            read: req.read,
            template: window,
            template_start: self.window_start,
            max_score: req.max_score,
            max_shift: req.max_shift,
            arm: req.arm.map(|a| a.flipped()),
        }
    }

    /// Map a window-coordinate result back to forward coordinates.
    pub fn restore(&self, result: ActionSequence) -> ActionSequence {
        if result.is_no_alignment() {
            return ActionSequence::no_alignment(self.original_start);
        }
        result.mirrored(self.window_end as i32)
    }
}

/// Results that can be mapped back through an [`RcFrame`].
pub trait Oriented {
    fn restore(self, frame: &RcFrame) -> Self;
}

impl Oriented for ActionSequence {
    fn restore(self, frame: &RcFrame) -> Self {
        frame.restore(self)
    }
}

impl Oriented for Option<ActionSequence> {
    fn restore(self, frame: &RcFrame) -> Self {
        self.map(|r| frame.restore(r))
    }
}

/// Owns the window buffer and applies the adapter around a forward aligner.
#[derive(Debug, Default)]
pub struct ReverseComplementAdapter {
    margin: u32,
    window: Vec<u8>,
}

impl ReverseComplementAdapter {
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            window: Vec::new(),
        }
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Run `align` on the forward request, or on the mirrored request when
    /// `reverse_complement` is set.
    pub fn align<R, F>(&mut self, req: &AlignRequest, reverse_complement: bool, align: F) -> R
    where
        R: Oriented,
        F: FnOnce(&AlignRequest<'_>) -> R,
    {
        if !reverse_complement {
            return align(req);
        }
        let frame = RcFrame::prepare(req, self.margin, &mut self.window);
        let mirrored = frame.request(req, &self.window);
        align(&mirrored).restore(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::banded::BandedAligner;
    use crate::core::alignment::penalties::Penalties;
    use crate::core::alignment::request::Arm;
    use crate::core::compute::encoding::{encode_dna, reverse_complement};

    #[test]
    fn test_prepare_window() {
        let template = encode_dna(b"AACCGGTT");
        let read = encode_dna(b"CCG");
        let req = AlignRequest::new(&read, &template, 2).with_max_shift(1).with_arm(Some(Arm::Left));
        let mut window = Vec::new();
        let frame = RcFrame::prepare(&req, 1, &mut window);
        // forward [0, 7) reverse complemented
        assert_eq!(window, reverse_complement(&template[0..7]));
        let m = frame.request(&req, &window);
        assert_eq!(m.template_start, 2);
        assert_eq!(m.arm, Some(Arm::Right));
    }

    #[test]
    fn test_window_pads_off_template() {
        let template = encode_dna(b"ACGT");
        let read = encode_dna(b"AC");
        let req = AlignRequest::new(&read, &template, 0).with_max_shift(1);
        let mut window = Vec::new();
        RcFrame::prepare(&req, 0, &mut window);
        // forward [-1, 3): G C A complemented, then the off-template pad
        assert_eq!(window, vec![2, 3, 4, 0]);
    }

    #[test]
    fn test_restore_sentinel_keeps_start() {
        let template = encode_dna(b"ACGT");
        let read = encode_dna(b"AC");
        let req = AlignRequest::new(&read, &template, 1);
        let mut window = Vec::new();
        let frame = RcFrame::prepare(&req, 0, &mut window);
        assert_eq!(frame.restore(ActionSequence::no_alignment(5)), ActionSequence::no_alignment(1));
    }

    #[test]
    fn test_reverse_strand_alignment() {
        // The read is the reverse complement of template[5..10].
        let template = encode_dna(b"TTTTTACGTATC");
        let read = reverse_complement(&template[5..10]);
        let mut adapter = ReverseComplementAdapter::new(0);
        let mut banded = BandedAligner::new(Penalties::default());
        let req = AlignRequest::new(&read, &template, 5).with_max_shift(2);
        let a = adapter.align(&req, true, |r| banded.align(r));
        assert_eq!((a.score(), a.template_start(), a.run_string().as_str()), (0, 5, "5="));
        // Forward, the read itself sits one base earlier.
        let forward = adapter.align(&req, false, |r| banded.align(r));
        assert_eq!((forward.score(), forward.template_start()), (0, 4));
    }
}
