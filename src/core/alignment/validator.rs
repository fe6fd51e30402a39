//! Independent re-scorer for action sequences.
//!
//! The validator walks the flattened word form of an alignment against the
//! read and template bytes and recomputes the score from scratch. It shares
//! nothing with the aligners except the residue classifier and the penalty
//! model, so it can be used as an oracle in tests and as a guard on
//! heuristic results in the dispatcher.
//!
//! Checks run in a fixed order and the first failure is reported.

use thiserror::Error;

use super::actions::{classify, template_base, Action, ActionSequence, HEADER_WORDS, NO_ALIGNMENT};
use super::penalties::Penalties;

/// A consistency problem found in an action sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("action array is null")]
    Null,
    #[error("action array has {words} words, fewer than the {HEADER_WORDS} header words")]
    TooShort { words: usize },
    #[error("negative action count {0}")]
    NegativeCount(i32),
    #[error("action array declares {declared} runs but has {words} words")]
    LengthMismatch { declared: i32, words: usize },
    #[error("negative score {0}")]
    NegativeScore(i32),
    #[error("run {run}: unknown action code {code}")]
    UnknownAction { run: usize, code: i32 },
    #[error("run {run}: non-positive run length {len}")]
    NonPositiveRun { run: usize, len: i32 },
    #[error("run {run}: {action:?} after the read was fully consumed")]
    ActionAfterRead { run: usize, action: Action },
    #[error("run {run}: claims {claimed:?} at read {read_pos} / template {template_pos} but bytes give {actual:?}")]
    ByteMismatch {
        run: usize,
        read_pos: usize,
        template_pos: i64,
        claimed: Action,
        actual: Action,
    },
    #[error("actions cover {covered} read bases, read has {read_len}")]
    ReadNotCovered { covered: usize, read_len: usize },
    #[error("no-alignment sentinel used but the actions score {computed} < bound {max_score}")]
    FalseSentinel { computed: i32, max_score: i32 },
    #[error("claimed score {claimed} but actions score {computed}")]
    ScoreMismatch { claimed: i32, computed: i32 },
    #[error("score {score} is not below the bound {max_score}")]
    ScoreNotBelowBound { score: i32, max_score: i32 },
}

/// Re-scores alignments with a fixed penalty model.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    penalties: Penalties,
}

impl Validator {
    pub fn new(penalties: Penalties) -> Self {
        Self { penalties }
    }

    pub fn penalties(&self) -> &Penalties {
        &self.penalties
    }

    /// Validate a structured sequence (flattens it first).
    pub fn validate_actions(
        &self,
        actions: &ActionSequence,
        read: &[u8],
        template: &[u8],
        max_score: i32,
    ) -> Result<(), Violation> {
        let words = actions.to_words();
        self.validate(Some(&words), read, template, max_score)
    }

    /// Validate a flattened action array.
    pub fn validate(
        &self,
        words: Option<&[i32]>,
        read: &[u8],
        template: &[u8],
        max_score: i32,
    ) -> Result<(), Violation> {
        let words = words.ok_or(Violation::Null)?;
        if words.len() < HEADER_WORDS {
            return Err(Violation::TooShort { words: words.len() });
        }
        let (count, score, start) = (words[0], words[1], words[2]);
        if count < 0 {
            return Err(Violation::NegativeCount(count));
        }
        if words.len() as i64 != HEADER_WORDS as i64 + 2 * count as i64 {
            return Err(Violation::LengthMismatch {
                declared: count,
                words: words.len(),
            });
        }
        if score == NO_ALIGNMENT && count == 0 {
            return Ok(());
        }
        if score < 0 {
            return Err(Violation::NegativeScore(score));
        }

        let mut read_pos = 0usize;
        let mut template_pos = start as i64;
        let mut runs = Vec::with_capacity(count as usize);
        for (run, pair) in words[HEADER_WORDS..].chunks_exact(2).enumerate() {
            let action = Action::from_code(pair[0]).ok_or(Violation::UnknownAction { run, code: pair[0] })?;
            let len = pair[1];
            if len <= 0 {
                return Err(Violation::NonPositiveRun { run, len });
            }
            if read_pos >= read.len() {
                return Err(Violation::ActionAfterRead { run, action });
            }
            let len = len as usize;
            if action.consumes_read() && read_pos + len > read.len() {
                return Err(Violation::ActionAfterRead { run, action });
            }
            if action.is_byte_checked() {
                for _ in 0..len {
                    let actual = classify(read[read_pos], template_base(template, template_pos));
                    if actual != action {
                        return Err(Violation::ByteMismatch {
                            run,
                            read_pos,
                            template_pos,
                            claimed: action,
                            actual,
                        });
                    }
                    read_pos += 1;
                    template_pos += 1;
                }
            } else {
                if action.consumes_read() {
                    read_pos += len;
                }
                if action.consumes_template() {
                    template_pos += len as i64;
                }
            }
            runs.push((action, len as u32));
        }
        if read_pos < read.len() {
            return Err(Violation::ReadNotCovered {
                covered: read_pos,
                read_len: read.len(),
            });
        }

        let computed = self.penalties.score_operations(runs);
        if score == NO_ALIGNMENT {
            if computed < max_score {
                return Err(Violation::FalseSentinel { computed, max_score });
            }
            return Ok(());
        }
        if computed != score {
            return Err(Violation::ScoreMismatch {
                claimed: score,
                computed,
            });
        }
        if score >= max_score {
            return Err(Violation::ScoreNotBelowBound { score, max_score });
        }
        Ok(())
    }
}
