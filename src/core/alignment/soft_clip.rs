//! Soft-clip post-processing.
//!
//! Edits (mismatches, unknowns, indels) close to either end of an alignment
//! are converted into unscored soft clips. Working inwards from an end, an
//! edit run is clipped when no more than `limit` matches separate it from the
//! end or from the previously clipped run. Clipped read-consuming actions
//! become `SoftClip`; clipped deletions are dropped and, at the start, move
//! the anchor forward.

use super::actions::{Action, ActionSequence};
use super::penalties::Penalties;
use crate::align_opt::ConfigError;

#[derive(Debug, Clone)]
pub struct SoftClipper {
    limit: u32,
    penalties: Penalties,
}

impl SoftClipper {
    pub fn new(limit: i32, penalties: Penalties) -> Result<Self, ConfigError> {
        if limit < 0 {
            return Err(ConfigError::InvalidSoftClipLimit(limit));
        }
        Ok(Self {
            limit: limit as u32,
            penalties,
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Clip `actions`; returns the input unchanged when nothing is clipped,
    /// when the input is the sentinel, or when no match would remain.
    pub fn clip(&self, actions: &ActionSequence) -> ActionSequence {
        if actions.is_no_alignment() {
            return actions.clone();
        }
        let flat: Vec<Action> = actions.expanded().collect();
        let head = clip_length(flat.iter().copied(), self.limit);
        let tail = clip_length(flat.iter().rev().copied(), self.limit);
        if head == 0 && tail == 0 {
            return actions.clone();
        }
        if head + tail >= flat.len() || !flat[head..flat.len() - tail].contains(&Action::Match) {
            return actions.clone();
        }

        let mut start = actions.template_start();
        let mut clipped = ActionSequence::new(0, 0);
        for &action in &flat[..head] {
            if action.consumes_template() {
                start += 1;
            }
            if action.consumes_read() {
                clipped.push(Action::SoftClip, 1);
            }
        }
        for &action in &flat[head..flat.len() - tail] {
            clipped.push(action, 1);
        }
        for &action in &flat[flat.len() - tail..] {
            if action.consumes_read() {
                clipped.push(Action::SoftClip, 1);
            }
        }
        clipped.set_template_start(start);
        clipped.set_score(self.penalties.score_operations(clipped.operations()));
        clipped
    }
}

/// Number of actions to clip from the front of `actions`.
fn clip_length(actions: impl Iterator<Item = Action>, limit: u32) -> usize {
    let mut actions = actions.peekable();
    let mut cut = 0usize;
    let mut pos = 0usize;
    let mut matches = 0u32;
    while let Some(action) = actions.next() {
        pos += 1;
        if action.is_edit() {
            if matches > limit {
                break;
            }
            while actions.next_if(|a| a.is_edit()).is_some() {
                pos += 1;
            }
            cut = pos;
            matches = 0;
        } else if action == Action::Match {
            matches += 1;
        }
    }
    cut
}
