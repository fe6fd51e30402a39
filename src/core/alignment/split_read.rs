//! Split-read aligner for segmented reads (Complete Genomics layout).
//!
//! A read is a fixed series of segments separated by template-side features
//! of bounded size: an overlap (the next segment re-covers template already
//! covered) or a gap (unsequenced template between segments).
//!
//! ```text
//!   read      [ 5 ][   10   ][   10   ][   10   ]
//!                  ^overlap  ^small gap ^large gap
//!                   0..=4     0..=3      4..=8
//! ```
//!
//! The left arm pins the read start near `template_start` and walks the
//! segments left to right, aligning each one with a fixed start and a narrow
//! band. Every combination of feature sizes is enumerated depth first with
//! branch and bound on the running total; per-segment results are memoised
//! for the duration of one call. The right arm is the same search on the
//! reversed read, template and layout, mirrored back.

use std::collections::{BTreeMap, HashMap};

use super::actions::{Action, ActionSequence, NO_ALIGNMENT};
use super::banded::BandedAligner;
use super::no_indel::diagonal_order;
use super::penalties::Penalties;
use super::request::{AlignRequest, Arm};
use crate::align_opt::ConfigError;
use crate::defaults;

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureCategory {
    Overlap,
    SmallGap,
    LargeGap,
}

impl FeatureCategory {
    pub fn name(self) -> &'static str {
        match self {
            FeatureCategory::Overlap => "overlap",
            FeatureCategory::SmallGap => "small gap",
            FeatureCategory::LargeGap => "large gap",
        }
    }
}

/// Template-side feature between two consecutive segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFeature {
    Overlap { min: u32, max: u32 },
    Gap { min: u32, max: u32 },
}

impl SegmentFeature {
    pub fn range(&self) -> (u32, u32) {
        match *self {
            SegmentFeature::Overlap { min, max } | SegmentFeature::Gap { min, max } => (min, max),
        }
    }

    pub fn category(&self) -> FeatureCategory {
        match *self {
            SegmentFeature::Overlap { .. } => FeatureCategory::Overlap,
            SegmentFeature::Gap { min, .. } if min >= defaults::LARGE_GAP_MIN => FeatureCategory::LargeGap,
            SegmentFeature::Gap { .. } => FeatureCategory::SmallGap,
        }
    }
}

/// Segment lengths and the features between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLayout {
    segments: Vec<u32>,
    features: Vec<SegmentFeature>,
}

impl SplitLayout {
    pub fn new(segments: Vec<u32>, features: Vec<SegmentFeature>) -> Result<Self, ConfigError> {
        if segments.is_empty() {
            return Err(ConfigError::SplitLayout("no segments".into()));
        }
        if segments.iter().any(|&s| s == 0) {
            return Err(ConfigError::SplitLayout("segment lengths must be positive".into()));
        }
        if features.len() + 1 != segments.len() {
            return Err(ConfigError::SplitLayout(format!(
                "{} segments need {} features, got {}",
                segments.len(),
                segments.len() - 1,
                features.len()
            )));
        }
        for (j, f) in features.iter().enumerate() {
            let (min, max) = f.range();
            if min > max {
                return Err(ConfigError::SplitLayout(format!("feature {j}: range {min}-{max} is empty")));
            }
            if let SegmentFeature::Overlap { max, .. } = f {
                if *max >= segments[j + 1] {
                    return Err(ConfigError::SplitLayout(format!(
                        "feature {j}: overlap up to {max} swallows a {}-base segment",
                        segments[j + 1]
                    )));
                }
            }
        }
        Ok(Self { segments, features })
    }

    /// Complete Genomics v1 layout: `5,10,10,10` with overlap `0..=4`, small
    /// gap `0..=3` and large gap `4..=8`.
    pub fn complete_genomics() -> Self {
        Self {
            segments: vec![5, 10, 10, 10],
            features: vec![
                SegmentFeature::Overlap { min: 0, max: 4 },
                SegmentFeature::Gap { min: 0, max: 3 },
                SegmentFeature::Gap { min: 4, max: 8 },
            ],
        }
    }

    /// Parse `5,10,10,10/o0-4,g0-3,g4-8`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (segs, feats) = s
            .split_once('/')
            .ok_or_else(|| ConfigError::SplitLayout(format!("expected segments/features, got '{s}'")))?;
        let segments = segs
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::SplitLayout(format!("bad segment length '{v}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let features = if feats.trim().is_empty() {
            Vec::new()
        } else {
            feats.split(',').map(parse_feature).collect::<Result<Vec<_>, _>>()?
        };
        Self::new(segments, features)
    }

    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    pub fn features(&self) -> &[SegmentFeature] {
        &self.features
    }

    pub fn read_len(&self) -> usize {
        self.segments.iter().map(|&s| s as usize).sum()
    }

    /// Read offset one past segment `j`.
    pub fn segment_end(&self, j: usize) -> usize {
        self.segments[..=j].iter().map(|&s| s as usize).sum()
    }

    /// Largest total template the gaps can add.
    pub fn max_gap_total(&self) -> u32 {
        self.features
            .iter()
            .map(|f| match *f {
                SegmentFeature::Gap { max, .. } => max,
                SegmentFeature::Overlap { .. } => 0,
            })
            .sum()
    }

    /// The same layout read from the other end.
    pub fn reversed(&self) -> Self {
        Self {
            segments: self.segments.iter().rev().copied().collect(),
            features: self.features.iter().rev().copied().collect(),
        }
    }
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self::complete_genomics()
    }
}

fn parse_feature(s: &str) -> Result<SegmentFeature, ConfigError> {
    let s = s.trim();
    let bad = || ConfigError::SplitLayout(format!("bad feature '{s}', expected o<min>-<max> or g<min>-<max>"));
    let (kind, range) = s.split_at(s.len().min(1));
    let (lo, hi) = range.split_once('-').ok_or_else(bad)?;
    let min = lo.parse::<u32>().map_err(|_| bad())?;
    let max = hi.parse::<u32>().map_err(|_| bad())?;
    match kind {
        "o" => Ok(SegmentFeature::Overlap { min, max }),
        "g" => Ok(SegmentFeature::Gap { min, max }),
        _ => Err(bad()),
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Histograms of the chosen feature sizes, per feature and arm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// `(feature index, arm) -> (category, size -> count)`
    histograms: BTreeMap<(usize, usize), (FeatureCategory, BTreeMap<u32, u64>)>,
    pub declined: u64,
    pub no_alignment: u64,
}

impl SplitStats {
    pub fn record(&mut self, arm: Arm, feature: usize, category: FeatureCategory, size: u32) {
        let entry = self
            .histograms
            .entry((feature, arm.index()))
            .or_insert_with(|| (category, BTreeMap::new()));
        *entry.1.entry(size).or_insert(0) += 1;
    }

    pub fn count(&self, arm: Arm, feature: usize, size: u32) -> u64 {
        self.histograms
            .get(&(feature, arm.index()))
            .and_then(|(_, h)| h.get(&size).copied())
            .unwrap_or(0)
    }

    pub fn total(&self, arm: Arm, feature: usize) -> u64 {
        self.histograms
            .get(&(feature, arm.index()))
            .map_or(0, |(_, h)| h.values().sum())
    }

    pub fn merge(&mut self, other: &SplitStats) {
        for (&key, (category, hist)) in &other.histograms {
            let entry = self
                .histograms
                .entry(key)
                .or_insert_with(|| (*category, BTreeMap::new()));
            for (&size, &n) in hist {
                *entry.1.entry(size).or_insert(0) += n;
            }
        }
        self.declined += other.declined;
        self.no_alignment += other.no_alignment;
    }

    pub fn log_summary(&self, label: &str) {
        log::info!(
            "[{label}] split aligner: declined {} no-alignment {}",
            self.declined,
            self.no_alignment
        );
        for (&(feature, arm), (category, hist)) in &self.histograms {
            let arm = if arm == 0 { Arm::Left } else { Arm::Right };
            let row: Vec<String> = hist.iter().map(|(size, n)| format!("{size}:{n}")).collect();
            log::info!(
                "[{label}] feature {feature} ({}) {} arm: {}",
                category.name(),
                arm.name(),
                row.join(" ")
            );
        }
    }
}

// ============================================================================
// ALIGNER
// ============================================================================

#[derive(Debug, Clone)]
struct SegmentAlignment {
    score: i32,
    template_span: i32,
    actions: ActionSequence,
}

#[derive(Debug, Clone)]
struct Best {
    score: i32,
    anchor: i32,
    sizes: Vec<u32>,
}

/// Depth-first search state for one call.
struct SegmentSearch<'a> {
    banded: &'a mut BandedAligner,
    memo: &'a mut HashMap<(usize, usize, i32), SegmentAlignment>,
    layout: &'a SplitLayout,
    read: &'a [u8],
    template: &'a [u8],
    segment_shift: u32,
    max_score: i32,
    sizes: Vec<u32>,
    best: Option<Best>,
}

impl SegmentSearch<'_> {
    fn segment(&mut self, j: usize, read_start: usize, template_start: i32) -> (i32, i32) {
        let key = (j, read_start, template_start);
        if let Some(seg) = self.memo.get(&key) {
            return (seg.score, seg.template_span);
        }
        let read_end = self.layout.segment_end(j);
        let actions = self.banded.align_fixed_start(
            self.read,
            read_start,
            read_end,
            self.template,
            template_start,
            NO_ALIGNMENT,
            self.segment_shift,
        );
        let seg = SegmentAlignment {
            score: actions.score(),
            template_span: actions.template_length() as i32,
            actions,
        };
        let out = (seg.score, seg.template_span);
        self.memo.insert(key, seg);
        out
    }

    fn bound(&self) -> i32 {
        self.best.as_ref().map_or(self.max_score, |b| b.score.min(self.max_score))
    }

    fn descend(&mut self, j: usize, read_start: usize, template_start: i32, acc: i32, anchor: i32) {
        let (score, span) = self.segment(j, read_start, template_start);
        let acc = acc.saturating_add(score);
        if acc >= self.bound() {
            return;
        }
        if j + 1 == self.layout.segments().len() {
            self.best = Some(Best {
                score: acc,
                anchor,
                sizes: self.sizes.clone(),
            });
            return;
        }
        let feature = self.layout.features()[j];
        let seg_end = self.layout.segment_end(j);
        let next_template = template_start + span;
        let (min, max) = feature.range();
        for size in min..=max {
            self.sizes.push(size);
            match feature {
                SegmentFeature::Overlap { .. } => {
                    self.descend(j + 1, seg_end + size as usize, next_template, acc, anchor)
                }
                SegmentFeature::Gap { .. } => {
                    self.descend(j + 1, seg_end, next_template + size as i32, acc, anchor)
                }
            }
            self.sizes.pop();
        }
    }

    /// Rebuild the full action sequence for the best path.
    fn assemble(&self, best: &Best) -> ActionSequence {
        let mut actions = ActionSequence::new(best.score, best.anchor);
        let mut read_start = 0usize;
        let mut template_start = best.anchor;
        for j in 0..self.layout.segments().len() {
            if let Some(seg) = self.memo.get(&(j, read_start, template_start)) {
                actions.extend_runs(seg.actions.operations());
                template_start += seg.template_span;
            }
            if j < best.sizes.len() {
                let size = best.sizes[j];
                let seg_end = self.layout.segment_end(j);
                match self.layout.features()[j] {
                    SegmentFeature::Overlap { .. } => {
                        actions.push(Action::StructuralOverlap, size);
                        read_start = seg_end + size as usize;
                    }
                    SegmentFeature::Gap { .. } => {
                        actions.push(Action::StructuralGap, size);
                        read_start = seg_end;
                        template_start += size as i32;
                    }
                }
            }
        }
        actions
    }
}

/// Split-read aligner handle.
#[derive(Debug)]
pub struct SplitReadAligner {
    layout: SplitLayout,
    reversed: SplitLayout,
    segment_shift: u32,
    banded: BandedAligner,
    memo: HashMap<(usize, usize, i32), SegmentAlignment>,
    reversed_read: Vec<u8>,
    reversed_template: Vec<u8>,
}

impl SplitReadAligner {
    pub fn new(penalties: Penalties, layout: SplitLayout, segment_shift: u32) -> Self {
        let reversed = layout.reversed();
        Self {
            layout,
            reversed,
            segment_shift,
            banded: BandedAligner::new(penalties),
            memo: HashMap::new(),
            reversed_read: Vec::new(),
            reversed_template: Vec::new(),
        }
    }

    pub fn layout(&self) -> &SplitLayout {
        &self.layout
    }

    /// Largest template extent beyond the read length a call can touch.
    pub fn template_margin(&self) -> u32 {
        self.layout.max_gap_total() + self.segment_shift * self.layout.segments().len() as u32
    }

    /// Returns `None` for calls without an arm or with a read that does not
    /// fit the layout.
    pub fn align(&mut self, req: &AlignRequest, stats: &mut SplitStats) -> Option<ActionSequence> {
        let Some(arm) = req.arm else {
            stats.declined += 1;
            return None;
        };
        if req.read.len() != self.layout.read_len() {
            stats.declined += 1;
            return None;
        }
        if req.max_score <= 0 {
            stats.no_alignment += 1;
            return Some(ActionSequence::no_alignment(req.template_start));
        }

        let result = match arm {
            Arm::Left => {
                let best = self.search_left(false, req.read, req.template, req.template_start, req);
                best.map(|(best, actions)| (best.sizes, actions))
            }
            Arm::Right => {
                let mut read = std::mem::take(&mut self.reversed_read);
                let mut template = std::mem::take(&mut self.reversed_template);
                read.clear();
                read.extend(req.read.iter().rev());
                template.clear();
                template.extend(req.template.iter().rev());
                let window_end = req.template.len() as i32;
                let anchor = window_end - (req.template_start + req.read_len());
                let best = self.search_left(true, &read, &template, anchor, req);
                self.reversed_read = read;
                self.reversed_template = template;
                best.map(|(best, actions)| {
                    let mut sizes = best.sizes;
                    sizes.reverse();
                    (sizes, actions.mirrored(window_end))
                })
            }
        };

        match result {
            Some((sizes, actions)) => {
                for (j, &size) in sizes.iter().enumerate() {
                    stats.record(arm, j, self.layout.features()[j].category(), size);
                }
                log::debug!(
                    "split {} arm: score {} start {} sizes {:?}",
                    arm.name(),
                    actions.score(),
                    actions.template_start(),
                    sizes
                );
                Some(actions)
            }
            None => {
                stats.no_alignment += 1;
                Some(ActionSequence::no_alignment(req.template_start))
            }
        }
    }

    /// Left-anchored search. Anchors are tried closest to `anchor` first.
    fn search_left(
        &mut self,
        reversed: bool,
        read: &[u8],
        template: &[u8],
        anchor: i32,
        req: &AlignRequest,
    ) -> Option<(Best, ActionSequence)> {
        self.memo.clear();
        let layout = if reversed { &self.reversed } else { &self.layout };
        let mut search = SegmentSearch {
            banded: &mut self.banded,
            memo: &mut self.memo,
            layout,
            read,
            template,
            segment_shift: self.segment_shift,
            max_score: req.max_score,
            sizes: Vec::with_capacity(layout.features().len()),
            best: None,
        };
        for d in diagonal_order(req.shift()) {
            let start = anchor + d;
            search.descend(0, 0, start, 0, start);
        }
        let best = search.best.take()?;
        let actions = search.assemble(&best);
        Some((best, actions))
    }
}
