// src/align_opt.rs
//
// Aligner options and the stage parameter bundles handed to each kernel.

use thiserror::Error;

use crate::core::alignment::penalties::{IndelPenaltyTable, Penalties};
use crate::core::alignment::split_read::SplitLayout;
use crate::defaults;
use crate::pipelines::chain::AlignerKind;

/// Configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} penalty must be >= 0, got {value}")]
    InvalidPenalty { name: &'static str, value: i32 },

    #[error("penalties must be MISMATCH,UNKNOWN,OPEN,EXTEND: {0}")]
    PenaltyParse(String),

    #[error("invalid indel penalty table: {0}")]
    IndelTable(String),

    #[error("invalid split layout: {0}")]
    SplitLayout(String),

    #[error("invalid seed parameter {name}: {reason}")]
    SeedParam { name: &'static str, reason: String },

    #[error("invalid aligner order: {0}")]
    AlignerOrder(String),

    #[error("soft clip limit must be >= 0, got {0}")]
    InvalidSoftClipLimit(i32),
}

/// All options for building aligner chains.
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    // Scoring parameters
    pub penalties: Penalties,
    pub indel_table: Option<IndelPenaltyTable>, // None: derived from the affine penalties

    // Stage parameters
    pub seed: SeedParams,
    pub split: SplitParams,
    pub chain: ChainParams,

    // Post-processing
    pub soft_clip_limit: Option<i32>, // None: no soft clipping
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            penalties: Penalties::default(),
            indel_table: None,
            seed: SeedParams::default(),
            split: SplitParams::default(),
            chain: ChainParams::default(),
            soft_clip_limit: None,
        }
    }
}

// ============================================================================
// STAGE-SPECIFIC PARAMETER BUNDLES
// ============================================================================

/// Parameters for the seed-and-extend aligner.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedParams {
    pub seed_len: usize,
    pub resync_length: usize,
    pub max_indel: u32,
    pub indel_spacing: usize,
    pub max_mismatch_density: f64,
    pub min_chain_seeds: usize,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            seed_len: defaults::SEED_LEN,
            resync_length: defaults::RESYNC_LENGTH,
            max_indel: defaults::MAX_INDEL,
            indel_spacing: defaults::INDEL_SPACING,
            max_mismatch_density: defaults::MAX_MISMATCH_DENSITY,
            min_chain_seeds: defaults::MIN_CHAIN_SEEDS,
        }
    }
}

impl SeedParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |name: &'static str, reason: String| Err(ConfigError::SeedParam { name, reason });
        if !(1..=defaults::MAX_SEED_LEN).contains(&self.seed_len) {
            return bad(
                "seed_len",
                format!("must be in 1..={}, got {}", defaults::MAX_SEED_LEN, self.seed_len),
            );
        }
        if self.resync_length < 1 {
            return bad("resync_length", "must be >= 1".into());
        }
        if self.max_indel < 1 {
            return bad("max_indel", "must be >= 1".into());
        }
        if !(self.max_mismatch_density.is_finite() && (0.0..=1.0).contains(&self.max_mismatch_density)) {
            return bad(
                "max_mismatch_density",
                format!("must be in [0, 1], got {}", self.max_mismatch_density),
            );
        }
        Ok(())
    }
}

/// Parameters for the split-read aligner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitParams {
    pub layout: Option<SplitLayout>,
    pub segment_shift: u32,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            layout: None,
            segment_shift: defaults::SEGMENT_SHIFT,
        }
    }
}

impl SplitParams {
    pub fn complete_genomics() -> Self {
        Self {
            layout: Some(SplitLayout::complete_genomics()),
            ..Default::default()
        }
    }
}

/// Parameters for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub order: Vec<AlignerKind>,
    pub validate_heuristics: bool, // re-check heuristic results before trusting them
    pub cross_check: bool,         // compare every result against an unbounded exact run
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            order: vec![
                AlignerKind::NoIndel,
                AlignerKind::SingleIndel,
                AlignerKind::Seeded,
                AlignerKind::Banded,
            ],
            validate_heuristics: true,
            cross_check: false,
        }
    }
}

impl AlignerConfig {
    /// Indel table for the single-indel aligner.
    pub fn indel_table(&self) -> IndelPenaltyTable {
        self.indel_table
            .clone()
            .unwrap_or_else(|| IndelPenaltyTable::from_affine(&self.penalties))
    }

    /// Validate parameters for consistency across stages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.penalties.validate()?;
        self.seed.validate()?;
        if let Some(limit) = self.soft_clip_limit {
            if limit < 0 {
                return Err(ConfigError::InvalidSoftClipLimit(limit));
            }
        }
        if self.chain.order.is_empty() {
            return Err(ConfigError::AlignerOrder("no aligners listed".into()));
        }
        for (i, kind) in self.chain.order.iter().enumerate() {
            if self.chain.order[..i].contains(kind) {
                return Err(ConfigError::AlignerOrder(format!("{} listed twice", kind.name())));
            }
        }
        let uses = |kind: AlignerKind| self.chain.order.contains(&kind);
        if uses(AlignerKind::SplitRead) && self.split.layout.is_none() {
            return Err(ConfigError::AlignerOrder("split aligner requires a layout".into()));
        }
        if self.indel_table.is_some() && !uses(AlignerKind::SingleIndel) {
            log::warn!("indel penalty table given but the single-indel aligner is not in the chain");
        }
        if self.split.layout.is_some() && !uses(AlignerKind::SplitRead) {
            log::warn!("split layout given but the split aligner is not in the chain");
        }
        if self.chain.order.last() != Some(&AlignerKind::Banded) {
            log::debug!("exact aligner appended to the end of the chain");
        }
        Ok(())
    }
}

/// Parse penalties from a comma-separated string (e.g., "9,5,19,1").
/// Order: mismatch, unknown, gap open, gap extend.
pub fn parse_penalties(s: &str) -> Result<Penalties, ConfigError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [mismatch, unknown, open, extend] = parts.as_slice() else {
        return Err(ConfigError::PenaltyParse(s.to_string()));
    };
    let int = |v: &str| {
        v.parse::<i32>()
            .map_err(|_| ConfigError::PenaltyParse(format!("'{v}' in {s}")))
    };
    Penalties::new(int(mismatch)?, int(unknown)?, int(open)?, int(extend)?)
}

/// Parse an aligner order such as "noindel,single,seeded,banded".
pub fn parse_aligner_order(s: &str) -> Result<Vec<AlignerKind>, ConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse::<AlignerKind>)
        .collect()
}
