use std::sync::Arc;

use super::dispatch::{AlignerChain, Kernels};
use super::AlignerKind;
use crate::align_opt::{AlignerConfig, ConfigError};
use crate::core::alignment::banded::BandedAligner;
use crate::core::alignment::no_indel::NoIndelAligner;
use crate::core::alignment::penalties::IndelPenaltyTable;
use crate::core::alignment::reverse_complement::ReverseComplementAdapter;
use crate::core::alignment::seeding::SeededAligner;
use crate::core::alignment::single_indel::SingleIndelAligner;
use crate::core::alignment::soft_clip::SoftClipper;
use crate::core::alignment::split_read::SplitReadAligner;
use crate::core::alignment::validator::Validator;

/// Validated, immutable configuration from which worker chains are built.
/// Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct AlignerFactory {
    config: Arc<AlignerConfig>,
    heuristics: Arc<[AlignerKind]>,
    indels: Arc<IndelPenaltyTable>,
    clipper: Option<SoftClipper>,
}

impl AlignerFactory {
    pub fn new(config: AlignerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let heuristics: Vec<AlignerKind> = config
            .chain
            .order
            .iter()
            .copied()
            .filter(|k| !k.is_exact())
            .collect();
        let clipper = config
            .soft_clip_limit
            .map(|limit| SoftClipper::new(limit, config.penalties))
            .transpose()?;
        let indels = config.indel_table();
        log::debug!(
            "aligner chain: {} then banded, penalties {}",
            heuristics
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(","),
            config.penalties
        );
        Ok(Self {
            config: Arc::new(config),
            heuristics: heuristics.into(),
            indels: Arc::new(indels),
            clipper,
        })
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Build an independent chain with its own scratch space.
    pub fn chain(&self) -> AlignerChain {
        let config = &*self.config;
        let penalties = config.penalties;
        let uses = |kind: AlignerKind| self.heuristics.contains(&kind);
        let split = if uses(AlignerKind::SplitRead) {
            config
                .split
                .layout
                .clone()
                .map(|layout| SplitReadAligner::new(penalties, layout, config.split.segment_shift))
        } else {
            None
        };
        let margin = split.as_ref().map_or(0, |s| s.template_margin());

        let kernels = Kernels {
            heuristics: self.heuristics.to_vec(),
            no_indel: uses(AlignerKind::NoIndel).then(|| NoIndelAligner::new(penalties)),
            single_indel: uses(AlignerKind::SingleIndel)
                .then(|| SingleIndelAligner::new(penalties, (*self.indels).clone())),
            seeded: uses(AlignerKind::Seeded).then(|| SeededAligner::new(penalties, config.seed.clone())),
            split,
            banded: BandedAligner::new(penalties),
            validator: Validator::new(penalties),
            validate_heuristics: config.chain.validate_heuristics,
            cross_check: config.chain.cross_check,
        };
        AlignerChain {
            kernels,
            rc: ReverseComplementAdapter::new(margin),
            clipper: self.clipper.clone(),
        }
    }
}
