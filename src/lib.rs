pub mod align_opt;
pub mod core;
pub mod defaults;
pub mod pipelines;

pub use align_opt::{AlignerConfig, ChainParams, ConfigError, SeedParams, SplitParams};
pub use crate::core::alignment::actions::{Action, ActionSequence, NO_ALIGNMENT};
pub use crate::core::alignment::cigar::AlignmentResult;
pub use crate::core::alignment::penalties::{IndelPenaltyTable, Penalties};
pub use crate::core::alignment::request::{AlignRequest, Arm};
pub use crate::core::alignment::validator::{Validator, Violation};
pub use pipelines::chain::{AlignerChain, AlignerFactory, AlignerKind, ChainStats};
