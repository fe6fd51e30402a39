//! Drivers that combine the core kernels.
//!
//! - `chain`: priority-ordered dispatch with the exact aligner as fallback
//! - `batch`: parallel alignment of tab-separated request files

pub mod batch;
pub mod chain;
