//! Core alignment kernels - banded, single-indel, seeded and split-read
//! edit-distance aligners plus the action model they share.
//!
//! These modules are agnostic to where reads and templates come from. Each
//! aligner is a handle that owns its scratch buffers; build one per worker.

pub mod actions; // Action model and run-length sequences
pub mod banded; // Exact banded affine-gap aligner
pub mod cigar;
pub mod edit_distance;
pub mod no_indel;
pub mod penalties;
pub mod request;
pub mod reverse_complement; // Orientation adapter
pub mod seeding; // Seed-and-extend aligner
pub mod single_indel;
pub mod soft_clip;
pub mod split_read; // Segmented (Complete Genomics) reads
pub mod validator; // Independent re-scorer
pub mod workspace; // Reusable DP buffers
