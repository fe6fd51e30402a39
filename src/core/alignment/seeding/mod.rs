//! Seed-and-extend aligner for longer reads.
//!
//! # Module Organization
//!
//! - `index` - read k-mer index, template hits, chaining and seed blocks
//! - `walk` - resynchronising extension towards the read ends
//! - `stats` - failure and delegation counters (`SeedStats`)
//! - `aligner` - `SeededAligner`, which stitches the pieces together
//!
//! # Algorithm Overview
//!
//! 1. **Seeding**: index the read's unique k-mers and scan the banded
//!    template window for exact hits.
//!
//! 2. **Chaining**: keep the best co-linear chain, collapse it into blocks per
//!    diagonal and grow the blocks by exact matches.
//!
//! 3. **Gap resolution**: between blocks place substitutions or the cheapest
//!    single indel; dense gaps go to the exact aligner with both ends pinned.
//!
//! 4. **Extension**: walk outwards from the first and last block, handing
//!    regions that cannot be resynchronised to the exact aligner.
//!
//! Reads that cannot be seeded, paths that leave the template or the band, and
//! indels closer than `indel_spacing` yield `None`.

mod aligner;
mod index;
mod stats;
mod walk;

pub use aligner::SeededAligner;
pub use index::{Block, KmerIndex, SeedHit};
pub use stats::SeedStats;
