// src/defaults.rs

// Scoring Constants
pub const MISMATCH_PENALTY: i32 = 9;
pub const UNKNOWN_PENALTY: i32 = 5;
pub const GAP_OPEN_PENALTY: i32 = 19;
pub const GAP_EXTEND_PENALTY: i32 = 1;
pub const PENALTIES: &str = "9,5,19,1";

// Band Constants
pub const MAX_SHIFT: u32 = 7;

// Seed-and-extend Constants
pub const SEED_LEN: usize = 8;
pub const MAX_SEED_LEN: usize = 12;
pub const RESYNC_LENGTH: usize = 8;
pub const MAX_INDEL: u32 = 4;
pub const INDEL_SPACING: usize = 8;
pub const MAX_MISMATCH_DENSITY: f64 = 0.25;
pub const MIN_CHAIN_SEEDS: usize = 2;

// Split-read Constants
pub const SEGMENT_SHIFT: u32 = 1;
pub const LARGE_GAP_MIN: u32 = 4;
pub const COMPLETE_GENOMICS_LAYOUT: &str = "5,10,10,10/o0-4,g0-3,g4-8";

// Chain Constants
pub const ALIGNER_ORDER: &str = "noindel,single,seeded,banded";

// Other Constants
pub const VERBOSITY: u8 = 3;
