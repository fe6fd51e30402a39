//! Residue encodings shared by every kernel.

pub mod encoding;
