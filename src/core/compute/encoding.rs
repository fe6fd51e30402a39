//! # Sequence Encoding
//!
//! Every aligner in this crate works on small integer codes rather than
//! ASCII. Code `0` is reserved for an unknown residue (`N` for DNA, `X` for
//! protein) on both alphabets, which is what lets the residue classifier
//! treat "unknown" uniformly without knowing which alphabet is in use.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  DNA      N=0  A=1  C=2  G=3  T=4                            │
//! │  Protein  X=0  A R N D C Q E G H I L K M F P S T W Y V B Z * │
//! │                =1 ..................................... =23  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only DNA has a complement, so reverse-strand alignment is refused for
//! protein input.

/// Code reserved for an unknown residue.
pub const UNKNOWN_CODE: u8 = 0;

/// Number of distinct known DNA codes (A, C, G, T).
pub const DNA_SYMBOLS: u8 = 4;

const PROTEIN_RESIDUES: &[u8; 23] = b"ARNDCQEGHILKMFPSTWYVBZ*";

/// Residue alphabet of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    /// Nucleotides, `N=0, A=1, C=2, G=3, T=4`.
    #[default]
    Dna,
    /// Amino acids, `X=0` then the 23 residues of `ARNDCQEGHILKMFPSTWYVBZ*`.
    Protein,
}

impl Alphabet {
    /// Encode a single ASCII residue.
    #[inline]
    pub fn encode_base(&self, base: u8) -> u8 {
        match self {
            Alphabet::Dna => dna_base_to_code(base),
            Alphabet::Protein => protein_residue_to_code(base),
        }
    }

    /// Encode an ASCII sequence.
    pub fn encode_sequence(&self, seq: &[u8]) -> Vec<u8> {
        seq.iter().map(|&b| self.encode_base(b)).collect()
    }

    /// Decode a code back to its upper-case ASCII residue.
    #[inline]
    pub fn decode_base(&self, code: u8) -> char {
        match self {
            Alphabet::Dna => dna_code_to_char(code),
            Alphabet::Protein => match code {
                1..=23 => PROTEIN_RESIDUES[code as usize - 1] as char,
                _ => 'X',
            },
        }
    }

    /// Whether the alphabet has a complement (and therefore a reverse strand).
    pub fn has_complement(&self) -> bool {
        matches!(self, Alphabet::Dna)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Alphabet::Dna => "DNA",
            Alphabet::Protein => "protein",
        }
    }
}

// ============================================================================
// DNA HELPERS
// ============================================================================

/// Convert an ASCII base to its code.
///
/// - A/a → 1
/// - C/c → 2
/// - G/g → 3
/// - T/t → 4
/// - N/n/other → 0
#[inline]
pub fn dna_base_to_code(base: u8) -> u8 {
    match base {
        b'A' | b'a' => 1,
        b'C' | b'c' => 2,
        b'G' | b'g' => 3,
        b'T' | b't' => 4,
        _ => UNKNOWN_CODE,
    }
}

/// Convert a DNA code to its ASCII character.
#[inline(always)]
pub const fn dna_code_to_char(code: u8) -> char {
    match code {
        1 => 'A',
        2 => 'C',
        3 => 'G',
        4 => 'T',
        _ => 'N',
    }
}

/// Complement of a DNA code (A↔T, C↔G, N→N).
#[inline(always)]
pub const fn complement_code(code: u8) -> u8 {
    match code {
        1 => 4,
        2 => 3,
        3 => 2,
        4 => 1,
        _ => UNKNOWN_CODE,
    }
}

/// Encode an ASCII DNA string.
pub fn encode_dna(seq: &[u8]) -> Vec<u8> {
    Alphabet::Dna.encode_sequence(seq)
}

/// Decode DNA codes to an ASCII string.
pub fn decode_dna(codes: &[u8]) -> String {
    codes.iter().map(|&c| dna_code_to_char(c)).collect()
}

/// Reverse complement of an encoded DNA sequence.
pub fn reverse_complement(encoded: &[u8]) -> Vec<u8> {
    encoded.iter().rev().map(|&c| complement_code(c)).collect()
}

/// Reverse complement into a reusable buffer (keeps capacity).
pub fn reverse_complement_into(encoded: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend(encoded.iter().rev().map(|&c| complement_code(c)));
}

// ============================================================================
// PROTEIN HELPERS
// ============================================================================

#[inline]
fn protein_residue_to_code(residue: u8) -> u8 {
    let upper = residue.to_ascii_uppercase();
    PROTEIN_RESIDUES
        .iter()
        .position(|&r| r == upper)
        .map_or(UNKNOWN_CODE, |p| p as u8 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dna_base_encoding() {
        assert_eq!(dna_base_to_code(b'A'), 1);
        assert_eq!(dna_base_to_code(b'C'), 2);
        assert_eq!(dna_base_to_code(b'G'), 3);
        assert_eq!(dna_base_to_code(b'T'), 4);
        assert_eq!(dna_base_to_code(b'N'), 0);
        assert_eq!(dna_base_to_code(b'g'), 3); // lowercase
        assert_eq!(dna_base_to_code(b'-'), 0);
    }

    #[test]
    fn test_complement() {
        assert_eq!(complement_code(1), 4);
        assert_eq!(complement_code(2), 3);
        assert_eq!(complement_code(3), 2);
        assert_eq!(complement_code(4), 1);
        assert_eq!(complement_code(0), 0);
    }

    #[test]
    fn test_reverse_complement() {
        let encoded = encode_dna(b"AACGTN");
        let rc = reverse_complement(&encoded);
        assert_eq!(decode_dna(&rc), "NACGTT");

        let mut buf = vec![9u8; 32];
        reverse_complement_into(&encoded, &mut buf);
        assert_eq!(buf, rc);
        assert_eq!(reverse_complement(&rc), encoded);
    }

    #[test]
    fn test_protein_round_trip() {
        let codes = Alphabet::Protein.encode_sequence(b"MKVx*");
        assert_eq!(codes[0], 13);
        assert_eq!(codes[3], UNKNOWN_CODE);
        assert_eq!(codes[4], 23);
        let text: String = codes.iter().map(|&c| Alphabet::Protein.decode_base(c)).collect();
        assert_eq!(text, "MKVX*");
        assert!(!Alphabet::Protein.has_complement());
    }
}
