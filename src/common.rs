//!
//! Common sequence and alphabet definitions
//!

/// Type of DNA sequence
pub type Sequence = Vec<u8>;

/// Convert Sequence(Vec<u8>) into &str
/// useful in displaying
pub fn sequence_to_string(seq: &[u8]) -> &str {
    std::str::from_utf8(seq).unwrap()
}

///
/// gap marker in a training alignment
///
/// Only appears in alignments and queries. A finalized model never emits it.
///
pub const GAP: u8 = b'-';

///
/// Array of valid DNA bases
///
pub const VALID_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

///
/// Check if the base is one of `ACGT`
///
pub fn is_valid_base(base: u8) -> bool {
    VALID_BASES.contains(&base)
}

///
/// Remove all gap markers from the sequence.
///
pub fn strip_gaps(seq: &[u8]) -> Sequence {
    seq.iter().copied().filter(|&b| b != GAP).collect()
}

//
// tests
//
