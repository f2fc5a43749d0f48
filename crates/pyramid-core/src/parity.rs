//! Group Parity
//!
//! Interleaves a parity bit after every fixed-size group of bits. The
//! Pyramid frame uses 8-bit groups with odd parity, so every 9-bit group of
//! the encoded payload carries an odd number of set bits.
//!
//! ## Example
//!
//! ```rust
//! use pyramid_core::parity::{add_parity, ParityType};
//!
//! let encoded = add_parity(&[1, 0, 1, 0, 0, 0, 0, 0], 8, ParityType::Odd);
//! assert_eq!(encoded, vec![1, 0, 1, 0, 0, 0, 0, 0, 1]);
//! ```

use crate::bits::count_ones;

/// Parity convention for a group of bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityType {
    /// Group plus parity bit holds an even number of ones
    Even,
    /// Group plus parity bit holds an odd number of ones
    Odd,
}

impl ParityType {
    /// Parity bit to append to `bits` under this convention.
    pub fn parity_bit(self, bits: &[u8]) -> u8 {
        let odd_ones = (count_ones(bits) % 2) as u8;
        match self {
            ParityType::Even => odd_ones,
            ParityType::Odd => odd_ones ^ 1,
        }
    }

    /// True if `bits` (parity bit included) satisfy this convention.
    pub fn holds(self, bits: &[u8]) -> bool {
        let odd_ones = count_ones(bits) % 2 == 1;
        match self {
            ParityType::Even => !odd_ones,
            ParityType::Odd => odd_ones,
        }
    }
}

/// Append one parity bit after every `group_len` source bits.
///
/// A trailing partial group is emitted as-is followed by its own parity
/// bit, so the output length is `len + ceil(len / group_len)`.
pub fn add_parity(source: &[u8], group_len: usize, kind: ParityType) -> Vec<u8> {
    assert!(group_len > 0, "group_len must be > 0");
    let groups = (source.len() + group_len - 1) / group_len;
    let mut out = Vec::with_capacity(source.len() + groups);
    for group in source.chunks(group_len) {
        out.extend(group.iter().map(|&bit| bit & 1));
        out.push(kind.parity_bit(group));
    }
    out
}

/// Check that every complete `group_len + 1` group of `encoded` satisfies
/// `kind`. Bits after the last complete group are ignored.
pub fn check_parity(encoded: &[u8], group_len: usize, kind: ParityType) -> bool {
    assert!(group_len > 0, "group_len must be > 0");
    encoded
        .chunks_exact(group_len + 1)
        .all(|group| kind.holds(group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_bit() {
        assert_eq!(ParityType::Odd.parity_bit(&[0, 0, 0]), 1);
        assert_eq!(ParityType::Odd.parity_bit(&[1, 0, 0]), 0);
        assert_eq!(ParityType::Even.parity_bit(&[1, 1, 0]), 0);
        assert_eq!(ParityType::Even.parity_bit(&[1, 1, 1]), 1);
    }

    #[test]
    fn test_add_parity_all_zero() {
        let encoded = add_parity(&[0; 16], 8, ParityType::Odd);
        assert_eq!(encoded.len(), 18);
        assert_eq!(encoded[8], 1);
        assert_eq!(encoded[17], 1);
        assert!(check_parity(&encoded, 8, ParityType::Odd));
    }

    #[test]
    fn test_add_parity_112_bits() {
        let source: Vec<u8> = (0..112).map(|i| ((i * 7 + 3) % 5 == 0) as u8).collect();
        let encoded = add_parity(&source, 8, ParityType::Odd);
        assert_eq!(encoded.len(), 126);
        assert!(check_parity(&encoded, 8, ParityType::Odd));
        // Source bits survive untouched between the parity bits.
        for (g, group) in encoded.chunks(9).enumerate() {
            assert_eq!(&group[..8], &source[g * 8..g * 8 + 8]);
        }
    }

    #[test]
    fn test_add_parity_partial_group() {
        let encoded = add_parity(&[1, 1, 0, 1, 1], 4, ParityType::Even);
        assert_eq!(encoded, vec![1, 1, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_check_parity_detects_flip() {
        let mut encoded = add_parity(&[1, 0, 1, 1, 0, 0, 1, 0], 8, ParityType::Odd);
        assert!(check_parity(&encoded, 8, ParityType::Odd));
        encoded[3] ^= 1;
        assert!(!check_parity(&encoded, 8, ParityType::Odd));
    }
}
