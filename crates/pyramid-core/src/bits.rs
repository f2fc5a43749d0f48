//! Fixed-Width Bit Buffers
//!
//! Bits are held unpacked, one bit per byte (only bit 0 is significant), in
//! transmission order. Multi-bit integers are always written and read
//! most-significant-bit first, which is the order every field of the
//! Pyramid frame and every T55x7 block uses.
//!
//! ## Example
//!
//! ```rust
//! use pyramid_core::bits::BitBuffer;
//!
//! let mut buf = BitBuffer::<16>::new();
//! buf.write_uint(4, 0b1011, 4);
//! assert_eq!(buf.read_uint(0, 8), 0b0000_1011);
//! assert_eq!(buf.read_uint(4, 4), 0b1011);
//! ```

use std::fmt;

/// Expand the low `width` bits of `value` into unpacked bits, MSB first.
pub fn uint_to_bits(value: u32, width: usize) -> Vec<u8> {
    assert!(width <= 32, "width must be 0..=32");
    (0..width)
        .map(|i| ((value >> (width - 1 - i)) & 1) as u8)
        .collect()
}

/// Collapse up to 32 unpacked bits (MSB first) into an integer.
pub fn bits_to_uint(bits: &[u8]) -> u32 {
    assert!(bits.len() <= 32, "at most 32 bits fit in a u32");
    bits.iter().fold(0u32, |acc, &bit| (acc << 1) | (bit & 1) as u32)
}

/// Number of set bits in an unpacked bit slice.
pub fn count_ones(bits: &[u8]) -> usize {
    bits.iter().filter(|&&bit| bit & 1 == 1).count()
}

/// A fixed-length sequence of `N` bits.
///
/// All accessors take bit offsets from the start of the buffer. Writing or
/// reading past the end is a programming error and panics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitBuffer<const N: usize> {
    bits: [u8; N],
}

impl<const N: usize> BitBuffer<N> {
    /// Create an all-zero buffer.
    pub fn new() -> Self {
        Self { bits: [0; N] }
    }

    /// Create a buffer from unpacked bits. Only bit 0 of each byte is kept.
    pub fn from_bits(bits: [u8; N]) -> Self {
        let mut buf = Self::new();
        buf.write_bits(0, &bits);
        buf
    }

    /// Number of bits in the buffer.
    pub const fn len(&self) -> usize {
        N
    }

    /// True when the buffer holds no bits.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Bit at `index` (0 or 1).
    pub fn bit(&self, index: usize) -> u8 {
        self.bits[index]
    }

    /// Set the bit at `index`.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        self.bits[index] = value as u8;
    }

    /// All bits as an unpacked slice.
    pub fn as_bits(&self) -> &[u8] {
        &self.bits
    }

    /// Bits in `offset..offset + len`.
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.bits[offset..offset + len]
    }

    /// Copy unpacked bits into the buffer starting at `offset`.
    pub fn write_bits(&mut self, offset: usize, src: &[u8]) {
        let dst = &mut self.bits[offset..offset + src.len()];
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = s & 1;
        }
    }

    /// Write the low `width` bits of `value` at `offset`, MSB first.
    pub fn write_uint(&mut self, offset: usize, value: u32, width: usize) {
        self.write_bits(offset, &uint_to_bits(value, width));
    }

    /// Read `width` bits at `offset` as an unsigned integer, MSB first.
    pub fn read_uint(&self, offset: usize, width: usize) -> u32 {
        bits_to_uint(self.slice(offset, width))
    }

    /// Number of set bits in the whole buffer.
    pub fn count_ones(&self) -> usize {
        count_ones(&self.bits)
    }

    /// Pack the buffer into bytes, MSB first. A trailing partial byte is
    /// zero-padded on the right.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                let value = bits_to_uint(chunk) as u8;
                value << (8 - chunk.len())
            })
            .collect()
    }
}

impl<const N: usize> Default for BitBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Display for BitBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for BitBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer<{}>({})", N, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_to_bits_msb_first() {
        assert_eq!(uint_to_bits(0b1101, 4), vec![1, 1, 0, 1]);
        assert_eq!(uint_to_bits(1, 8), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        // Bits above the width are ignored.
        assert_eq!(uint_to_bits(0x1FF, 8), vec![1; 8]);
        assert!(uint_to_bits(5, 0).is_empty());
    }

    #[test]
    fn test_bits_to_uint() {
        assert_eq!(bits_to_uint(&[1, 0, 1, 0]), 0b1010);
        assert_eq!(bits_to_uint(&[]), 0);
        assert_eq!(bits_to_uint(&[1; 32]), u32::MAX);
    }

    #[test]
    fn test_write_read_uint() {
        let mut buf = BitBuffer::<64>::new();
        buf.write_uint(3, 0xDEAD, 16);
        assert_eq!(buf.read_uint(3, 16), 0xDEAD);
        assert_eq!(buf.read_uint(0, 3), 0);
        assert_eq!(buf.read_uint(19, 32), 0);
    }

    #[test]
    fn test_from_bits_masks_high_bits() {
        let buf = BitBuffer::<4>::from_bits([0xFE, 0xFF, 2, 3]);
        assert_eq!(buf.as_bits(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_to_bytes() {
        let mut buf = BitBuffer::<12>::new();
        buf.write_uint(0, 0xABC, 12);
        assert_eq!(buf.to_bytes(), vec![0xAB, 0xC0]);
    }

    #[test]
    fn test_display() {
        let mut buf = BitBuffer::<5>::new();
        buf.set_bit(0, true);
        buf.set_bit(4, true);
        assert_eq!(buf.to_string(), "10001");
        assert_eq!(buf.count_ones(), 2);
    }

    #[test]
    #[should_panic]
    fn test_write_past_end_panics() {
        let mut buf = BitBuffer::<8>::new();
        buf.write_uint(4, 0xFF, 8);
    }
}
