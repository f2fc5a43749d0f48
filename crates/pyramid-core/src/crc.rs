//! CRC Engine
//!
//! Table-driven CRC computation behind a small trait so the frame code does
//! not care which variant it runs.
//!
//! ## Supported Standards
//!
//! - CRC-8/MAXIM (Dallas 1-Wire): polynomial 0x31 (x^8 + x^5 + x^4 + 1),
//!   reflected input and output, init 0x00, no final XOR
//!
//! ## Example
//!
//! ```rust
//! use pyramid_core::crc::{Crc8Maxim, CrcComputer};
//!
//! let mut crc = Crc8Maxim::new();
//! crc.update(b"123456789");
//! assert_eq!(crc.finalize(), 0xA1);
//! ```

/// Trait for CRC computation.
pub trait CrcComputer {
    /// The output type of the CRC (u8, u16, u32, etc.)
    type Output: Copy + PartialEq + std::fmt::LowerHex;

    /// Update the CRC with additional data.
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the CRC value.
    fn finalize(&self) -> Self::Output;

    /// Reset the CRC to its initial state.
    fn reset(&mut self);

    /// Compute CRC of an entire buffer in one call.
    fn compute(data: &[u8]) -> Self::Output
    where
        Self: Sized + Default,
    {
        let mut crc = Self::default();
        crc.update(data);
        crc.finalize()
    }

    /// Verify that data matches an expected CRC.
    fn verify(&mut self, data: &[u8], expected: Self::Output) -> bool
    where
        Self: Sized,
    {
        self.reset();
        self.update(data);
        self.finalize() == expected
    }
}

// ============================================================================
// CRC-8/MAXIM
// ============================================================================

/// Polynomial 0x31 with its bit order reversed, for LSB-first shifting.
const MAXIM_POLY_REFLECTED: u8 = 0x8C;

/// CRC-8/MAXIM, the Dallas/Maxim 1-Wire checksum.
#[derive(Clone)]
pub struct Crc8Maxim {
    table: [u8; 256],
    value: u8,
}

impl Crc8Maxim {
    /// Create a new CRC-8/MAXIM.
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        for i in 0..256u16 {
            let mut crc = i as u8;
            for _ in 0..8 {
                if crc & 0x01 != 0 {
                    crc = (crc >> 1) ^ MAXIM_POLY_REFLECTED;
                } else {
                    crc >>= 1;
                }
            }
            table[i as usize] = crc;
        }
        Self { table, value: 0x00 }
    }
}

impl Default for Crc8Maxim {
    fn default() -> Self {
        Self::new()
    }
}

impl CrcComputer for Crc8Maxim {
    type Output = u8;

    fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.value = self.table[(self.value ^ byte) as usize];
        }
    }

    fn finalize(&self) -> u8 {
        self.value
    }

    fn reset(&mut self) {
        self.value = 0x00;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-at-a-time reference used to cross-check the table.
    fn maxim_bitwise(data: &[u8]) -> u8 {
        let mut crc = 0u8;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0x8C } else { crc >> 1 };
            }
        }
        crc
    }

    #[test]
    fn test_crc8_maxim_check_value() {
        // Catalogue check value for "123456789"
        let checksum = Crc8Maxim::compute(b"123456789");
        assert_eq!(
            checksum, 0xA1,
            "CRC-8/MAXIM of '123456789' should be 0xA1, got 0x{:02X}",
            checksum
        );
    }

    #[test]
    fn test_crc8_maxim_empty() {
        assert_eq!(Crc8Maxim::compute(b""), 0x00);
    }

    #[test]
    fn test_crc8_maxim_matches_bitwise() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(Crc8Maxim::compute(&data), maxim_bitwise(&data));
        assert_eq!(Crc8Maxim::compute(&[0x80, 0x40, 0x20]), maxim_bitwise(&[0x80, 0x40, 0x20]));
    }

    #[test]
    fn test_crc8_maxim_incremental() {
        let mut crc = Crc8Maxim::new();
        crc.update(b"12345");
        crc.update(b"6789");
        assert_eq!(crc.finalize(), 0xA1);
    }

    #[test]
    fn test_verify_and_reset() {
        let mut crc = Crc8Maxim::new();
        crc.update(b"garbage");
        assert!(crc.verify(b"123456789", 0xA1));
        assert!(!crc.verify(b"123456788", 0xA1));
    }
}
