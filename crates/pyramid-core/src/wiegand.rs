//! Wiegand-26 Field
//!
//! The 26-bit field embedded in a Pyramid frame is laid out as:
//!
//! ```text
//! bit  0        8                        24  25
//!      ├────────┼────────────────────────┼───┼───┐
//!      │ FC (8) │   Card Number (16)     │ E │ O │
//!      └────────┴────────────────────────┴───┴───┘
//! ```
//!
//! `E` is even parity over the first 12 data bits and `O` is odd parity
//! over the last 12 data bits, as in the conventional 26-bit access-control
//! encoding. Both parity bits trail the data.

use crate::bits::BitBuffer;
use crate::credential::Credential;
use crate::parity::ParityType;

/// Total field width.
pub const WIEGAND26_BITS: usize = 26;

/// Number of identity bits (facility code + card number).
pub const WIEGAND26_DATA_BITS: usize = 24;

const HALF: usize = WIEGAND26_DATA_BITS / 2;

/// An encoded 26-bit Wiegand field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiegand26 {
    bits: BitBuffer<WIEGAND26_BITS>,
}

impl Wiegand26 {
    /// Encode a credential.
    pub fn encode(credential: &Credential) -> Self {
        let mut bits = BitBuffer::new();
        bits.write_uint(0, credential.facility_code as u32, 8);
        bits.write_uint(8, credential.card_number as u32, 16);

        let even = ParityType::Even.parity_bit(bits.slice(0, HALF));
        let odd = ParityType::Odd.parity_bit(bits.slice(HALF, HALF));
        bits.set_bit(WIEGAND26_DATA_BITS, even == 1);
        bits.set_bit(WIEGAND26_DATA_BITS + 1, odd == 1);

        Self { bits }
    }

    /// All 26 bits, data first, parity last.
    pub fn as_bits(&self) -> &[u8] {
        self.bits.as_bits()
    }

    /// Even parity bit over the leading half of the data.
    pub fn even_parity(&self) -> u8 {
        self.bits.bit(WIEGAND26_DATA_BITS)
    }

    /// Odd parity bit over the trailing half of the data.
    pub fn odd_parity(&self) -> u8 {
        self.bits.bit(WIEGAND26_DATA_BITS + 1)
    }

    /// True if both parity bits agree with the data bits.
    pub fn parity_ok(&self) -> bool {
        let first = [self.bits.slice(0, HALF), &[self.even_parity()][..]].concat();
        let second = [self.bits.slice(HALF, HALF), &[self.odd_parity()][..]].concat();
        ParityType::Even.holds(&first) && ParityType::Odd.holds(&second)
    }
}
