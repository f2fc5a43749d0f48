//! Facility-code / card-number credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Facility codes occupy 8 bits in the Pyramid format.
pub const FACILITY_CODE_BITS: u32 = 8;

/// Card numbers occupy 16 bits in the Pyramid format.
pub const CARD_NUMBER_BITS: u32 = 16;

/// An access-control credential as carried by a Farpointe/Pyramid tag.
///
/// The field types encode the format's domains directly, so a `Credential`
/// can never hold an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    /// 8-bit facility code
    pub facility_code: u8,
    /// 16-bit card number
    pub card_number: u16,
}

impl Credential {
    pub fn new(facility_code: u8, card_number: u16) -> Self {
        Self {
            facility_code,
            card_number,
        }
    }

    /// Build a credential from raw user input.
    ///
    /// Values wider than the format allows are truncated to their low bits
    /// (`300` becomes facility code `44`). This is the documented behavior
    /// of the Pyramid format, not an error.
    pub fn normalize(facility_code: u32, card_number: u32) -> Self {
        Self {
            facility_code: (facility_code & 0xFF) as u8,
            card_number: (card_number & 0xFFFF) as u16,
        }
    }

    /// True if normalizing `(facility_code, card_number)` would drop bits.
    pub fn is_truncated(facility_code: u32, card_number: u32) -> bool {
        facility_code >> FACILITY_CODE_BITS != 0 || card_number >> CARD_NUMBER_BITS != 0
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Facility Code: {}, Card Number: {}",
            self.facility_code, self.card_number
        )
    }
}
