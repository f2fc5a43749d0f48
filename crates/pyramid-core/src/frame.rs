//! Farpointe/Pyramid Frame Assembly
//!
//! A Pyramid frame is 128 bits, split into fixed zones:
//!
//! ```text
//! bit 0      8                                              120      128
//!     ├──────┼──────────────────────────────────────────────┼────────┤
//!     │ 0x00 │ payload: odd parity after every 8 bits       │ CRC-8  │
//!     └──────┴──────────────────────────────────────────────┴────────┘
//! ```
//!
//! Assembly runs in three steps:
//!
//! 1. The 26-bit Wiegand field is placed at bit 71 of an all-zero buffer.
//! 2. Bits 8..120 of that buffer are parity encoded (8 data + 1 odd parity)
//!    and written back from bit 8. Encoding 112 bits yields 126, and only
//!    the first 112 fit in the payload zone; the rest is cut off and the
//!    checksum zone is written over it.
//! 3. CRC-8/MAXIM over the 13 bytes starting at bit 16 lands in bits 120..128.
//!
//! ## Example
//!
//! ```rust
//! use pyramid_core::credential::Credential;
//! use pyramid_core::frame::PyramidFrame;
//!
//! let frame = PyramidFrame::encode(&Credential::new(123, 11223)).unwrap();
//! assert_eq!(frame.to_string(), "00008040201008040201f6ababe01005");
//! assert!(frame.checksum_ok());
//! ```

use std::fmt;

use crate::bits::BitBuffer;
use crate::crc::{Crc8Maxim, CrcComputer};
use crate::credential::Credential;
use crate::error::PyramidResult;
use crate::parity::{add_parity, check_parity, ParityType};
use crate::wiegand::Wiegand26;

/// Total frame length in bits.
pub const FRAME_BITS: usize = 128;

pub const HEADER_OFFSET: usize = 0;
pub const HEADER_BITS: usize = 8;

pub const PAYLOAD_OFFSET: usize = 8;
pub const PAYLOAD_BITS: usize = 112;

pub const CHECKSUM_OFFSET: usize = 120;
pub const CHECKSUM_BITS: usize = 8;

/// Where the Wiegand field sits before parity encoding.
pub const WIEGAND_OFFSET: usize = 71;

/// Data bits per parity group in the payload.
pub const PARITY_GROUP_BITS: usize = 8;

/// First bit of the checksummed window.
pub const CRC_WINDOW_OFFSET: usize = 16;

/// Length of the checksummed window in bytes.
pub const CRC_WINDOW_BYTES: usize = 13;

/// A finished, immutable 128-bit Pyramid frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PyramidFrame {
    bits: BitBuffer<FRAME_BITS>,
}

impl PyramidFrame {
    /// Encode a credential into a frame.
    ///
    /// Every normalized credential encodes successfully today; the result
    /// type is kept so stricter input checks can reject values later without
    /// changing callers.
    pub fn encode(credential: &Credential) -> PyramidResult<Self> {
        let wiegand = Wiegand26::encode(credential);

        let mut staging = BitBuffer::<FRAME_BITS>::new();
        staging.write_bits(WIEGAND_OFFSET, wiegand.as_bits());

        let encoded = add_parity(
            staging.slice(PAYLOAD_OFFSET, PAYLOAD_BITS),
            PARITY_GROUP_BITS,
            ParityType::Odd,
        );

        let mut bits = BitBuffer::<FRAME_BITS>::new();
        bits.write_bits(PAYLOAD_OFFSET, &encoded[..PAYLOAD_BITS]);

        let mut frame = Self { bits };
        let checksum = frame.compute_checksum();
        frame
            .bits
            .write_uint(CHECKSUM_OFFSET, checksum as u32, CHECKSUM_BITS);

        tracing::trace!(%credential, frame = %frame, "encoded pyramid frame");
        Ok(frame)
    }

    /// All 128 bits, unpacked.
    pub fn as_bits(&self) -> &[u8] {
        self.bits.as_bits()
    }

    /// Header zone (bits 0..8), always zero.
    pub fn header(&self) -> &[u8] {
        self.bits.slice(HEADER_OFFSET, HEADER_BITS)
    }

    /// Payload zone (bits 8..120), parity encoded.
    pub fn payload(&self) -> &[u8] {
        self.bits.slice(PAYLOAD_OFFSET, PAYLOAD_BITS)
    }

    /// Checksum zone (bits 120..128).
    pub fn checksum(&self) -> u8 {
        self.bits.read_uint(CHECKSUM_OFFSET, CHECKSUM_BITS) as u8
    }

    /// Read `width` (at most 32) bits at `offset`, MSB first.
    pub fn read_uint(&self, offset: usize, width: usize) -> u32 {
        self.bits.read_uint(offset, width)
    }

    /// The 13 bytes covered by the checksum.
    pub fn crc_window(&self) -> [u8; CRC_WINDOW_BYTES] {
        let mut window = [0u8; CRC_WINDOW_BYTES];
        for (i, byte) in window.iter_mut().enumerate() {
            *byte = self.bits.read_uint(CRC_WINDOW_OFFSET + i * 8, 8) as u8;
        }
        window
    }

    /// CRC-8/MAXIM of the checksum window.
    pub fn compute_checksum(&self) -> u8 {
        Crc8Maxim::compute(&self.crc_window())
    }

    /// True if the checksum zone matches the window contents.
    pub fn checksum_ok(&self) -> bool {
        self.checksum() == self.compute_checksum()
    }

    /// True if every complete 9-bit group in the payload has odd parity.
    pub fn payload_parity_ok(&self) -> bool {
        check_parity(self.payload(), PARITY_GROUP_BITS, ParityType::Odd)
    }

    /// The frame as 16 bytes, MSB first.
    pub fn to_bytes(&self) -> [u8; FRAME_BITS / 8] {
        let mut out = [0u8; FRAME_BITS / 8];
        out.copy_from_slice(&self.bits.to_bytes());
        out
    }
}

impl fmt::Display for PyramidFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PyramidFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PyramidFrame({})", self)
    }
}
