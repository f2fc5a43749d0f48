//! T55x7 Configuration and Block Packing
//!
//! A rewritable T55x7 tag is programmed one 32-bit block at a time. Block 0
//! holds the configuration word (modulation, data rate, number of data
//! blocks sent); the following blocks hold the raw bitstream the tag
//! transmits. A Pyramid credential needs the configuration word plus four
//! data blocks.
//!
//! ## Configuration Word Layout (fields used here)
//!
//! ```text
//!  bits 20..18   data bit rate (RF/8 .. RF/128)
//!  bits 16..12   modulation
//!  bits  7..5    max block (number of data blocks in the loop)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::{PyramidFrame, FRAME_BITS};

const MODULATION_MASK: u32 = 0x0001_F000;
const BITRATE_SHIFT: u32 = 18;
const BITRATE_MASK: u32 = 0x7 << BITRATE_SHIFT;
const MAXBLOCK_SHIFT: u32 = 5;
const MAXBLOCK_MASK: u32 = 0x7 << MAXBLOCK_SHIFT;

/// Number of data blocks carrying the frame.
pub const DATA_BLOCKS: usize = FRAME_BITS / 32;

/// Total blocks written per credential (configuration + data).
pub const BLOCK_COUNT: usize = DATA_BLOCKS + 1;

/// Modulation field of the configuration word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modulation {
    Direct,
    Psk1,
    Psk2,
    Psk3,
    Fsk1,
    Fsk2,
    Fsk1a,
    Fsk2a,
    Manchester,
    Biphase,
}

impl Modulation {
    const ALL: [Modulation; 10] = [
        Modulation::Direct,
        Modulation::Psk1,
        Modulation::Psk2,
        Modulation::Psk3,
        Modulation::Fsk1,
        Modulation::Fsk2,
        Modulation::Fsk1a,
        Modulation::Fsk2a,
        Modulation::Manchester,
        Modulation::Biphase,
    ];

    /// Field bits as they appear in the configuration word.
    pub fn bits(self) -> u32 {
        match self {
            Modulation::Direct => 0x0000_0000,
            Modulation::Psk1 => 0x0000_1000,
            Modulation::Psk2 => 0x0000_2000,
            Modulation::Psk3 => 0x0000_3000,
            Modulation::Fsk1 => 0x0000_4000,
            Modulation::Fsk2 => 0x0000_5000,
            Modulation::Fsk1a => 0x0000_6000,
            Modulation::Fsk2a => 0x0000_7000,
            Modulation::Manchester => 0x0000_8000,
            Modulation::Biphase => 0x0001_0000,
        }
    }

    fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.bits() == bits)
    }
}

/// Data bit rate, expressed as carrier cycles per bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitRate {
    Rf8,
    Rf16,
    Rf32,
    Rf40,
    Rf50,
    Rf64,
    Rf100,
    Rf128,
}

impl BitRate {
    const ALL: [BitRate; 8] = [
        BitRate::Rf8,
        BitRate::Rf16,
        BitRate::Rf32,
        BitRate::Rf40,
        BitRate::Rf50,
        BitRate::Rf64,
        BitRate::Rf100,
        BitRate::Rf128,
    ];

    /// Carrier cycles per data bit.
    pub fn divisor(self) -> u32 {
        match self {
            BitRate::Rf8 => 8,
            BitRate::Rf16 => 16,
            BitRate::Rf32 => 32,
            BitRate::Rf40 => 40,
            BitRate::Rf50 => 50,
            BitRate::Rf64 => 64,
            BitRate::Rf100 => 100,
            BitRate::Rf128 => 128,
        }
    }

    fn index(self) -> u32 {
        Self::ALL.iter().position(|&r| r == self).unwrap_or(0) as u32
    }
}

/// Decoded T55x7 configuration word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct T55xxConfig {
    pub modulation: Modulation,
    pub bit_rate: BitRate,
    /// Number of data blocks the tag loops over
    pub max_block: u8,
}

impl T55xxConfig {
    /// Pyramid compatibility mode: FSK2a, RF/50, four data blocks.
    pub const PYRAMID: T55xxConfig = T55xxConfig {
        modulation: Modulation::Fsk2a,
        bit_rate: BitRate::Rf50,
        max_block: DATA_BLOCKS as u8,
    };

    /// Encode into a configuration word.
    pub fn to_word(&self) -> u32 {
        self.modulation.bits()
            | (self.bit_rate.index() << BITRATE_SHIFT)
            | (((self.max_block as u32) << MAXBLOCK_SHIFT) & MAXBLOCK_MASK)
    }

    /// Decode the fields of a configuration word.
    ///
    /// Returns `None` for modulation values this crate does not know.
    /// Bits outside the three decoded fields are ignored.
    pub fn from_word(word: u32) -> Option<Self> {
        let modulation = Modulation::from_bits(word & MODULATION_MASK)?;
        let bit_rate = BitRate::ALL[((word & BITRATE_MASK) >> BITRATE_SHIFT) as usize];
        let max_block = ((word & MAXBLOCK_MASK) >> MAXBLOCK_SHIFT) as u8;
        Some(Self {
            modulation,
            bit_rate,
            max_block,
        })
    }
}

/// Configuration word written to block 0 for every Pyramid credential.
pub const PYRAMID_CONFIG_WORD: u32 = 0x0010_7080;

/// The five words programmed onto a tag, indexed by block address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSet {
    words: [u32; BLOCK_COUNT],
}

impl BlockSet {
    /// Pack a frame behind the Pyramid configuration word.
    pub fn from_frame(frame: &PyramidFrame) -> Self {
        Self::with_config(T55xxConfig::PYRAMID.to_word(), frame)
    }

    /// Pack a frame behind an arbitrary configuration word.
    pub fn with_config(config_word: u32, frame: &PyramidFrame) -> Self {
        let mut words = [config_word; BLOCK_COUNT];
        for (i, word) in words.iter_mut().skip(1).enumerate() {
            *word = frame.read_uint(i * 32, 32);
        }
        Self { words }
    }

    /// Configuration word (block 0).
    pub fn config_word(&self) -> u32 {
        self.words[0]
    }

    /// Data words (blocks 1..=4).
    pub fn data_words(&self) -> &[u32] {
        &self.words[1..]
    }

    /// Word destined for `address`.
    pub fn word(&self, address: usize) -> Option<u32> {
        self.words.get(address).copied()
    }

    /// `(address, word)` pairs in write order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(address, &word)| (address as u8, word))
    }

    pub fn as_words(&self) -> &[u32; BLOCK_COUNT] {
        &self.words
    }
}

impl fmt::Display for BlockSet {
    /// Block table as printed before a clone.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Blk | Data ")?;
        writeln!(f, "----+------------")?;
        for (address, word) in self.iter() {
            writeln!(f, " {} | {:08x}", address, word)?;
        }
        Ok(())
    }
}
