//! Simulated T55x7 Tag
//!
//! Eight 32-bit blocks of page 0. Block 0 is the configuration word; the
//! tag transmits blocks `1..=max_block` in a loop.

use pyramid_core::t55xx::{BitRate, Modulation, T55xxConfig, PYRAMID_CONFIG_WORD};

/// Blocks in page 0 of a T55x7.
pub const TAG_BLOCKS: usize = 8;

/// A writable T55x7 tag, blank (all zero) when created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct T55xxTag {
    blocks: [u32; TAG_BLOCKS],
    writes: usize,
}

impl T55xxTag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program one block.
    pub fn write_block(&mut self, address: u32, data: u32) -> Result<(), String> {
        let slot = usize::try_from(address)
            .ok()
            .and_then(|a| self.blocks.get_mut(a))
            .ok_or_else(|| format!("block {} out of range (0..{})", address, TAG_BLOCKS))?;
        *slot = data;
        self.writes += 1;
        Ok(())
    }

    pub fn block(&self, address: usize) -> Option<u32> {
        self.blocks.get(address).copied()
    }

    pub fn blocks(&self) -> &[u32; TAG_BLOCKS] {
        &self.blocks
    }

    /// Number of successful block writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Decoded block 0, if its modulation is known.
    pub fn config(&self) -> Option<T55xxConfig> {
        T55xxConfig::from_word(self.blocks[0])
    }

    pub fn modulation(&self) -> Option<Modulation> {
        self.config().map(|c| c.modulation)
    }

    pub fn bit_rate(&self) -> Option<BitRate> {
        self.config().map(|c| c.bit_rate)
    }

    pub fn max_block(&self) -> Option<u8> {
        self.config().map(|c| c.max_block)
    }

    /// True when block 0 selects Pyramid compatibility mode.
    pub fn is_pyramid(&self) -> bool {
        self.blocks[0] == PYRAMID_CONFIG_WORD
    }

    /// The blocks the tag currently transmits.
    pub fn transmitted_words(&self) -> &[u32] {
        let last = self
            .max_block()
            .map_or(0, |m| (m as usize).min(TAG_BLOCKS - 1));
        &self.blocks[1..=last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tag() {
        let tag = T55xxTag::new();
        assert_eq!(tag.blocks(), &[0; TAG_BLOCKS]);
        assert!(!tag.is_pyramid());
        // An all-zero config word is direct modulation, RF/8, nothing sent.
        assert_eq!(tag.modulation(), Some(Modulation::Direct));
        assert!(tag.transmitted_words().is_empty());
    }

    #[test]
    fn test_write_and_decode_config() {
        let mut tag = T55xxTag::new();
        tag.write_block(0, PYRAMID_CONFIG_WORD).unwrap();
        assert!(tag.is_pyramid());
        assert_eq!(tag.modulation(), Some(Modulation::Fsk2a));
        assert_eq!(tag.bit_rate(), Some(BitRate::Rf50));
        assert_eq!(tag.max_block(), Some(4));
        assert_eq!(tag.transmitted_words().len(), 4);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut tag = T55xxTag::new();
        assert!(tag.write_block(8, 1).is_err());
        assert!(tag.write_block(u32::MAX, 1).is_err());
        assert_eq!(tag.write_count(), 0);
        tag.write_block(7, 0xdead_beef).unwrap();
        assert_eq!(tag.block(7), Some(0xdead_beef));
        assert_eq!(tag.write_count(), 1);
    }
}
