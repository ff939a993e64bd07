use crate::error::{Result, StateError};
use serde::{Deserialize, Serialize};

/// Number of addressable bits in a mask.
pub const MASK_BITS: u32 = 32;

/// Bitset naming the fields present in a payload. Bit `i` set means the
/// value of field `i` follows, in ascending bit order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mask(u32);

impl Mask {
    pub const EMPTY: Mask = Mask(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn set(&mut self, offset: u32) -> Result<()> {
        if offset >= MASK_BITS {
            return Err(StateError::MaskOffsetExceed { offset });
        }
        self.0 |= 1 << offset;
        Ok(())
    }

    pub fn contains(&self, offset: u32) -> bool {
        offset < MASK_BITS && self.0 & (1 << offset) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Set bit offsets, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        let bits = self.0;
        (0..MASK_BITS).filter(move |offset| bits & (1 << offset) != 0)
    }
}

impl From<u32> for Mask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}
