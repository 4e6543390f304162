// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A fixed-size bitset over one byte of opcode space.

/// Number of opcodes addressable by one opcode byte.
pub const OPCODE_SPACE: usize = 256;

const WORDS: usize = OPCODE_SPACE / 64;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct OpcodeSet {
    bits: [u64; WORDS],
}

impl OpcodeSet {
    #[must_use]
    pub(crate) fn new_empty() -> Self {
        Self { bits: [0; WORDS] }
    }

    #[must_use]
    pub(crate) fn contains(&self, opcode: u8) -> bool {
        let idx = usize::from(opcode);
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Marks `opcode` as used. Returns `false` if it already was.
    pub(crate) fn insert(&mut self, opcode: u8) -> bool {
        let idx = usize::from(opcode);
        let mask = 1_u64 << (idx % 64);
        let word = &mut self.bits[idx / 64];
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Lowest opcode not in the set.
    #[must_use]
    pub(crate) fn min_free(&self) -> Option<u8> {
        for (w, word) in self.bits.iter().enumerate() {
            let free = !*word;
            if free != 0 {
                return u8::try_from(w * 64 + free.trailing_zeros() as usize).ok();
            }
        }
        None
    }

    /// Highest opcode not in the set.
    #[must_use]
    pub(crate) fn max_free(&self) -> Option<u8> {
        for (w, word) in self.bits.iter().enumerate().rev() {
            let free = !*word;
            if free != 0 {
                return u8::try_from(w * 64 + 63 - free.leading_zeros() as usize).ok();
            }
        }
        None
    }
}
