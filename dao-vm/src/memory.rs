//! Bit-addressed memory owned by a single floor.
//!
//! Memory is a run of 32-bit words addressed most-significant bit first.
//! Its logical size (`capacity_bits`) is always a power of two and may drop
//! below a word, down to a single bit; the backing store never holds less
//! than one word. Bits at or past the logical size are kept zero.

use bitvec::prelude::*;
use std::fmt;

/// Width of a memory word in bits.
pub const WORD_BITS: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct BitMemory {
    bits: BitVec<u32, Msb0>,
    capacity: usize,
}

fn words_for(capacity: usize) -> usize {
    (capacity / WORD_BITS).max(1)
}

impl BitMemory {
    /// A fresh one-bit memory backed by one zeroed word.
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    pub fn with_capacity(capacity_bits: usize) -> Self {
        assert!(
            capacity_bits.is_power_of_two(),
            "memory capacity must be a power of two, got {capacity_bits}"
        );
        Self {
            bits: BitVec::repeat(false, words_for(capacity_bits) * WORD_BITS),
            capacity: capacity_bits,
        }
    }

    /// Load `bit_len` bits of a packed big-endian buffer. The capacity is
    /// rounded up to the next power of two and never falls below one word.
    pub fn from_packed(bytes: &[u8], bit_len: usize) -> Self {
        let bit_len = bit_len.min(bytes.len() * 8);
        let capacity = bit_len.max(WORD_BITS).next_power_of_two();
        let mut memory = Self::with_capacity(capacity);
        for (i, byte) in bytes.iter().take(bit_len.div_ceil(8)).enumerate() {
            memory.bits[i * 8..i * 8 + 8].store_be::<u8>(*byte);
        }
        memory.bits[bit_len..].fill(false);
        memory
    }

    pub fn capacity_bits(&self) -> usize {
        self.capacity
    }

    pub fn word_count(&self) -> usize {
        self.bits.len() / WORD_BITS
    }

    pub fn words(&self) -> &[u32] {
        self.bits.as_raw_slice()
    }

    fn check_range(&self, offset: usize, len: usize) {
        assert!(
            (1..=WORD_BITS).contains(&len),
            "bit access of {len} bits exceeds the {WORD_BITS}-bit word"
        );
        assert!(
            offset % WORD_BITS + len <= WORD_BITS,
            "bit access [{offset}, +{len}) crosses a word boundary"
        );
        assert!(
            offset + len <= self.capacity,
            "bit access [{offset}, +{len}) past capacity {}",
            self.capacity
        );
    }

    /// Read `len` bits starting at `offset`, most significant first.
    pub fn read(&self, offset: usize, len: usize) -> u32 {
        self.check_range(offset, len);
        self.bits[offset..offset + len].load_be::<u32>()
    }

    /// Store the low `len` bits of `value` at `offset`.
    pub fn write(&mut self, offset: usize, len: usize, value: u32) {
        self.check_range(offset, len);
        let value = if len == WORD_BITS {
            value
        } else {
            value & ((1u32 << len) - 1)
        };
        self.bits[offset..offset + len].store_be::<u32>(value);
    }

    pub fn bit(&self, offset: usize) -> bool {
        self.read(offset, 1) == 1
    }

    /// Four bits at any offset, even one straddling two words.
    pub fn read_nybble(&self, offset: usize) -> u8 {
        assert!(offset + 4 <= self.capacity, "nybble at {offset} past capacity");
        self.bits[offset..offset + 4].load_be::<u8>()
    }

    pub fn write_nybble(&mut self, offset: usize, value: u8) {
        assert!(offset + 4 <= self.capacity, "nybble at {offset} past capacity");
        self.bits[offset..offset + 4].store_be::<u8>(value & 0xF);
    }

    /// Double the capacity; the old content becomes the first half.
    pub fn grow(&mut self) {
        self.capacity *= 2;
        self.bits.resize(words_for(self.capacity) * WORD_BITS, false);
    }

    /// Halve the capacity, keeping only the first half.
    pub fn shrink(&mut self) {
        assert!(self.capacity > 1, "cannot shrink a one-bit memory");
        self.capacity /= 2;
        self.bits.truncate(words_for(self.capacity) * WORD_BITS);
        let capacity = self.capacity;
        self.bits[capacity..].fill(false);
    }

    /// Drop everything and return to a zeroed one-bit memory.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Exchange the two halves of `[offset, offset + len)`.
    pub fn swap_halves(&mut self, offset: usize, len: usize) {
        if len <= 1 {
            return;
        }
        let half = len / 2;
        if len <= WORD_BITS {
            let left = self.read(offset, half);
            let right = self.read(offset + half, half);
            self.write(offset, len, (right << half) | left);
            return;
        }
        let first = offset / WORD_BITS;
        let half_words = half / WORD_BITS;
        let words = self.bits.as_raw_mut_slice();
        for i in 0..half_words {
            words.swap(first + i, first + half_words + i);
        }
    }

    /// Fill `[offset, offset + len)` with ones in the first half and zeros in the second.
    pub fn polarize(&mut self, offset: usize, len: usize) {
        let half = len / 2;
        self.bits[offset..offset + half].fill(true);
        self.bits[offset + half..offset + len].fill(false);
    }

    /// Memory as bits when it fits in a word, as hex words otherwise.
    pub fn to_bit_string(&self) -> String {
        if self.capacity <= WORD_BITS {
            return self.bits[..self.capacity]
                .iter()
                .map(|b| if *b { '1' } else { '0' })
                .collect();
        }
        self.words().iter().map(|w| format!("{w:08x}")).collect()
    }
}

impl Default for BitMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BitMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitMemory[{}]({})", self.capacity, self.to_bit_string())
    }
}
