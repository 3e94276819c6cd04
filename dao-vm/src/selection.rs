//! Buddy-style selection window over a floor's memory.

use serde::{Deserialize, Serialize};

/// A bit window `[index, index + len)`. `len` is a power of two and the
/// window never reaches past the owning memory's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub len: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl Selection {
    pub const fn new(index: usize, len: usize) -> Self {
        Self { index, len }
    }

    /// The whole of a memory holding `capacity` bits.
    pub const fn whole(capacity: usize) -> Self {
        Self::new(0, capacity)
    }

    /// True when the window starts on an even multiple of twice its length.
    pub fn aligned(&self) -> bool {
        self.index % (self.len * 2) == 0
    }

    /// Merge with the buddy window. `None` once the window already spans `capacity`.
    pub fn merged(self, capacity: usize) -> Option<Self> {
        if self.len >= capacity {
            return None;
        }
        let index = if self.aligned() {
            self.index
        } else {
            self.index - self.len
        };
        Some(Self::new(index, self.len * 2))
    }

    /// Keep the left half. `None` for a one-bit window.
    pub fn halved(self) -> Option<Self> {
        (self.len > 1).then(|| Self::new(self.index, self.len / 2))
    }

    /// Step to the next window of the same length, wrapping at `capacity`.
    pub fn advanced(self, capacity: usize) -> Self {
        Self::new((self.index + self.len) % capacity, self.len)
    }

    pub fn fits(&self, capacity: usize) -> bool {
        self.len.is_power_of_two() && self.index + self.len <= capacity
    }

    pub fn first_bit(&self) -> usize {
        self.index
    }

    pub fn last_bit(&self) -> usize {
        self.index + self.len - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        assert!(Selection::new(0, 4).aligned());
        assert!(!Selection::new(4, 4).aligned());
        assert!(Selection::new(8, 4).aligned());
        assert!(!Selection::new(1, 1).aligned());
    }

    #[test]
    fn test_merge_moves_unaligned_window_left() {
        assert_eq!(Selection::new(4, 4).merged(32), Some(Selection::new(0, 8)));
        assert_eq!(Selection::new(8, 4).merged(32), Some(Selection::new(8, 8)));
        assert_eq!(Selection::whole(32).merged(32), None);
    }

    #[test]
    fn test_halve_and_advance() {
        assert_eq!(Selection::new(8, 8).halved(), Some(Selection::new(8, 4)));
        assert_eq!(Selection::new(3, 1).halved(), None);
        assert_eq!(Selection::new(24, 8).advanced(32), Selection::new(0, 8));
        assert_eq!(Selection::new(3, 1).advanced(32), Selection::new(4, 1));
    }

    #[test]
    fn test_fits() {
        assert!(Selection::new(0, 1).fits(1));
        assert!(!Selection::new(1, 1).fits(1));
        assert!(!Selection::new(0, 3).fits(32));
    }
}
