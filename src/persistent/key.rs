//! Composite integer keys for [`PersistentMap`](super::PersistentMap).
//!
//! Keys order lexicographically. The last component is the one range
//! queries aggregate over; everything before it is the *prefix*.

use std::fmt::Debug;
use std::hash::Hash;

/// A key usable in a persistent map.
pub trait MapKey: Copy + Ord + Eq + Hash + Debug {
    /// Every component but the last.
    type Prefix: Copy + Eq + Debug;

    fn prefix(&self) -> Self::Prefix;

    fn last(&self) -> u32;

    fn from_parts(prefix: Self::Prefix, last: u32) -> Self;

    /// Heap priority of the node holding this key.
    ///
    /// Derived from the key so that a given key set always yields the same
    /// tree shape across versions.
    fn priority(&self) -> u64;
}

/// Two-part key `(a, b)`, e.g. `(day, period)` or `(entity, day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key2(pub u32, pub u32);

/// Three-part key `(a, b, c)`, e.g. `(entity, day, period)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key3(pub u32, pub u32, pub u32);

impl MapKey for Key2 {
    type Prefix = u32;

    #[inline]
    fn prefix(&self) -> u32 {
        self.0
    }

    #[inline]
    fn last(&self) -> u32 {
        self.1
    }

    #[inline]
    fn from_parts(prefix: u32, last: u32) -> Self {
        Key2(prefix, last)
    }

    #[inline]
    fn priority(&self) -> u64 {
        mix(mix(0x2b ^ self.0 as u64) ^ self.1 as u64)
    }
}

impl MapKey for Key3 {
    type Prefix = (u32, u32);

    #[inline]
    fn prefix(&self) -> (u32, u32) {
        (self.0, self.1)
    }

    #[inline]
    fn last(&self) -> u32 {
        self.2
    }

    #[inline]
    fn from_parts((a, b): (u32, u32), last: u32) -> Self {
        Key3(a, b, last)
    }

    #[inline]
    fn priority(&self) -> u64 {
        mix(mix(mix(0x3b ^ self.0 as u64) ^ self.1 as u64) ^ self.2 as u64)
    }
}

/// SplitMix64 finalizer.
#[inline]
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
