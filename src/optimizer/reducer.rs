//! Exact reduction of a size multiset before any search happens.
//!
//! Two kinds of items are always part of some optimal packing and can be
//! settled without enumerating orderings:
//! - an item of exactly [`SLOT_CAPACITY`] bytes fills a slot on its own;
//! - two items whose sizes add up to [`SLOT_CAPACITY`] fill a slot together.
//!
//! Every size `a` has exactly one complement `32 - a`, so pairing by value
//! counts finds the largest possible set of complementary pairs.

use crate::layout::SLOT_CAPACITY;

const CAP: usize = SLOT_CAPACITY as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// Slots settled by full-capacity items and complementary pairs.
    pub reduced_slots: u32,
    /// Items that still need searching, largest first.
    pub residual: Vec<u8>,
    /// True when `reduced_slots` already is the optimum for the whole input.
    pub exact: bool,
    pub full_items: u32,
    pub pairs: u32,
}

impl Reduction {
    pub fn residual_bytes(&self) -> u32 {
        self.residual.iter().map(|&s| s as u32).sum()
    }
}

/// Sizes must lie in `1..=SLOT_CAPACITY`; callers validate beforehand.
pub fn reduce(sizes: &[u8]) -> Reduction {
    let mut counts = [0u32; CAP + 1];
    for &size in sizes {
        counts[size as usize] += 1;
    }

    // 1. Full slots
    let full_items = counts[CAP];
    counts[CAP] = 0;

    // 2. Complementary pairs
    let mut pairs = 0;
    for a in 1..CAP / 2 {
        let b = CAP - a;
        let matched = counts[a].min(counts[b]);
        counts[a] -= matched;
        counts[b] -= matched;
        pairs += matched;
    }
    let halves = counts[CAP / 2] / 2;
    counts[CAP / 2] -= halves * 2;
    pairs += halves;

    let mut residual = Vec::new();
    for size in (1..CAP).rev() {
        for _ in 0..counts[size] {
            residual.push(size as u8);
        }
    }

    let mut reduced_slots = full_items + pairs;
    let remaining: u32 = residual.iter().map(|&s| s as u32).sum();

    // 3. Nothing left, or 4. everything left fits in one slot
    let exact = if residual.is_empty() {
        true
    } else if remaining <= SLOT_CAPACITY {
        reduced_slots += 1;
        residual.clear();
        true
    } else {
        false
    };

    Reduction {
        reduced_slots,
        residual,
        exact,
        full_items,
        pairs,
    }
}
