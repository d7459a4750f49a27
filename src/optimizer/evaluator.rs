use crate::layout::SLOT_CAPACITY;

/// Outcome of packing a single ordering against the best count known so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// The ordering packs into this many slots, strictly fewer than the best.
    Slots(u32),
    /// Abandoned: the ordering already needs at least as many slots as the best.
    NotBetter,
}

/// Packs `ordering` sequentially, closing a slot as soon as it is exactly full.
///
/// A freshly opened slot only counts once an item lands in it.
#[inline]
pub fn evaluate(ordering: &[u8], best: u32) -> Fit {
    let mut closed = 0u32;
    let mut used = 0u32;

    for &size in ordering {
        let size = size as u32;
        if used + size > SLOT_CAPACITY {
            closed += 1;
            used = 0;
        }
        used += size;
        if used == SLOT_CAPACITY {
            closed += 1;
            used = 0;
        }

        let running = closed + (used > 0) as u32;
        if running >= best {
            return Fit::NotBetter;
        }
    }

    Fit::Slots(closed + (used > 0) as u32)
}
