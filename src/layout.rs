//! Declared-order slot simulation.
//!
//! Storage packs struct members into 32-byte slots in declaration order: a
//! member that does not fit in the remaining bytes of the active slot starts a
//! new one. This module reproduces that rule to obtain the baseline slot count
//! the optimizer is compared against.

use serde::Serialize;

/// Capacity of one storage slot in bytes.
pub const SLOT_CAPACITY: u32 = 32;

/// Slots used by `sizes` packed in the given order.
///
/// An empty sequence occupies no slots, so an empty struct reports 0 current
/// and 0 optimized rather than the single slot a storage variable would take.
pub fn current_slot_count(sizes: &[u8]) -> u32 {
    if sizes.is_empty() {
        return 0;
    }

    let mut slot_count = 1;
    let mut used = 0u32;
    for &size in sizes {
        let size = size as u32;
        if used + size > SLOT_CAPACITY {
            slot_count += 1;
            used = size;
        } else {
            used += size;
        }
    }
    slot_count
}

/// Fill level of one slot in the declared layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUsage {
    pub bytes_in: u32,
}

impl SlotUsage {
    pub fn bytes_left(&self) -> u32 {
        SLOT_CAPACITY - self.bytes_in
    }
}

/// Per-slot view of the declared layout, used by the annotated report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotBreakdown {
    pub slots: Vec<SlotUsage>,
    /// Zero-based slot index of each member, parallel to the input sizes.
    pub member_slots: Vec<usize>,
}

impl SlotBreakdown {
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }
}

/// Same packing rule as [`current_slot_count`], keeping the slot boundaries.
pub fn slot_breakdown(sizes: &[u8]) -> SlotBreakdown {
    let mut breakdown = SlotBreakdown::default();
    if sizes.is_empty() {
        return breakdown;
    }

    let mut used = 0u32;
    for &size in sizes {
        let size = size as u32;
        if used + size > SLOT_CAPACITY {
            breakdown.slots.push(SlotUsage { bytes_in: used });
            used = size;
        } else {
            used += size;
        }
        breakdown.member_slots.push(breakdown.slots.len());
    }
    breakdown.slots.push(SlotUsage { bytes_in: used });
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order_is_respected() {
        assert_eq!(current_slot_count(&[1, 1, 32, 1]), 3);
        assert_eq!(current_slot_count(&[20, 20]), 2);
        assert_eq!(current_slot_count(&[1, 20, 1]), 1);
    }

    #[test]
    fn test_exact_fill_does_not_open_a_slot() {
        assert_eq!(current_slot_count(&[16, 16]), 1);
        assert_eq!(current_slot_count(&[16, 16, 1]), 2);
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(current_slot_count(&[]), 0);
        assert_eq!(slot_breakdown(&[]).slot_count(), 0);
    }

    #[test]
    fn test_breakdown_matches_count() {
        let sizes = [1, 1, 32, 1, 20, 12, 8];
        let breakdown = slot_breakdown(&sizes);
        assert_eq!(breakdown.slot_count(), current_slot_count(&sizes));
        assert_eq!(breakdown.member_slots, vec![0, 0, 1, 2, 2, 3, 3]);
        assert_eq!(breakdown.slots[0].bytes_in, 2);
        assert_eq!(breakdown.slots[0].bytes_left(), 30);
        assert_eq!(breakdown.slots[2].bytes_in, 21);
        assert_eq!(breakdown.slots[3].bytes_in, 20);
    }
}
