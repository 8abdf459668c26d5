//! # SONAR Rangemap
//!
//! A map from disjoint half-open address ranges `[start, end)` to values.
//!
//! Used by host layers to associate metadata with code ranges — which
//! loaded module an address belongs to, which kernel a code base falls
//! into. Ranges never overlap; insertion of an overlapping range is a
//! caller contract violation, checked loudly in development builds.
//! Lookups are point-containment queries over an ordered map, so they
//! cost one predecessor search.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::collections::BTreeMap;

use sonar_core::VirtAddr;

// =============================================================================
// RANGE MAP
// =============================================================================

/// Disjoint half-open interval map
///
/// Keyed by range start; each entry stores its exclusive end and the
/// associated value. Keeping the keys ordered makes both the disjointness
/// check on insertion and the containment lookup a single neighbor query.
#[derive(Debug, Clone)]
pub struct RangeMap<T> {
    ranges: BTreeMap<VirtAddr, (VirtAddr, T)>,
}

impl<T> Default for RangeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RangeMap<T> {
    /// Create an empty map
    pub const fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Number of ranges in the map
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when the map holds no ranges
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Drop every range
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Associate `[start, start + size)` with `value`
    ///
    /// The new range must be disjoint from every existing range. An
    /// overlap means the caller's address-space model is broken; it is a
    /// contract violation checked by a debug assertion, not a recoverable
    /// error.
    pub fn add(&mut self, start: VirtAddr, size: u64, value: T) {
        let end = start + size;

        // Disjointness: the closest range starting before `end` must have
        // drained before `start`. End is exclusive, so a neighbor ending
        // exactly at `start` is fine.
        if let Some((_, (prev_end, _))) = self.ranges.range(..end).next_back() {
            debug_assert!(
                *prev_end <= start,
                "range [{},{}) overlaps an existing range ending at {}",
                start,
                end,
                prev_end
            );
        }

        log::trace!("rangemap add [{},{})", start, end);
        self.ranges.insert(start, (end, value));
    }

    /// Remove the range containing `addr`, returning its value
    ///
    /// No-op returning `None` when no range contains `addr`.
    pub fn remove_range(&mut self, addr: VirtAddr) -> Option<T> {
        let start = self.find_start(addr)?;
        log::trace!("rangemap remove range containing {}", addr);
        self.ranges.remove(&start).map(|(_, value)| value)
    }

    /// The value of the range containing `addr`, if any
    pub fn get(&self, addr: VirtAddr) -> Option<&T> {
        let (_, (end, value)) = self.ranges.range(..=addr).next_back()?;
        if addr < *end {
            Some(value)
        } else {
            None
        }
    }

    /// Start of the range containing `addr`
    fn find_start(&self, addr: VirtAddr) -> Option<VirtAddr> {
        // The greatest range starting at or before addr is the only
        // candidate; ranges are disjoint, so containment reduces to one
        // exclusive-end check.
        let (start, (end, _)) = self.ranges.range(..=addr).next_back()?;
        if addr < *end {
            Some(*start)
        } else {
            None
        }
    }
}
