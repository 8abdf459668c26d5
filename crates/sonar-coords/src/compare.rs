//! # Coordinate Ordering
//!
//! Two orders over fully defined coordinates:
//!
//! - **Sequential** (default): lexicographic over the natural field tuple
//!   of the active mode.
//! - **Nearest-to-origin**: per-field distance from an origin coordinate,
//!   most-significant field first, deciding on the first field where the
//!   two operands' distances differ; a full tie falls back to the
//!   sequential order over raw values so the order stays total.
//!
//! Entering origin mode via [`CoordCompare::reset_origin`] is one-way:
//! there is no way back to sequential ordering on the same comparator —
//! construct a fresh one instead.

use core::cmp::Ordering;

use sonar_core::{Dim3, GridId, KernelId};

use crate::coords::{CoordSlot, Coords};

// =============================================================================
// COMPARE MODE
// =============================================================================

/// Which half of a coordinate the comparator orders by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareMode {
    /// Order by kernel id, grid id, cluster, block, thread
    #[default]
    Logical,
    /// Order by device, SM, warp, lane
    Physical,
}

// =============================================================================
// FIELD DISTANCE
// =============================================================================

/// Unsigned distance magnitude between two field values
trait FieldDistance {
    fn distance(self, other: Self) -> u64;
}

impl FieldDistance for u32 {
    #[inline]
    fn distance(self, other: Self) -> u64 {
        self.abs_diff(other) as u64
    }
}

impl FieldDistance for KernelId {
    #[inline]
    fn distance(self, other: Self) -> u64 {
        self.raw().abs_diff(other.raw())
    }
}

impl FieldDistance for GridId {
    #[inline]
    fn distance(self, other: Self) -> u64 {
        self.raw().abs_diff(other.raw())
    }
}

impl FieldDistance for Dim3 {
    #[inline]
    fn distance(self, other: Self) -> u64 {
        Dim3::distance(self, other)
    }
}

/// Order two operands by distance from an origin field
///
/// `None` means this field cannot decide: the origin is not concrete
/// (always a tie, defer to the next field) or the distances are equal.
fn distance_order<T: FieldDistance + Copy>(
    origin: CoordSlot<T>,
    lhs: CoordSlot<T>,
    rhs: CoordSlot<T>,
) -> Option<Ordering> {
    let origin = origin.exact()?;
    let (lhs, rhs) = (lhs.exact()?, rhs.exact()?);

    let dl = lhs.distance(origin);
    let dr = rhs.distance(origin);
    if dl == dr {
        None
    } else {
        Some(dl.cmp(&dr))
    }
}

// =============================================================================
// COORDINATE COMPARATOR
// =============================================================================

/// Stateful coordinate comparator
///
/// Starts in sequential order; [`reset_origin`] switches permanently to
/// nearest-to-origin order.
///
/// [`reset_origin`]: CoordCompare::reset_origin
#[derive(Debug, Clone)]
pub struct CoordCompare {
    mode: CompareMode,
    origin: Option<Coords>,
}

impl CoordCompare {
    /// Sequential comparator for the given mode
    pub const fn sequential(mode: CompareMode) -> Self {
        Self { mode, origin: None }
    }

    /// Nearest-to-origin comparator for the given mode
    pub const fn nearest(mode: CompareMode, origin: Coords) -> Self {
        Self {
            mode,
            origin: Some(origin),
        }
    }

    /// Switch to nearest-to-origin order around `origin`
    ///
    /// One-way: a comparator that has seen an origin never orders
    /// sequentially again.
    pub fn reset_origin(&mut self, origin: Coords) {
        self.origin = Some(origin);
    }

    /// The active compare mode
    pub const fn mode(&self) -> CompareMode {
        self.mode
    }

    /// Order `lhs` against `rhs`
    ///
    /// In origin mode both operands must be fully defined in the active
    /// mode; this is a caller contract, checked with a debug assertion.
    pub fn compare(&self, lhs: &Coords, rhs: &Coords) -> Ordering {
        let Some(origin) = &self.origin else {
            return self.sequential_order(lhs, rhs);
        };

        match self.mode {
            CompareMode::Logical => {
                let o = &origin.logical;
                let l = &lhs.logical;
                let r = &rhs.logical;

                debug_assert!(
                    l.is_fully_defined() && r.is_fully_defined(),
                    "origin ordering requires fully defined logical coordinates"
                );

                if let Some(ord) = distance_order(o.kernel_id, l.kernel_id, r.kernel_id) {
                    return ord;
                }
                if let Some(ord) = distance_order(o.grid_id, l.grid_id, r.grid_id) {
                    return ord;
                }
                if let Some(ord) = distance_order(o.block_idx, l.block_idx, r.block_idx) {
                    return ord;
                }
                if let Some(ord) = distance_order(o.thread_idx, l.thread_idx, r.thread_idx) {
                    return ord;
                }

                // Every field tied (or the origin is wildcard throughout):
                // fall back to raw sequential order
                l.cmp(r)
            }
            CompareMode::Physical => {
                let o = &origin.physical;
                let l = &lhs.physical;
                let r = &rhs.physical;

                debug_assert!(
                    l.is_fully_defined() && r.is_fully_defined(),
                    "origin ordering requires fully defined physical coordinates"
                );

                if let Some(ord) = distance_order(o.dev, l.dev, r.dev) {
                    return ord;
                }
                if let Some(ord) = distance_order(o.sm, l.sm, r.sm) {
                    return ord;
                }
                if let Some(ord) = distance_order(o.wp, l.wp, r.wp) {
                    return ord;
                }
                if let Some(ord) = distance_order(o.ln, l.ln, r.ln) {
                    return ord;
                }

                l.cmp(r)
            }
        }
    }

    fn sequential_order(&self, lhs: &Coords, rhs: &Coords) -> Ordering {
        match self.mode {
            CompareMode::Logical => lhs.logical.cmp(&rhs.logical),
            CompareMode::Physical => lhs.physical.cmp(&rhs.physical),
        }
    }
}
