//! # Execution Coordinates
//!
//! A coordinate is an immutable tuple of physical placement (device, SM,
//! warp, lane) and logical launch position (kernel, grid, cluster, block,
//! thread). Every field is a [`CoordSlot`]: concrete, or one of the
//! reserved non-concrete states used for filtering and partial identity.
//!
//! Coordinates carry no device-state ownership. They describe a snapshot
//! and are stale the moment device state is refreshed; callers must not
//! cache them across a refresh.

use core::fmt;

use static_assertions::assert_eq_size;

use sonar_core::{Dim3, GridId, KernelId};

// =============================================================================
// COORDINATE SLOT
// =============================================================================

/// One field of a coordinate
///
/// Slots order as `Wildcard < Invalid < Ignored < Exact(_)`, which keeps
/// sequential ordering total even for partially defined coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CoordSlot<T> {
    /// Matches any concrete value when used in a filter
    #[default]
    Wildcard,
    /// Identity unavailable (the unit has no live kernel binding)
    Invalid,
    /// Field deliberately untracked (cluster index on unclustered launches)
    Ignored,
    /// Concrete value
    Exact(T),
}

assert_eq_size!(CoordSlot<u32>, u64);

impl<T> CoordSlot<T> {
    /// Is this slot a concrete value?
    #[inline]
    pub const fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Is this slot the wildcard?
    #[inline]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

impl<T: Copy> CoordSlot<T> {
    /// The concrete value, if any
    #[inline]
    pub fn exact(self) -> Option<T> {
        match self {
            Self::Exact(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: PartialEq> CoordSlot<T> {
    /// Filter matching against another slot
    ///
    /// A wildcard filter slot matches anything; every other filter slot
    /// matches only its own state (so a filter pinned to `Invalid` selects
    /// exactly the units with unavailable identity).
    #[inline]
    pub fn matches(&self, observed: &Self) -> bool {
        self.is_wildcard() || self == observed
    }

    /// Filter matching against a concrete value
    #[inline]
    pub fn matches_value(&self, observed: &T) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Exact(value) => value == observed,
            _ => false,
        }
    }
}

impl<T: fmt::Display> fmt::Display for CoordSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => write!(f, "*"),
            Self::Invalid => write!(f, "invalid"),
            Self::Ignored => write!(f, "-"),
            Self::Exact(value) => write!(f, "{}", value),
        }
    }
}

// =============================================================================
// PHYSICAL COORDINATES
// =============================================================================

/// Placement in the physical execution hierarchy
///
/// Derived ordering is lexicographic over (device, SM, warp, lane) — the
/// sequential order of the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysicalCoords {
    /// Device index
    pub dev: CoordSlot<u32>,
    /// SM index within the device
    pub sm: CoordSlot<u32>,
    /// Warp index within the SM
    pub wp: CoordSlot<u32>,
    /// Lane index within the warp
    pub ln: CoordSlot<u32>,
}

impl PhysicalCoords {
    /// All-wildcard physical coordinates
    pub const fn wildcard() -> Self {
        Self {
            dev: CoordSlot::Wildcard,
            sm: CoordSlot::Wildcard,
            wp: CoordSlot::Wildcard,
            ln: CoordSlot::Wildcard,
        }
    }

    /// Fully concrete physical coordinates
    pub const fn exact(dev: u32, sm: u32, wp: u32, ln: u32) -> Self {
        Self {
            dev: CoordSlot::Exact(dev),
            sm: CoordSlot::Exact(sm),
            wp: CoordSlot::Exact(wp),
            ln: CoordSlot::Exact(ln),
        }
    }

    /// True when every field is concrete
    ///
    /// Required of both operands before distance ordering.
    pub const fn is_fully_defined(&self) -> bool {
        self.dev.is_exact() && self.sm.is_exact() && self.wp.is_exact() && self.ln.is_exact()
    }
}

impl fmt::Display for PhysicalCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.dev, self.sm, self.wp, self.ln)
    }
}

// =============================================================================
// LOGICAL COORDINATES
// =============================================================================

/// Position in the logical launch hierarchy
///
/// Derived ordering is lexicographic over (kernel, grid, cluster, block,
/// thread) — the sequential order of the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalCoords {
    /// Kernel id
    pub kernel_id: CoordSlot<KernelId>,
    /// Grid id
    pub grid_id: CoordSlot<GridId>,
    /// Cluster index of the block
    pub cluster_idx: CoordSlot<Dim3>,
    /// Block index within the grid
    pub block_idx: CoordSlot<Dim3>,
    /// Thread index within the block
    pub thread_idx: CoordSlot<Dim3>,
}

impl LogicalCoords {
    /// All-wildcard logical coordinates
    pub const fn wildcard() -> Self {
        Self {
            kernel_id: CoordSlot::Wildcard,
            grid_id: CoordSlot::Wildcard,
            cluster_idx: CoordSlot::Wildcard,
            block_idx: CoordSlot::Wildcard,
            thread_idx: CoordSlot::Wildcard,
        }
    }

    /// True when every distance-ordered field is concrete
    ///
    /// The cluster index does not participate in distance ordering (it is
    /// untracked on unclustered launches), so it is exempt here; it still
    /// takes part in the sequential tuple order, where non-concrete slots
    /// order deterministically before concrete ones.
    pub const fn is_fully_defined(&self) -> bool {
        self.kernel_id.is_exact()
            && self.grid_id.is_exact()
            && self.block_idx.is_exact()
            && self.thread_idx.is_exact()
    }
}

impl fmt::Display for LogicalCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{},{})",
            self.kernel_id, self.grid_id, self.cluster_idx, self.block_idx, self.thread_idx
        )
    }
}

// =============================================================================
// COORDINATES
// =============================================================================

/// A full execution coordinate: physical placement × logical position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coords {
    /// Physical placement
    pub physical: PhysicalCoords,
    /// Logical launch position
    pub logical: LogicalCoords,
}

impl Coords {
    /// Create from both halves
    pub const fn new(physical: PhysicalCoords, logical: LogicalCoords) -> Self {
        Self { physical, logical }
    }

    /// The all-wildcard coordinate (matches every unit as a filter)
    pub const fn wildcard() -> Self {
        Self {
            physical: PhysicalCoords::wildcard(),
            logical: LogicalCoords::wildcard(),
        }
    }

    /// Concrete physical placement, wildcard logical position
    pub const fn at_physical(dev: u32, sm: u32, wp: u32, ln: u32) -> Self {
        Self {
            physical: PhysicalCoords::exact(dev, sm, wp, ln),
            logical: LogicalCoords::wildcard(),
        }
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "physical {} logical {}", self.physical, self.logical)
    }
}
