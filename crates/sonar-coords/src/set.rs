//! # Coordinate Set
//!
//! The enumeration engine. A `CoordSet` is built in one pass over the
//! topology reported by a [`DeviceStateProvider`]: devices, then SMs, then
//! warps, then lanes, each level gated by the filter and by the predicate
//! mask. Matches are collapsed to the requested granularity and kept in
//! comparator order.
//!
//! Construction queries the provider exactly once and then owns an
//! immutable snapshot; a provider fault aborts the build and propagates to
//! the caller.

use alloc::vec::Vec;
use core::slice;

use bitflags::bitflags;
use hashbrown::{HashMap, HashSet};

use sonar_core::{Dim3, GridId, KernelId, Result};
use sonar_state::DeviceStateProvider;

use crate::compare::{CompareMode, CoordCompare};
use crate::coords::{CoordSlot, Coords, LogicalCoords, PhysicalCoords};

// =============================================================================
// GRANULARITY
// =============================================================================

/// The level at which the engine deduplicates and reports results
///
/// Physical granularities enumerate hardware units; logical granularities
/// enumerate launch positions and therefore require a live kernel binding
/// (invalid warps are skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One entry per device
    Devices,
    /// One entry per SM
    Sms,
    /// One entry per warp
    Warps,
    /// One entry per lane
    Lanes,
    /// One entry per resident kernel
    Kernels,
    /// One entry per (kernel, block)
    Blocks,
    /// One entry per thread
    Threads,
}

impl Granularity {
    /// Does this granularity enumerate physical units?
    #[inline]
    pub const fn is_physical(self) -> bool {
        matches!(self, Self::Devices | Self::Sms | Self::Warps | Self::Lanes)
    }

    /// Does this granularity enumerate logical launch positions?
    #[inline]
    pub const fn is_logical(self) -> bool {
        !self.is_physical()
    }

    /// The natural compare mode for this granularity
    #[inline]
    pub const fn natural_compare(self) -> CompareMode {
        if self.is_physical() {
            CompareMode::Physical
        } else {
            CompareMode::Logical
        }
    }

    // Field-retention tables: which fields an output coordinate keeps.
    // Everything not kept is wildcarded before insertion, which is what
    // collapses fine matches into one coarse entry.

    const fn store_sm(self) -> bool {
        matches!(
            self,
            Self::Sms | Self::Warps | Self::Lanes | Self::Blocks | Self::Threads
        )
    }

    const fn store_warp(self) -> bool {
        matches!(self, Self::Warps | Self::Lanes | Self::Threads)
    }

    const fn store_lane(self) -> bool {
        matches!(self, Self::Lanes | Self::Threads)
    }

    const fn store_kernel(self) -> bool {
        !matches!(self, Self::Devices)
    }

    const fn store_block(self) -> bool {
        matches!(self, Self::Warps | Self::Lanes | Self::Blocks | Self::Threads)
    }

    const fn store_thread(self) -> bool {
        matches!(self, Self::Warps | Self::Lanes | Self::Blocks | Self::Threads)
    }

    /// Does one representative per coarser unit suffice?
    ///
    /// True for every granularity coarser than lanes/threads: once a unit
    /// has produced an entry, the remaining lanes of the current warp
    /// cannot add information.
    const fn one_lane_suffices(self) -> bool {
        matches!(
            self,
            Self::Devices | Self::Sms | Self::Warps | Self::Kernels | Self::Blocks
        )
    }
}

// =============================================================================
// SELECT MASK
// =============================================================================

bitflags! {
    /// Runtime predicates gating inclusion during enumeration
    ///
    /// An empty mask selects every unit the filter admits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SelectMask: u32 {
        /// Unit must be valid (holding live state)
        const VALID = 1 << 0;
        /// Lane must be stopped at a planted breakpoint
        const BREAKPOINT = 1 << 1;
        /// Lane must report an exception
        const EXCEPTION = 1 << 2;
        /// SM must report an exception on any lane
        const SM_EXCEPTION = 1 << 3;
        /// Stop after the first match
        const SINGLE = 1 << 4;
        /// Warp must be halted on a trap, lane valid and active
        const TRAP = 1 << 5;
        /// Unit state must be as fresh as the reference clock
        const CURRENT_CLOCK = 1 << 6;
        /// Lane must be enabled by the execution mask
        const ACTIVE = 1 << 7;
    }
}

// =============================================================================
// COORDINATE QUERY
// =============================================================================

/// Construction inputs for a [`CoordSet`]
///
/// The compare mode defaults to the granularity's natural mode; callers
/// ordering physical sets logically (or vice versa) must pin
/// fully-defined fields themselves.
#[derive(Debug, Clone)]
pub struct CoordQuery {
    /// Enumeration and deduplication level
    pub granularity: Granularity,
    /// Runtime predicates gating inclusion
    pub mask: SelectMask,
    /// Which half of the coordinate orders the results
    pub compare: CompareMode,
    /// Coordinate pattern candidates must match
    pub filter: Coords,
    /// Order results nearest to this coordinate instead of sequentially
    pub origin: Option<Coords>,
}

impl CoordQuery {
    /// A query selecting everything at the given granularity
    pub const fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            mask: SelectMask::empty(),
            compare: granularity.natural_compare(),
            filter: Coords::wildcard(),
            origin: None,
        }
    }
}

// =============================================================================
// COORDINATE SET
// =============================================================================

/// Ordered unique set of coordinates at one granularity
///
/// Iteration yields members in comparator order. The set is a plain
/// value: cloning or moving it never touches the provider again.
#[derive(Debug, Clone)]
pub struct CoordSet {
    compare: CoordCompare,
    coords: Vec<Coords>,
}

impl Default for CoordSet {
    /// An empty placeholder set with sequential logical order
    fn default() -> Self {
        Self {
            compare: CoordCompare::sequential(CompareMode::Logical),
            coords: Vec::new(),
        }
    }
}

impl CoordSet {
    /// Enumerate coordinates matching `query` against `provider`
    ///
    /// Any provider fault aborts the build and is returned as the error;
    /// a build that finds nothing returns an empty set.
    pub fn build<P>(provider: &P, query: &CoordQuery) -> Result<Self>
    where
        P: DeviceStateProvider + ?Sized,
    {
        let mut compare = CoordCompare::sequential(query.compare);
        if let Some(origin) = query.origin {
            compare.reset_origin(origin);
        }

        let mut set = Self {
            compare,
            coords: Vec::new(),
        };
        set.enumerate(provider, query)?;

        log::debug!(
            "coord set built: {} entries at {:?} granularity",
            set.len(),
            query.granularity
        );
        Ok(set)
    }

    /// Number of members
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// True when no coordinate matched
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// The first member in comparator order
    ///
    /// Under an origin ordering this is the nearest match.
    #[inline]
    pub fn first(&self) -> Option<&Coords> {
        self.coords.first()
    }

    /// Iterate members in comparator order
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Coords> {
        self.coords.iter()
    }

    /// Insert, keeping order and uniqueness under the active comparator
    fn insert(&mut self, coords: Coords) {
        match self
            .coords
            .binary_search_by(|probe| self.compare.compare(probe, &coords))
        {
            Ok(_) => {} // comparator-equal member already present
            Err(pos) => self.coords.insert(pos, coords),
        }
    }

    /// The traversal: device → SM → warp → lane
    fn enumerate<P>(&mut self, provider: &P, query: &CoordQuery) -> Result<()>
    where
        P: DeviceStateProvider + ?Sized,
    {
        let granularity = query.granularity;
        let filter = &query.filter;

        let valid = query.mask.contains(SelectMask::VALID);
        let at_breakpoint = query.mask.contains(SelectMask::BREAKPOINT);
        let at_exception = query.mask.contains(SelectMask::EXCEPTION);
        let at_sm_exception = query.mask.contains(SelectMask::SM_EXCEPTION);
        let single = query.mask.contains(SelectMask::SINGLE);
        let at_trap = query.mask.contains(SelectMask::TRAP);
        let active = query.mask.contains(SelectMask::ACTIVE);

        // Staleness is judged against one reference clock for the whole
        // traversal
        let reference_clock = if query.mask.contains(SelectMask::CURRENT_CLOCK) {
            Some(provider.clock()?)
        } else {
            None
        };

        // The breakpoint address space is resolved lazily, once
        let mut aspace = None;

        // Dedup scratch for the coarse logical granularities, local to
        // this one build
        let mut found_kernels: HashSet<CoordSlot<KernelId>> = HashSet::new();
        let mut found_blocks: HashMap<CoordSlot<KernelId>, HashSet<CoordSlot<Dim3>>> =
            HashMap::new();

        'devices: for dev in 0..provider.num_devices()? {
            if !filter.physical.dev.matches_value(&dev) {
                continue;
            }

            let num_sms = provider.device_num_sms(dev)?;
            let num_warps = provider.device_num_warps(dev)?;
            let num_lanes = provider.device_num_lanes(dev)?;

            for sm in 0..num_sms {
                if !filter.physical.sm.matches_value(&sm) {
                    continue;
                }

                if (at_exception || at_sm_exception) && !provider.sm_has_exception(dev, sm)? {
                    continue;
                }

                let sm_is_valid = provider.sm_valid(dev, sm)?;
                if valid && !sm_is_valid {
                    continue;
                }

                // Set size at SM entry, to detect a first entry below
                let sm_epoch = self.coords.len();

                for wp in 0..num_warps {
                    if !filter.physical.wp.matches_value(&wp) {
                        continue;
                    }

                    let valid_warp = sm_is_valid && provider.warp_valid(dev, sm, wp)?;

                    // Logical granularities need a live kernel binding, so
                    // invalid warps cannot contribute to them at all
                    if !valid_warp && (valid || granularity.is_logical()) {
                        continue;
                    }

                    if let Some(reference) = reference_clock {
                        if let Some(ts) = provider.warp_timestamp(dev, sm, wp)? {
                            if ts < reference {
                                continue;
                            }
                        }
                    }

                    if at_trap && !provider.warp_broken(dev, sm, wp)? {
                        continue;
                    }

                    // Resolve the warp's logical identity. An invalid warp
                    // (or a valid one with nothing bound yet) keeps the
                    // invalid sentinel in every slot.
                    let mut kernel_id: CoordSlot<KernelId> = CoordSlot::Invalid;
                    let mut grid_id: CoordSlot<GridId> = CoordSlot::Invalid;
                    let mut cluster_idx: CoordSlot<Dim3> = CoordSlot::Invalid;
                    let mut block_idx: CoordSlot<Dim3> = CoordSlot::Invalid;

                    if valid_warp {
                        if let Some(kernel) = provider.warp_kernel(dev, sm, wp)? {
                            kernel_id = CoordSlot::Exact(kernel.id);
                            grid_id = CoordSlot::Exact(provider.warp_grid_id(dev, sm, wp)?);
                            cluster_idx = if kernel.is_clustered() {
                                CoordSlot::Exact(provider.warp_cluster_idx(dev, sm, wp)?)
                            } else {
                                CoordSlot::Ignored
                            };
                            block_idx = CoordSlot::Exact(provider.warp_block_idx(dev, sm, wp)?);
                        }
                    }

                    if !filter.logical.kernel_id.matches(&kernel_id)
                        || !filter.logical.grid_id.matches(&grid_id)
                        || !filter.logical.block_idx.matches(&block_idx)
                    {
                        continue;
                    }

                    // Coarse logical dedup: one entry per kernel, or per
                    // (kernel, block)
                    match granularity {
                        Granularity::Kernels => {
                            if !found_kernels.insert(kernel_id) {
                                continue;
                            }
                        }
                        Granularity::Blocks => {
                            if !found_blocks
                                .entry(kernel_id)
                                .or_default()
                                .insert(block_idx)
                            {
                                continue;
                            }
                        }
                        _ => {}
                    }

                    // Set size at warp entry, to detect a first entry below
                    let warp_epoch = self.coords.len();

                    for ln in 0..num_lanes {
                        if !filter.physical.ln.matches_value(&ln) {
                            continue;
                        }

                        let lane_is_valid = provider.lane_valid(dev, sm, wp, ln)?;
                        if valid && !lane_is_valid {
                            continue;
                        }

                        // Activity only matters to a subset of predicates;
                        // do not query it otherwise
                        let needs_active = active || at_breakpoint || at_exception || at_trap;
                        let lane_is_active =
                            needs_active && provider.lane_active(dev, sm, wp, ln)?;
                        if active && !lane_is_active {
                            continue;
                        }

                        if let Some(reference) = reference_clock {
                            if let Some(ts) = provider.lane_timestamp(dev, sm, wp, ln)? {
                                if ts < reference {
                                    continue;
                                }
                            }
                        }

                        if at_breakpoint {
                            if !(valid_warp && lane_is_valid && lane_is_active) {
                                continue;
                            }
                            if aspace.is_none() {
                                aspace = Some(provider.code_address_space()?);
                            }
                            match aspace.unwrap_or(None) {
                                // No execution context yet: nothing can be
                                // stopped at a breakpoint
                                None => continue,
                                Some(handle) => {
                                    let pc = provider.lane_pc(dev, sm, wp, ln)?;
                                    if !provider.breakpoint_at(handle, pc)? {
                                        continue;
                                    }
                                }
                            }
                        }

                        if at_exception
                            && !(valid_warp
                                && lane_is_valid
                                && lane_is_active
                                && provider.lane_exception(dev, sm, wp, ln)?.is_some())
                        {
                            continue;
                        }

                        if at_trap && !(valid_warp && lane_is_valid && lane_is_active) {
                            continue;
                        }

                        // Thread identity exists only under a kernel binding
                        let thread_idx = if kernel_id.is_exact() && lane_is_valid {
                            CoordSlot::Exact(provider.lane_thread_idx(dev, sm, wp, ln)?)
                        } else {
                            CoordSlot::Invalid
                        };

                        if !filter.logical.thread_idx.matches(&thread_idx) {
                            continue;
                        }

                        // A match: keep the granularity's fields, wildcard
                        // the rest, insert in comparator order
                        let coords = Coords {
                            physical: PhysicalCoords {
                                dev: CoordSlot::Exact(dev),
                                sm: retain(granularity.store_sm(), CoordSlot::Exact(sm)),
                                wp: retain(granularity.store_warp(), CoordSlot::Exact(wp)),
                                ln: retain(granularity.store_lane(), CoordSlot::Exact(ln)),
                            },
                            logical: LogicalCoords {
                                kernel_id: retain(granularity.store_kernel(), kernel_id),
                                grid_id: retain(granularity.store_kernel(), grid_id),
                                cluster_idx: retain(granularity.store_block(), cluster_idx),
                                block_idx: retain(granularity.store_block(), block_idx),
                                thread_idx: retain(granularity.store_thread(), thread_idx),
                            },
                        };
                        self.insert(coords);

                        if single {
                            break;
                        }

                        // Coarser than lanes/threads: one entry per warp is
                        // enough, the remaining lanes add nothing
                        if granularity.one_lane_suffices() {
                            break;
                        }
                    }

                    if single && !self.coords.is_empty() {
                        break 'devices;
                    }

                    // Device/SM granularity: one entry per SM is enough
                    if matches!(granularity, Granularity::Devices | Granularity::Sms)
                        && self.coords.len() > warp_epoch
                    {
                        break;
                    }
                }

                // Device granularity: one entry per device is enough
                if granularity == Granularity::Devices && self.coords.len() > sm_epoch {
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Keep `slot` when `keep` is set, wildcard it otherwise
#[inline]
fn retain<T>(keep: bool, slot: CoordSlot<T>) -> CoordSlot<T> {
    if keep {
        slot
    } else {
        CoordSlot::Wildcard
    }
}

impl<'a> IntoIterator for &'a CoordSet {
    type Item = &'a Coords;
    type IntoIter = slice::Iter<'a, Coords>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_classification() {
        assert!(Granularity::Lanes.is_physical());
        assert!(!Granularity::Lanes.is_logical());
        assert!(Granularity::Kernels.is_logical());
        assert_eq!(Granularity::Sms.natural_compare(), CompareMode::Physical);
        assert_eq!(Granularity::Blocks.natural_compare(), CompareMode::Logical);
    }

    #[test]
    fn test_field_retention_tables() {
        // Devices keep nothing but the device index
        assert!(!Granularity::Devices.store_sm());
        assert!(!Granularity::Devices.store_kernel());

        // Sms keep kernel identity but not block/thread position
        assert!(Granularity::Sms.store_kernel());
        assert!(!Granularity::Sms.store_block());

        // Threads keep the full logical position
        assert!(Granularity::Threads.store_block());
        assert!(Granularity::Threads.store_thread());
        assert!(Granularity::Threads.store_lane());

        // Kernels keep neither SM nor block
        assert!(!Granularity::Kernels.store_sm());
        assert!(!Granularity::Kernels.store_block());
    }

    #[test]
    fn test_insert_orders_and_dedups() {
        let mut set = CoordSet {
            compare: CoordCompare::sequential(CompareMode::Physical),
            coords: Vec::new(),
        };

        set.insert(Coords::at_physical(0, 1, 0, 0));
        set.insert(Coords::at_physical(0, 0, 0, 0));
        set.insert(Coords::at_physical(0, 1, 0, 0)); // duplicate

        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), Some(&Coords::at_physical(0, 0, 0, 0)));
    }

    #[test]
    fn test_default_set_is_empty() {
        let set = CoordSet::default();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
