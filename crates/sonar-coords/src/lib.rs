//! # SONAR Coords
//!
//! Execution coordinates and the enumeration engine.
//!
//! A coordinate names a point in two crossed hierarchies: the physical
//! placement (device → SM → warp → lane) and the logical launch position
//! (kernel → grid → cluster → block → thread). The engine walks the
//! physical hierarchy reported by a [`DeviceStateProvider`], narrows it by
//! a filter pattern and a predicate mask, deduplicates at the requested
//! granularity, and stores the survivors in comparator order — sequential
//! or nearest-to-origin.
//!
//! ```no_run
//! use sonar_coords::{CoordQuery, CoordSet, Granularity, SelectMask};
//! # fn demo(provider: &dyn sonar_state::DeviceStateProvider) -> sonar_core::Result<()> {
//! let query = CoordQuery {
//!     mask: SelectMask::VALID | SelectMask::ACTIVE,
//!     ..CoordQuery::new(Granularity::Threads)
//! };
//! let set = CoordSet::build(provider, &query)?;
//! for coords in &set {
//!     // first match is the nearest candidate under the active ordering
//!     let _ = coords;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`DeviceStateProvider`]: sonar_state::DeviceStateProvider

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod compare;
pub mod coords;
pub mod set;

// Re-exports for convenience
pub use compare::{CompareMode, CoordCompare};
pub use coords::{CoordSlot, Coords, LogicalCoords, PhysicalCoords};
pub use set::{CoordQuery, CoordSet, Granularity, SelectMask};
