//! # Device State Provider
//!
//! The capability trait the enumeration engine consumes. Implemented by
//! whatever can answer state queries about a stopped accelerator: a live
//! debug-API session, a loaded core dump, or [`MockDevice`].
//!
//! Every query is fallible. A provider fault must surface as an error so
//! the engine can abort the enumeration that needed it; silently
//! answering "invalid" would let a dead backend masquerade as "no match".
//!
//! [`MockDevice`]: crate::mock::MockDevice

use sonar_core::{AddressSpaceId, Dim3, GridId, Result, StateClock, VirtAddr};

use crate::exception::LaneException;
use crate::kernel::KernelInfo;

// =============================================================================
// DEVICE STATE PROVIDER
// =============================================================================

/// State queries the enumeration engine performs against a stopped device
///
/// Physical units are addressed by plain indices: `dev` (device), `sm`
/// (streaming multiprocessor), `wp` (warp within an SM), `ln` (lane within
/// a warp). All indices are dense and zero-based, bounded by the topology
/// queries.
///
/// Identity queries (`warp_*`, `lane_thread_idx`) are only meaningful when
/// the owning unit is valid; providers may answer
/// [`Error::IdentityUnavailable`] otherwise.
///
/// Implementations must not mutate observable state while an enumeration
/// is in flight; state refresh is serialized externally.
///
/// [`Error::IdentityUnavailable`]: sonar_core::Error::IdentityUnavailable
pub trait DeviceStateProvider {
    // =========================================================================
    // Topology
    // =========================================================================

    /// Number of devices in the system
    fn num_devices(&self) -> Result<u32>;

    /// Number of SMs on a device
    fn device_num_sms(&self, dev: u32) -> Result<u32>;

    /// Number of warps per SM on a device
    fn device_num_warps(&self, dev: u32) -> Result<u32>;

    /// Number of lanes per warp on a device
    fn device_num_lanes(&self, dev: u32) -> Result<u32>;

    // =========================================================================
    // Validity and activity
    // =========================================================================

    /// Is this SM running at least one warp?
    fn sm_valid(&self, dev: u32, sm: u32) -> Result<bool>;

    /// Does this SM report an exception on any of its lanes?
    fn sm_has_exception(&self, dev: u32, sm: u32) -> Result<bool>;

    /// Is this warp resident and executing?
    fn warp_valid(&self, dev: u32, sm: u32, wp: u32) -> Result<bool>;

    /// Is this warp halted on a trap instruction?
    fn warp_broken(&self, dev: u32, sm: u32, wp: u32) -> Result<bool>;

    /// Is this lane holding live thread state?
    fn lane_valid(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<bool>;

    /// Is this lane enabled by the current execution mask?
    fn lane_active(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<bool>;

    /// Is this lane diverged from the warp's active branch?
    fn lane_divergent(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<bool>;

    // =========================================================================
    // Identity resolution (valid owners only)
    // =========================================================================

    /// The kernel this warp is executing, if any is bound
    fn warp_kernel(&self, dev: u32, sm: u32, wp: u32) -> Result<Option<KernelInfo>>;

    /// The grid id this warp belongs to
    fn warp_grid_id(&self, dev: u32, sm: u32, wp: u32) -> Result<GridId>;

    /// The cluster index of this warp's block
    fn warp_cluster_idx(&self, dev: u32, sm: u32, wp: u32) -> Result<Dim3>;

    /// The block index this warp belongs to
    fn warp_block_idx(&self, dev: u32, sm: u32, wp: u32) -> Result<Dim3>;

    /// The thread index this lane is executing
    fn lane_thread_idx(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<Dim3>;

    // =========================================================================
    // Execution state
    // =========================================================================

    /// Current program counter of a lane
    fn lane_pc(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<VirtAddr>;

    /// Exception reported by a lane, if any
    fn lane_exception(&self, dev: u32, sm: u32, wp: u32, ln: u32)
        -> Result<Option<LaneException>>;

    // =========================================================================
    // Timestamps
    // =========================================================================

    /// Clock value at which this warp's state was last updated
    ///
    /// `None` when the backend does not track per-warp timestamps; such
    /// warps are never considered stale.
    fn warp_timestamp(&self, dev: u32, sm: u32, wp: u32) -> Result<Option<StateClock>>;

    /// Clock value at which this lane's state was last updated
    fn lane_timestamp(&self, dev: u32, sm: u32, wp: u32, ln: u32)
        -> Result<Option<StateClock>>;

    /// The global reference clock of the current state snapshot
    fn clock(&self) -> Result<StateClock>;

    // =========================================================================
    // Breakpoints
    // =========================================================================

    /// The code address space breakpoints are resolved against
    ///
    /// `None` when no execution context exists yet. The engine resolves
    /// this lazily, once per enumeration, on first need.
    fn code_address_space(&self) -> Result<Option<AddressSpaceId>>;

    /// Is a breakpoint planted at `pc` in the given address space?
    fn breakpoint_at(&self, aspace: AddressSpaceId, pc: VirtAddr) -> Result<bool>;
}
