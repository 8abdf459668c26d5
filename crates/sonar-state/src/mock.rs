//! # Mock Device
//!
//! A deterministic in-memory [`DeviceStateProvider`] used by tests and
//! host-side simulation.
//!
//! The mock starts out empty and pessimistic: every SM, warp, and lane is
//! invalid until a builder method says otherwise. Mutators take the same
//! dense indices the provider trait uses and panic on out-of-range input —
//! they are test scaffolding, not a fallible API. The trait queries stay
//! fallible and bounds-checked like any real backend.

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashSet;

use sonar_core::{AddressSpaceId, Dim3, Error, GridId, Result, StateClock, VirtAddr};

use crate::exception::LaneException;
use crate::kernel::KernelInfo;
use crate::provider::DeviceStateProvider;

// =============================================================================
// UNIT MODELS
// =============================================================================

#[derive(Debug, Clone, Default)]
struct LaneModel {
    valid: bool,
    active: bool,
    divergent: bool,
    timestamp: Option<StateClock>,
    pc: VirtAddr,
    exception: Option<LaneException>,
    thread_idx: Dim3,
}

#[derive(Debug, Clone, Default)]
struct WarpModel {
    valid: bool,
    broken: bool,
    timestamp: Option<StateClock>,
    kernel: Option<KernelInfo>,
    grid_id: GridId,
    cluster_idx: Dim3,
    block_idx: Dim3,
    lanes: Vec<LaneModel>,
}

#[derive(Debug, Clone, Default)]
struct SmModel {
    valid: bool,
    exception: bool,
    warps: Vec<WarpModel>,
}

#[derive(Debug, Clone)]
struct DeviceModel {
    warps_per_sm: u32,
    lanes_per_warp: u32,
    sms: Vec<SmModel>,
}

// =============================================================================
// MOCK DEVICE
// =============================================================================

/// Deterministic in-memory device state
#[derive(Debug, Default)]
pub struct MockDevice {
    devices: Vec<DeviceModel>,
    clock: StateClock,
    aspace: Option<AddressSpaceId>,
    breakpoints: HashSet<VirtAddr>,
    fault: Option<Error>,
}

impl MockDevice {
    /// Create an empty mock with no devices
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Add a device; returns its index
    ///
    /// All units start invalid.
    pub fn add_device(&mut self, num_sms: u32, warps_per_sm: u32, lanes_per_warp: u32) -> u32 {
        let sms = (0..num_sms)
            .map(|_| SmModel {
                warps: (0..warps_per_sm)
                    .map(|_| WarpModel {
                        lanes: vec![LaneModel::default(); lanes_per_warp as usize],
                        ..WarpModel::default()
                    })
                    .collect(),
                ..SmModel::default()
            })
            .collect();

        self.devices.push(DeviceModel {
            warps_per_sm,
            lanes_per_warp,
            sms,
        });

        let dev = (self.devices.len() - 1) as u32;
        log::debug!(
            "mock device {}: {} SMs, {} warps/SM, {} lanes/warp",
            dev,
            num_sms,
            warps_per_sm,
            lanes_per_warp
        );
        dev
    }

    /// Set the global reference clock
    pub fn set_clock(&mut self, clock: StateClock) {
        self.clock = clock;
    }

    /// Set the code address space handle
    pub fn set_code_address_space(&mut self, aspace: AddressSpaceId) {
        self.aspace = Some(aspace);
    }

    /// Plant a breakpoint at `pc`
    pub fn plant_breakpoint(&mut self, pc: VirtAddr) {
        self.breakpoints.insert(pc);
    }

    /// Remove a previously planted breakpoint
    pub fn remove_breakpoint(&mut self, pc: VirtAddr) {
        self.breakpoints.remove(&pc);
    }

    /// Make every subsequent query fail with `fault`
    ///
    /// Pass `None` to heal the backend again.
    pub fn set_fault(&mut self, fault: Option<Error>) {
        self.fault = fault;
    }

    /// Mark an SM valid or invalid
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_sm_valid(&mut self, dev: u32, sm: u32, valid: bool) {
        self.sm_model_mut(dev, sm).valid = valid;
    }

    /// Mark an SM as reporting an exception
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_sm_exception(&mut self, dev: u32, sm: u32, exception: bool) {
        self.sm_model_mut(dev, sm).exception = exception;
    }

    /// Mark a warp valid without binding a kernel
    ///
    /// Marking a warp valid also marks its SM valid.
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_warp_valid(&mut self, dev: u32, sm: u32, wp: u32, valid: bool) {
        if valid {
            self.sm_model_mut(dev, sm).valid = true;
        }
        self.warp_model_mut(dev, sm, wp).valid = valid;
    }

    /// Bind a warp to a kernel launch and mark it (and its SM) valid
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn bind_warp(
        &mut self,
        dev: u32,
        sm: u32,
        wp: u32,
        kernel: KernelInfo,
        block_idx: Dim3,
        cluster_idx: Dim3,
    ) {
        self.sm_model_mut(dev, sm).valid = true;
        let warp = self.warp_model_mut(dev, sm, wp);
        warp.valid = true;
        warp.grid_id = kernel.grid_id;
        warp.kernel = Some(kernel);
        warp.block_idx = block_idx;
        warp.cluster_idx = cluster_idx;
    }

    /// Mark a warp as halted on a trap
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_warp_broken(&mut self, dev: u32, sm: u32, wp: u32, broken: bool) {
        self.warp_model_mut(dev, sm, wp).broken = broken;
    }

    /// Set a warp's last-update timestamp
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_warp_timestamp(&mut self, dev: u32, sm: u32, wp: u32, ts: Option<StateClock>) {
        self.warp_model_mut(dev, sm, wp).timestamp = ts;
    }

    /// Set a lane's validity and activity
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_lane(&mut self, dev: u32, sm: u32, wp: u32, ln: u32, valid: bool, active: bool) {
        let lane = self.lane_model_mut(dev, sm, wp, ln);
        lane.valid = valid;
        lane.active = active;
    }

    /// Mark a lane as diverged
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_lane_divergent(&mut self, dev: u32, sm: u32, wp: u32, ln: u32, divergent: bool) {
        self.lane_model_mut(dev, sm, wp, ln).divergent = divergent;
    }

    /// Set a lane's program counter
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_lane_pc(&mut self, dev: u32, sm: u32, wp: u32, ln: u32, pc: VirtAddr) {
        self.lane_model_mut(dev, sm, wp, ln).pc = pc;
    }

    /// Set a lane's reported exception
    ///
    /// Reporting an exception also marks the owning SM as excepting.
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_lane_exception(
        &mut self,
        dev: u32,
        sm: u32,
        wp: u32,
        ln: u32,
        exception: Option<LaneException>,
    ) {
        if exception.is_some() {
            self.sm_model_mut(dev, sm).exception = true;
        }
        self.lane_model_mut(dev, sm, wp, ln).exception = exception;
    }

    /// Set a lane's thread index
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_lane_thread_idx(&mut self, dev: u32, sm: u32, wp: u32, ln: u32, idx: Dim3) {
        self.lane_model_mut(dev, sm, wp, ln).thread_idx = idx;
    }

    /// Set a lane's last-update timestamp
    ///
    /// # Panics
    /// Panics if the unit is out of range.
    pub fn set_lane_timestamp(
        &mut self,
        dev: u32,
        sm: u32,
        wp: u32,
        ln: u32,
        ts: Option<StateClock>,
    ) {
        self.lane_model_mut(dev, sm, wp, ln).timestamp = ts;
    }

    // =========================================================================
    // Internal accessors
    // =========================================================================

    fn check_fault(&self) -> Result<()> {
        match self.fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn device_model(&self, dev: u32) -> Result<&DeviceModel> {
        self.devices
            .get(dev as usize)
            .ok_or(Error::CoordinateOutOfRange)
    }

    fn sm_model(&self, dev: u32, sm: u32) -> Result<&SmModel> {
        self.device_model(dev)?
            .sms
            .get(sm as usize)
            .ok_or(Error::CoordinateOutOfRange)
    }

    fn warp_model(&self, dev: u32, sm: u32, wp: u32) -> Result<&WarpModel> {
        self.sm_model(dev, sm)?
            .warps
            .get(wp as usize)
            .ok_or(Error::CoordinateOutOfRange)
    }

    fn lane_model(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<&LaneModel> {
        self.warp_model(dev, sm, wp)?
            .lanes
            .get(ln as usize)
            .ok_or(Error::CoordinateOutOfRange)
    }

    fn sm_model_mut(&mut self, dev: u32, sm: u32) -> &mut SmModel {
        &mut self.devices[dev as usize].sms[sm as usize]
    }

    fn warp_model_mut(&mut self, dev: u32, sm: u32, wp: u32) -> &mut WarpModel {
        &mut self.devices[dev as usize].sms[sm as usize].warps[wp as usize]
    }

    fn lane_model_mut(&mut self, dev: u32, sm: u32, wp: u32, ln: u32) -> &mut LaneModel {
        &mut self.devices[dev as usize].sms[sm as usize].warps[wp as usize].lanes[ln as usize]
    }
}

// =============================================================================
// PROVIDER IMPLEMENTATION
// =============================================================================

impl DeviceStateProvider for MockDevice {
    fn num_devices(&self) -> Result<u32> {
        self.check_fault()?;
        Ok(self.devices.len() as u32)
    }

    fn device_num_sms(&self, dev: u32) -> Result<u32> {
        self.check_fault()?;
        Ok(self.device_model(dev)?.sms.len() as u32)
    }

    fn device_num_warps(&self, dev: u32) -> Result<u32> {
        self.check_fault()?;
        Ok(self.device_model(dev)?.warps_per_sm)
    }

    fn device_num_lanes(&self, dev: u32) -> Result<u32> {
        self.check_fault()?;
        Ok(self.device_model(dev)?.lanes_per_warp)
    }

    fn sm_valid(&self, dev: u32, sm: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.sm_model(dev, sm)?.valid)
    }

    fn sm_has_exception(&self, dev: u32, sm: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.sm_model(dev, sm)?.exception)
    }

    fn warp_valid(&self, dev: u32, sm: u32, wp: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.warp_model(dev, sm, wp)?.valid)
    }

    fn warp_broken(&self, dev: u32, sm: u32, wp: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.warp_model(dev, sm, wp)?.broken)
    }

    fn lane_valid(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.lane_model(dev, sm, wp, ln)?.valid)
    }

    fn lane_active(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.lane_model(dev, sm, wp, ln)?.active)
    }

    fn lane_divergent(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<bool> {
        self.check_fault()?;
        Ok(self.lane_model(dev, sm, wp, ln)?.divergent)
    }

    fn warp_kernel(&self, dev: u32, sm: u32, wp: u32) -> Result<Option<KernelInfo>> {
        self.check_fault()?;
        let warp = self.warp_model(dev, sm, wp)?;
        if !warp.valid {
            return Err(Error::IdentityUnavailable);
        }
        Ok(warp.kernel)
    }

    fn warp_grid_id(&self, dev: u32, sm: u32, wp: u32) -> Result<GridId> {
        self.check_fault()?;
        let warp = self.warp_model(dev, sm, wp)?;
        if !warp.valid {
            return Err(Error::IdentityUnavailable);
        }
        Ok(warp.grid_id)
    }

    fn warp_cluster_idx(&self, dev: u32, sm: u32, wp: u32) -> Result<Dim3> {
        self.check_fault()?;
        let warp = self.warp_model(dev, sm, wp)?;
        if !warp.valid {
            return Err(Error::IdentityUnavailable);
        }
        Ok(warp.cluster_idx)
    }

    fn warp_block_idx(&self, dev: u32, sm: u32, wp: u32) -> Result<Dim3> {
        self.check_fault()?;
        let warp = self.warp_model(dev, sm, wp)?;
        if !warp.valid {
            return Err(Error::IdentityUnavailable);
        }
        Ok(warp.block_idx)
    }

    fn lane_thread_idx(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<Dim3> {
        self.check_fault()?;
        let lane = self.lane_model(dev, sm, wp, ln)?;
        if !lane.valid {
            return Err(Error::IdentityUnavailable);
        }
        Ok(lane.thread_idx)
    }

    fn lane_pc(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<VirtAddr> {
        self.check_fault()?;
        let lane = self.lane_model(dev, sm, wp, ln)?;
        if !lane.valid {
            return Err(Error::StateUnavailable);
        }
        Ok(lane.pc)
    }

    fn lane_exception(
        &self,
        dev: u32,
        sm: u32,
        wp: u32,
        ln: u32,
    ) -> Result<Option<LaneException>> {
        self.check_fault()?;
        Ok(self.lane_model(dev, sm, wp, ln)?.exception)
    }

    fn warp_timestamp(&self, dev: u32, sm: u32, wp: u32) -> Result<Option<StateClock>> {
        self.check_fault()?;
        Ok(self.warp_model(dev, sm, wp)?.timestamp)
    }

    fn lane_timestamp(&self, dev: u32, sm: u32, wp: u32, ln: u32) -> Result<Option<StateClock>> {
        self.check_fault()?;
        Ok(self.lane_model(dev, sm, wp, ln)?.timestamp)
    }

    fn clock(&self) -> Result<StateClock> {
        self.check_fault()?;
        Ok(self.clock)
    }

    fn code_address_space(&self) -> Result<Option<AddressSpaceId>> {
        self.check_fault()?;
        Ok(self.aspace)
    }

    fn breakpoint_at(&self, aspace: AddressSpaceId, pc: VirtAddr) -> Result<bool> {
        self.check_fault()?;
        if self.aspace != Some(aspace) {
            return Ok(false);
        }
        Ok(self.breakpoints.contains(&pc))
    }
}
