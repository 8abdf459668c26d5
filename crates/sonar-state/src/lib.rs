//! # SONAR State
//!
//! The device state boundary: everything the enumeration engine needs to
//! know about a stopped accelerator, expressed as a capability trait.
//!
//! The trait is implemented externally — by a live debug-API session or a
//! loaded core dump. This crate also ships [`MockDevice`], a deterministic
//! in-memory implementation used by tests and host-side simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        sonar-state                           │
//! │  ┌────────────────┐  ┌────────────────┐  ┌───────────────┐   │
//! │  │ DeviceState    │  │ KernelInfo     │  │  MockDevice   │   │
//! │  │ Provider trait │  │ LaneException  │  │ (test device) │   │
//! │  └────────────────┘  └────────────────┘  └───────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod exception;
pub mod kernel;
pub mod mock;
pub mod provider;

// Re-exports for convenience
pub use exception::LaneException;
pub use kernel::{KernelInfo, KernelOrigin};
pub use mock::MockDevice;
pub use provider::DeviceStateProvider;
