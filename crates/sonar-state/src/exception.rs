//! # Lane Exceptions
//!
//! Device exception codes a lane can report while stopped.

use core::fmt;

// =============================================================================
// LANE EXCEPTION
// =============================================================================

/// Exception reported by a single lane
///
/// The enumeration engine only cares about presence; the code itself is
/// surfaced to the host debugger for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LaneException {
    /// Load or store to an illegal address
    IllegalAddress,
    /// Load or store to a misaligned address
    MisalignedAddress,
    /// Illegal or unknown instruction
    IllegalInstruction,
    /// Access to an invalid address space
    InvalidAddressSpace,
    /// Device-side assertion fired
    WarpAssert,
    /// Uncorrectable hardware error
    HardwareError,
}

impl fmt::Display for LaneException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalAddress => write!(f, "illegal address"),
            Self::MisalignedAddress => write!(f, "misaligned address"),
            Self::IllegalInstruction => write!(f, "illegal instruction"),
            Self::InvalidAddressSpace => write!(f, "invalid address space"),
            Self::WarpAssert => write!(f, "device assertion failed"),
            Self::HardwareError => write!(f, "hardware error"),
        }
    }
}
