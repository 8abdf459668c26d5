//! # SONAR Error Handling
//!
//! Unified error type for the inspection stack.
//!
//! Error handling in SONAR follows these principles:
//! - Errors are typed and categorized by subsystem
//! - Absence of a result (no matching unit, no containing range) is *not*
//!   an error; it is an empty collection or `None`
//! - A fault in the debug backend aborts the operation that needed it and
//!   propagates to the caller; it is never downgraded to "no match"
//! - Errors are `no_std` compatible

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// SONAR Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// SONAR unified error type
///
/// Covers every error condition the inspection core can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,
    /// Resource not found
    NotFound,
    /// Operation not supported by this device or backend
    NotSupported,

    // =========================================================================
    // Device State Errors
    // =========================================================================
    /// No debug session is attached
    NotAttached,
    /// Device state snapshot is unavailable (device running or lost)
    StateUnavailable,
    /// A coordinate referenced a unit outside the device topology
    CoordinateOutOfRange,
    /// The unit's identity was queried while the owning unit is invalid
    IdentityUnavailable,

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Communication with the debug backend failed
    Backend(BackendError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Generic
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::NotFound => write!(f, "resource not found"),
            Self::NotSupported => write!(f, "operation not supported"),

            // Device state
            Self::NotAttached => write!(f, "no debug session attached"),
            Self::StateUnavailable => write!(f, "device state unavailable"),
            Self::CoordinateOutOfRange => write!(f, "coordinate outside device topology"),
            Self::IdentityUnavailable => write!(f, "logical identity unavailable"),

            // Backend
            Self::Backend(e) => write!(f, "backend error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

// =============================================================================
// SUB-ERROR TYPES
// =============================================================================

/// Debug backend communication errors
///
/// The backend is whatever transport answers state queries: a debug API
/// session on a live device or a loaded core dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// Backend connection lost
    Disconnected,
    /// Backend did not answer in time
    Timeout,
    /// Backend answered with a malformed payload
    MalformedResponse,
    /// Backend reported an internal error code
    Internal(u32),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "connection lost"),
            Self::Timeout => write!(f, "request timed out"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Internal(code) => write!(f, "internal error {:#x}", code),
        }
    }
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Error::Backend(e)
    }
}
