//! # SONAR Core
//!
//! Foundational types and error handling for the SONAR inspection stack.
//!
//! This crate provides the vocabulary shared by every other SONAR crate:
//! strongly typed identifiers for the logical launch hierarchy, device
//! virtual addresses, the state-refresh clock, and the unified error type.
//!
//! ## Design Principles
//!
//! 1. **Strong Typing**: kernel ids, grid ids, addresses, and clocks are
//!    distinct types that cannot be mixed by accident
//! 2. **Value Semantics**: everything here is a small `Copy` type
//! 3. **No I/O**: this crate never talks to a device; it only defines what
//!    the rest of the stack talks *about*

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod types;

// Re-exports for convenience
pub use error::{BackendError, Error, Result};
pub use types::*;
