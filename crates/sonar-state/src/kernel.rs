//! # Kernel Launch Descriptor
//!
//! The coordinate-relevant subset of kernel bookkeeping: identity, launch
//! dimensions, and origin. Module/context bookkeeping stays with the host
//! debugger.

use core::fmt;

use alloc::string::String;

use sonar_core::{Dim3, GridId, KernelId};

// =============================================================================
// KERNEL ORIGIN
// =============================================================================

/// Where a kernel launch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KernelOrigin {
    /// Launched by the host
    #[default]
    Host,
    /// Launched by another kernel on the device
    Device,
}

// =============================================================================
// KERNEL INFO
// =============================================================================

/// Descriptor for a kernel currently resident on a device
///
/// The enumeration engine consumes `id` and the cluster extent; the
/// remaining fields serve the host debugger's printing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelInfo {
    /// Unique kernel id per debug session
    pub id: KernelId,
    /// Grid id, unique per device
    pub grid_id: GridId,
    /// Grid dimensions of the launch
    pub grid_dim: Dim3,
    /// Block dimensions of the launch
    pub block_dim: Dim3,
    /// Cluster dimensions, when the launch is clustered
    pub cluster_dim: Option<Dim3>,
    /// Launch origin
    pub origin: KernelOrigin,
}

impl KernelInfo {
    /// Create a new descriptor
    pub const fn new(
        id: KernelId,
        grid_id: GridId,
        grid_dim: Dim3,
        block_dim: Dim3,
        cluster_dim: Option<Dim3>,
        origin: KernelOrigin,
    ) -> Self {
        Self {
            id,
            grid_id,
            grid_dim,
            block_dim,
            cluster_dim,
            origin,
        }
    }

    /// True if the launch carries a usable cluster extent
    ///
    /// A cluster extent with any zero component means the launch is not
    /// clustered and per-warp cluster indices are untracked.
    #[inline]
    pub fn is_clustered(&self) -> bool {
        matches!(self.cluster_dim, Some(dim) if dim.is_extent())
    }

    /// Launch dimensions in `<<<(gx,gy,gz),(bx,by,bz)>>>` form
    pub fn dimensions(&self) -> String {
        use alloc::format;
        format!(
            "<<<({},{},{}),({},{},{})>>>",
            self.grid_dim.x,
            self.grid_dim.y,
            self.grid_dim.z,
            self.block_dim.x,
            self.block_dim.y,
            self.block_dim.z
        )
    }
}

impl fmt::Display for KernelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kernel {} {}", self.id, self.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KernelInfo {
        KernelInfo::new(
            KernelId::new(3),
            GridId::new(7),
            Dim3::new(16, 8, 1),
            Dim3::new(32, 4, 1),
            None,
            KernelOrigin::Host,
        )
    }

    #[test]
    fn test_dimensions_format() {
        assert_eq!(sample().dimensions(), "<<<(16,8,1),(32,4,1)>>>");
    }

    #[test]
    fn test_clustered() {
        let mut k = sample();
        assert!(!k.is_clustered());

        k.cluster_dim = Some(Dim3::new(2, 1, 1));
        assert!(k.is_clustered());

        // A zero component means the extent is unusable
        k.cluster_dim = Some(Dim3::new(2, 0, 1));
        assert!(!k.is_clustered());
    }
}
