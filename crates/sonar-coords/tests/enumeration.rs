//! End-to-end enumeration tests against the mock device.

use sonar_coords::{
    CompareMode, CoordQuery, CoordSet, CoordSlot, Coords, Granularity, PhysicalCoords, SelectMask,
};
use sonar_core::{AddressSpaceId, BackendError, Dim3, Error, GridId, KernelId, StateClock, VirtAddr};
use sonar_state::{KernelInfo, KernelOrigin, LaneException, MockDevice};

fn kernel(id: u64, grid: u64) -> KernelInfo {
    KernelInfo::new(
        KernelId::new(id),
        GridId::new(grid),
        Dim3::new(4, 1, 1),
        Dim3::new(32, 1, 1),
        None,
        KernelOrigin::Host,
    )
}

/// One device, 2 SMs, 4 warps/SM, 8 lanes/warp; kernel 1 on SM 0 warps
/// 0-1 (blocks (0,0,0) and (1,0,0)), kernel 2 on SM 1 warp 0 (block
/// (0,0,0)). Every lane of a bound warp is valid+active with thread
/// indices (ln,0,0).
fn populated() -> MockDevice {
    let mut mock = MockDevice::new();
    mock.add_device(2, 4, 8);

    let bindings = [
        (0, 0, kernel(1, 10), Dim3::new(0, 0, 0)),
        (0, 1, kernel(1, 10), Dim3::new(1, 0, 0)),
        (1, 0, kernel(2, 20), Dim3::new(0, 0, 0)),
    ];
    for (sm, wp, k, block) in bindings {
        mock.bind_warp(0, sm, wp, k, block, Dim3::ZERO);
        for ln in 0..8 {
            mock.set_lane(0, sm, wp, ln, true, true);
            mock.set_lane_thread_idx(0, sm, wp, ln, Dim3::new(ln, 0, 0));
        }
    }
    mock
}

#[test]
fn end_to_end_single_valid_lane() {
    // The provider reports 1 device, 2 SMs, 4 warps/SM, 32 lanes/warp and
    // only (sm=1, warp=2, lane=5) is valid+active, with no kernel bound.
    let mut mock = MockDevice::new();
    mock.add_device(2, 4, 32);
    mock.set_warp_valid(0, 1, 2, true);
    mock.set_lane(0, 1, 2, 5, true, true);

    let query = CoordQuery {
        mask: SelectMask::VALID | SelectMask::ACTIVE,
        compare: CompareMode::Physical,
        ..CoordQuery::new(Granularity::Threads)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    assert_eq!(set.len(), 1);
    let coords = set.first().unwrap();
    assert_eq!(coords.physical, PhysicalCoords::exact(0, 1, 2, 5));
    // No kernel bound: the logical side is entirely non-concrete
    assert_eq!(coords.logical.kernel_id, CoordSlot::Invalid);
    assert_eq!(coords.logical.grid_id, CoordSlot::Invalid);
    assert_eq!(coords.logical.block_idx, CoordSlot::Invalid);
    assert_eq!(coords.logical.thread_idx, CoordSlot::Invalid);
}

#[test]
fn determinism() {
    let mock = populated();
    let query = CoordQuery {
        mask: SelectMask::VALID,
        ..CoordQuery::new(Granularity::Threads)
    };

    let first = CoordSet::build(&mock, &query).unwrap();
    let second = CoordSet::build(&mock, &query).unwrap();

    let a: Vec<&Coords> = first.iter().collect();
    let b: Vec<&Coords> = second.iter().collect();
    assert_eq!(a, b);
    assert_eq!(first.len(), 24); // 3 bound warps x 8 lanes
}

#[test]
fn granularity_collapse_at_sms() {
    let mock = populated();
    let query = CoordQuery {
        mask: SelectMask::VALID,
        ..CoordQuery::new(Granularity::Sms)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    // Two SMs run warps; exactly one representative each, warp and lane
    // wildcarded out
    assert_eq!(set.len(), 2);
    for coords in &set {
        assert!(coords.physical.sm.is_exact());
        assert!(coords.physical.wp.is_wildcard());
        assert!(coords.physical.ln.is_wildcard());
    }
}

#[test]
fn wildcard_filter_selects_all_valid_threads() {
    let mock = populated();
    let query = CoordQuery {
        mask: SelectMask::VALID,
        ..CoordQuery::new(Granularity::Threads)
    };
    let set = CoordSet::build(&mock, &query).unwrap();
    assert_eq!(set.len(), 24);

    // Narrowing the filter to one SM keeps only its warps' threads
    let query = CoordQuery {
        mask: SelectMask::VALID,
        filter: Coords {
            physical: PhysicalCoords {
                sm: CoordSlot::Exact(1),
                ..PhysicalCoords::wildcard()
            },
            ..Coords::wildcard()
        },
        ..CoordQuery::new(Granularity::Threads)
    };
    let set = CoordSet::build(&mock, &query).unwrap();
    assert_eq!(set.len(), 8);
}

#[test]
fn logical_filter_narrows_by_block() {
    let mock = populated();
    let query = CoordQuery {
        mask: SelectMask::VALID,
        filter: Coords {
            logical: sonar_coords::LogicalCoords {
                block_idx: CoordSlot::Exact(Dim3::new(1, 0, 0)),
                ..sonar_coords::LogicalCoords::wildcard()
            },
            ..Coords::wildcard()
        },
        ..CoordQuery::new(Granularity::Threads)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    // Only kernel 1's second block matches
    assert_eq!(set.len(), 8);
    for coords in &set {
        assert_eq!(coords.logical.kernel_id, CoordSlot::Exact(KernelId::new(1)));
        assert_eq!(coords.logical.block_idx, CoordSlot::Exact(Dim3::new(1, 0, 0)));
    }
}

#[test]
fn single_match_early_exit() {
    let mock = populated();

    let query = CoordQuery {
        mask: SelectMask::VALID | SelectMask::SINGLE,
        ..CoordQuery::new(Granularity::Threads)
    };
    let set = CoordSet::build(&mock, &query).unwrap();
    assert_eq!(set.len(), 1);

    // No matches at all: still empty, SINGLE changes nothing
    let query = CoordQuery {
        mask: SelectMask::VALID | SelectMask::SINGLE,
        filter: Coords {
            physical: PhysicalCoords {
                dev: CoordSlot::Exact(7),
                ..PhysicalCoords::wildcard()
            },
            ..Coords::wildcard()
        },
        ..CoordQuery::new(Granularity::Threads)
    };
    let set = CoordSet::build(&mock, &query).unwrap();
    assert!(set.is_empty());
}

#[test]
fn kernels_and_blocks_deduplicate() {
    let mock = populated();

    let set = CoordSet::build(
        &mock,
        &CoordQuery {
            mask: SelectMask::VALID,
            ..CoordQuery::new(Granularity::Kernels)
        },
    )
    .unwrap();
    // Kernel 1 spans two warps but appears once
    assert_eq!(set.len(), 2);

    let set = CoordSet::build(
        &mock,
        &CoordQuery {
            mask: SelectMask::VALID,
            ..CoordQuery::new(Granularity::Blocks)
        },
    )
    .unwrap();
    // (kernel 1, block 0), (kernel 1, block 1), (kernel 2, block 0)
    assert_eq!(set.len(), 3);
}

#[test]
fn logical_granularity_skips_invalid_warps() {
    let mut mock = MockDevice::new();
    mock.add_device(1, 2, 4);
    // Warp 0 bound and fully populated; warp 1 invalid but with lanes
    // marked valid (stale hardware readings)
    mock.bind_warp(0, 0, 0, kernel(1, 10), Dim3::ZERO, Dim3::ZERO);
    for ln in 0..4 {
        mock.set_lane(0, 0, 0, ln, true, true);
        mock.set_lane_thread_idx(0, 0, 0, ln, Dim3::new(ln, 0, 0));
        mock.set_lane(0, 0, 1, ln, true, true);
    }

    let set = CoordSet::build(
        &mock,
        &CoordQuery::new(Granularity::Threads),
    )
    .unwrap();
    // Only warp 0 contributes: logical identity requires a live binding
    assert_eq!(set.len(), 4);
    for coords in &set {
        assert_eq!(coords.physical.wp, CoordSlot::Exact(0));
    }
}

#[test]
fn breakpoint_predicate() {
    let mut mock = populated();
    let aspace = AddressSpaceId::new(1);
    mock.set_code_address_space(aspace);
    for ln in 0..8 {
        mock.set_lane_pc(0, 0, 0, ln, VirtAddr::new(0x1000 + 8 * ln as u64));
    }
    mock.plant_breakpoint(VirtAddr::new(0x1010)); // lane 2's pc

    let query = CoordQuery {
        mask: SelectMask::BREAKPOINT,
        compare: CompareMode::Physical,
        ..CoordQuery::new(Granularity::Lanes)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.first().unwrap().physical, PhysicalCoords::exact(0, 0, 0, 2));
}

#[test]
fn breakpoint_predicate_without_address_space() {
    let mut mock = populated();
    mock.plant_breakpoint(VirtAddr::new(0x1000));

    // No code address space resolved yet: nothing can be at a breakpoint
    let query = CoordQuery {
        mask: SelectMask::BREAKPOINT,
        ..CoordQuery::new(Granularity::Lanes)
    };
    assert!(CoordSet::build(&mock, &query).unwrap().is_empty());
}

#[test]
fn exception_predicates() {
    let mut mock = populated();
    mock.set_lane_exception(0, 1, 0, 3, Some(LaneException::IllegalAddress));

    let query = CoordQuery {
        mask: SelectMask::EXCEPTION,
        compare: CompareMode::Physical,
        ..CoordQuery::new(Granularity::Lanes)
    };
    let set = CoordSet::build(&mock, &query).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.first().unwrap().physical, PhysicalCoords::exact(0, 1, 0, 3));

    // SM-level exception query reports the excepting SM once
    let query = CoordQuery {
        mask: SelectMask::SM_EXCEPTION,
        ..CoordQuery::new(Granularity::Sms)
    };
    let set = CoordSet::build(&mock, &query).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.first().unwrap().physical.sm, CoordSlot::Exact(1));
}

#[test]
fn trap_predicate() {
    let mut mock = populated();
    mock.set_warp_broken(0, 0, 1, true);

    let query = CoordQuery {
        mask: SelectMask::TRAP,
        compare: CompareMode::Physical,
        ..CoordQuery::new(Granularity::Warps)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    assert_eq!(set.len(), 1);
    let coords = set.first().unwrap();
    assert_eq!(coords.physical.sm, CoordSlot::Exact(0));
    assert_eq!(coords.physical.wp, CoordSlot::Exact(1));
}

#[test]
fn stale_warps_filtered_by_current_clock() {
    let mut mock = populated();
    mock.set_clock(StateClock::new(5));
    mock.set_warp_timestamp(0, 0, 0, Some(StateClock::new(5))); // current
    mock.set_warp_timestamp(0, 0, 1, Some(StateClock::new(4))); // stale
    // SM 1 warp 0 keeps no timestamp: never considered stale

    let query = CoordQuery {
        mask: SelectMask::VALID | SelectMask::CURRENT_CLOCK,
        ..CoordQuery::new(Granularity::Warps)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    assert_eq!(set.len(), 2);
    for coords in &set {
        assert_ne!(
            (coords.physical.sm, coords.physical.wp),
            (CoordSlot::Exact(0), CoordSlot::Exact(1))
        );
    }
}

#[test]
fn origin_ordering_nearest_first() {
    let mut mock = MockDevice::new();
    mock.add_device(1, 1, 8);
    mock.bind_warp(0, 0, 0, kernel(1, 10), Dim3::ZERO, Dim3::ZERO);
    for ln in 0..8 {
        mock.set_lane(0, 0, 0, ln, true, true);
        mock.set_lane_thread_idx(0, 0, 0, ln, Dim3::new(ln, 0, 0));
    }

    let query = CoordQuery {
        mask: SelectMask::VALID,
        origin: Some(Coords::at_physical(0, 0, 0, 4)),
        ..CoordQuery::new(Granularity::Lanes)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    // Distance order from lane 4, raw order breaking exact ties
    let lanes: Vec<CoordSlot<u32>> = set.iter().map(|c| c.physical.ln).collect();
    let expected: Vec<CoordSlot<u32>> =
        [4u32, 3, 5, 2, 6, 1, 7, 0].map(CoordSlot::Exact).to_vec();
    assert_eq!(lanes, expected);
}

#[test]
fn provider_fault_aborts_build() {
    let mut mock = populated();
    mock.set_fault(Some(Error::Backend(BackendError::Disconnected)));

    let result = CoordSet::build(&mock, &CoordQuery::new(Granularity::Threads));
    assert_eq!(result.unwrap_err(), Error::Backend(BackendError::Disconnected));
}

#[test]
fn empty_mask_enumerates_filter_matches() {
    let mock = populated();

    // Physical granularity, no predicates: every lane of the filtered
    // warp is reported, valid or not
    let query = CoordQuery {
        filter: Coords {
            physical: PhysicalCoords {
                sm: CoordSlot::Exact(0),
                wp: CoordSlot::Exact(3), // unbound warp
                ..PhysicalCoords::wildcard()
            },
            ..Coords::wildcard()
        },
        ..CoordQuery::new(Granularity::Lanes)
    };
    let set = CoordSet::build(&mock, &query).unwrap();

    assert_eq!(set.len(), 8);
    for coords in &set {
        assert_eq!(coords.logical.kernel_id, CoordSlot::Invalid);
    }
}
