//! Integration tests exercising the full subdivision pipeline through the
//! public API: domain → seed grid → refinement steps → active-box export.

use std::sync::Arc;

use subdiv_core::{
    Activeness, BoxGrid, Domain, DynamicalSystem, FnSystem, Interval, MapError, StepReport,
    SubdivisionDriver, SubdivisionEngine, SubdivisionError, SubdivisionObserver,
    flat_index_to_position, position_to_flat_index, run_subdivision, sample_interior_points,
    subdivide,
};

fn henon() -> FnSystem<impl Fn(&[f64]) -> Vec<f64> + Sync> {
    FnSystem::new(2, |p: &[f64]| {
        vec![1.0 - 1.4 * p[0] * p[0] + p[1], 0.3 * p[0]]
    })
}

fn henon_domain() -> Domain {
    Domain::new(vec![Interval::new(-1.5, 1.5), Interval::new(-0.4, 0.4)]).unwrap()
}

/// Test 1: box count of a fresh grid is (2^d)^dimension for every depth.
#[test]
fn fresh_grid_box_count() {
    for dim in 1..=3 {
        let domain = Arc::new(Domain::cube(dim, -1.0, 1.0).unwrap());
        for depth in 0..5u32 {
            let grid = BoxGrid::new(domain.clone(), depth, Activeness::AllInactive).unwrap();
            assert_eq!(grid.box_count(), (1usize << depth).pow(dim as u32));
        }
    }
}

/// Test 2: every flat index of a 3-D grid decodes and re-encodes to itself.
#[test]
fn index_round_trip_across_resolutions() {
    for r in [1, 2, 8, 16] {
        for index in 0..r * r * r {
            let pos = flat_index_to_position(index, r, 3);
            assert_eq!(position_to_flat_index(&pos, r), index);
        }
    }
}

/// Test 3: identity map on the unit square keeps all 256 boxes at depth 4.
#[test]
fn identity_map_preserves_coverage() {
    let domain = Arc::new(Domain::cube(2, 0.0, 1.0).unwrap());
    let grid = BoxGrid::new(domain, 3, Activeness::AllActive).unwrap();
    assert_eq!(grid.active_count(), 64);
    let identity = FnSystem::new(2, |p: &[f64]| p.to_vec());
    let next = subdivide(&grid, &identity).unwrap();
    assert_eq!(next.depth(), 4);
    assert_eq!(next.resolution(), 16);
    assert_eq!(next.active_count(), 256);
}

/// Test 4: shifting the lower half of [0, 1] by 0.5 lands only in the upper
/// half; shifting by 1.5 leaves nothing.
#[test]
fn boundary_discard_on_unit_interval() {
    let domain = Arc::new(Domain::new(vec![Interval::new(0.0, 1.0)]).unwrap());
    let seed = BoxGrid::with_active(domain, 1, [[0]]).unwrap();
    assert_eq!(seed.box_borders(&[0]), vec![Interval::new(0.0, 0.5)]);

    let half = FnSystem::new(1, |p: &[f64]| vec![p[0] + 0.5]);
    let next = subdivide(&seed, &half).unwrap();
    for b in next.active_boxes() {
        assert!(b.borders[0].min >= 0.5, "unexpected active box {:?}", b.borders);
    }
    assert!(next.active_count() > 0);

    let away = FnSystem::new(1, |p: &[f64]| vec![p[0] + 1.5]);
    let next = subdivide(&seed, &away).unwrap();
    assert_eq!(next.active_count(), 0);
}

/// Test 5: run to depth 5 takes exactly two steps and ends at resolution 32.
#[test]
fn run_to_depth_five_takes_two_steps() {
    struct Count(usize);
    impl SubdivisionObserver for Count {
        fn on_step_end(&mut self, _report: &StepReport) {
            self.0 += 1;
        }
    }

    let mut count = Count(0);
    let grid = SubdivisionDriver::default()
        .run_observed(&henon(), henon_domain(), 5, &mut count)
        .unwrap();
    assert_eq!(count.0, 2);
    assert_eq!(grid.depth(), 5);
    assert_eq!(grid.resolution(), 32);
}

/// Test 6: the Hénon covering contracts relative to the domain and still
/// reaches the fixed point that lies on the attractor.
#[test]
fn henon_attractor_covering_contracts() {
    let grid = run_subdivision(&henon(), henon_domain(), 8).unwrap();
    let summary = grid.summary();
    assert!(summary.active_count > 0);
    assert!(
        summary.covered_volume < 0.25 * henon_domain().volume(),
        "covering did not contract: {summary:?}"
    );

    // x* solves x = 1 - 1.4 x^2 + 0.3 x; y* = 0.3 x*.
    let x_star = (-0.7 + (0.49f64 + 5.6).sqrt()) / 2.8;
    let fixed = [x_star, 0.3 * x_star];
    let near = grid.active_boxes().any(|b| {
        b.borders.iter().zip(fixed).all(|(iv, v)| {
            let slack = 2.0 * iv.width();
            v >= iv.min - slack && v <= iv.max + slack
        })
    });
    assert!(near, "no active box near the fixed point {fixed:?}");
}

/// Test 7: a failing map aborts the run with its error attached.
#[test]
fn map_failure_is_fatal() {
    struct Diverges;
    impl DynamicalSystem for Diverges {
        fn dimension(&self) -> usize {
            2
        }
        fn map_point(&self, point: &[f64]) -> Result<Vec<f64>, MapError> {
            if point[0] > 0.9 {
                Err(MapError::new("step size underflow"))
            } else {
                Ok(point.to_vec())
            }
        }
    }

    let err = run_subdivision(&Diverges, Domain::cube(2, 0.0, 1.0).unwrap(), 4).unwrap_err();
    match err {
        SubdivisionError::Map(e) => assert_eq!(e.message(), "step size underflow"),
        other => panic!("unexpected error: {other}"),
    }
}

/// Test 8: invalid configuration is rejected before any grid is built.
#[test]
fn configuration_errors() {
    assert!(Domain::new(vec![Interval::new(1.0, 1.0)]).is_err());
    assert!(matches!(
        run_subdivision(&henon(), henon_domain(), 1),
        Err(SubdivisionError::TargetBelowSeed { .. })
    ));
}

/// Test 9: sequential and parallel engines produce identical grids at depth.
#[test]
fn sequential_and_parallel_agree() {
    let seq = SubdivisionDriver::new(SubdivisionEngine::new().with_parallel(false))
        .run(&henon(), henon_domain(), 7)
        .unwrap();
    let par = SubdivisionDriver::new(SubdivisionEngine::new().with_parallel(true))
        .run(&henon(), henon_domain(), 7)
        .unwrap();
    let a: Vec<_> = seq.active_boxes().map(|b| b.index).collect();
    let b: Vec<_> = par.active_boxes().map(|b| b.index).collect();
    assert_eq!(a, b);
}

/// Test 10: test points of a 2-D box are 25 distinct interior points.
#[test]
fn default_sample_lattice() {
    let borders = [Interval::new(0.0, 1.0), Interval::new(-2.0, 2.0)];
    let points = sample_interior_points(&borders, 5);
    assert_eq!(points.len(), 25);
    for p in &points {
        assert!(p[0] > 0.0 && p[0] < 1.0);
        assert!(p[1] > -2.0 && p[1] < 2.0);
    }
}

/// Test 11: active boxes serialize into a renderer-friendly JSON shape.
#[test]
fn active_boxes_serialize() {
    let domain = Arc::new(Domain::cube(2, 0.0, 1.0).unwrap());
    let grid = BoxGrid::with_active(domain, 1, [[1, 1]]).unwrap();
    let boxes: Vec<_> = grid.active_boxes().collect();
    let json = serde_json::to_value(&boxes).unwrap();
    assert_eq!(json[0]["position"], serde_json::json!([1, 1]));
    assert_eq!(json[0]["borders"][0]["min"], serde_json::json!(0.5));
    assert_eq!(json[0]["borders"][1]["max"], serde_json::json!(1.0));
}
