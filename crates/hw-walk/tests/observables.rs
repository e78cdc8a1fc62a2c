use hw_core::{HullAlgorithm, Observable, RngHandle, WalkError, WalkType};
use hw_walk::{build_walker, Degenerate, Walker, WalkerParams};

fn lattice(steps: usize, numbers: &[f64]) -> Box<dyn Walker> {
    let params = WalkerParams {
        walk_type: WalkType::Lattice,
        dimension: 2,
        steps,
        hull_algorithm: HullAlgorithm::Andrew,
        ..WalkerParams::default()
    };
    let mut walker = build_walker(&params, &mut RngHandle::from_seed(0)).unwrap();
    walker.set_random_numbers(numbers).unwrap();
    walker
}

// +x, +x, +y, -y
fn hook() -> Box<dyn Walker> {
    lattice(4, &[0.1, 0.1, 0.6, 0.9])
}

#[test]
fn end_to_end_observables() {
    let walker = hook();
    assert_eq!(walker.r(), 2.0);
    assert_eq!(walker.r2(), 4.0);
    assert_eq!(walker.rx(), -2.0);
    assert_eq!(walker.ry(), 0.0);
    assert_eq!(walker.length(), 4.0);
    assert_eq!(walker.steps_taken(), 4);
}

#[test]
fn extreme_x_positions() {
    let walker = hook();
    assert_eq!(walker.maxx(), 2.0);
    assert_eq!(walker.argmaxx(), 2);
    assert_eq!(walker.minx(), 0.0);
    assert_eq!(walker.argminx(), 0);
}

#[test]
fn hull_of_the_hook() {
    let walker = hook();
    assert!((walker.volume() - 1.0).abs() < 1e-12);
    assert!((walker.surface() - (3.0 + 5f64.sqrt())).abs() < 1e-12);
    assert_eq!(walker.num_on_hull(), 3);
    assert!((walker.max_diameter() - 5f64.sqrt()).abs() < 1e-12);
    assert_eq!(walker.observable(Observable::Volume), walker.volume());
    assert_eq!(walker.observable(Observable::Surface), walker.surface());
}

#[test]
fn visited_and_enclosed_sites() {
    let walker = hook();
    assert_eq!(walker.visited_sites(), Some(4));
    assert_eq!(walker.enclosed_sites(), Some(4));

    // a closed unit square encloses only its own corners
    let square = lattice(4, &[0.1, 0.6, 0.4, 0.9]);
    assert_eq!(square.visited_sites(), Some(4));
    assert_eq!(square.enclosed_sites(), Some(4));

    // a 3x3 ring of side two keeps its centre enclosed
    let ring = lattice(8, &[0.1, 0.1, 0.6, 0.6, 0.4, 0.4, 0.9, 0.9]);
    assert_eq!(ring.visited_sites(), Some(8));
    assert_eq!(ring.enclosed_sites(), Some(9));
}

#[test]
fn passage_through_the_origin() {
    // -x, +x, +x, +x
    let walker = lattice(4, &[0.4, 0.1, 0.1, 0.1]);
    assert_eq!(walker.passage(0, 0), Some(3));
    assert_eq!(walker.passage(3, 0), None);
    assert_eq!(walker.passage(4, 0), None);
    assert_eq!(walker.observable(Observable::Passage), 3.0);

    assert_eq!(hook().passage(0, 0), None);
    assert_eq!(hook().observable(Observable::Passage), -1.0);
}

#[test]
fn sampled_passage_starts_at_the_configured_time() {
    // x: 0, -1, 0, 1, 2
    let mut walker = lattice(4, &[0.4, 0.1, 0.1, 0.1]);
    assert_eq!(walker.passage_start(), 0);
    walker.set_passage_start(1);
    assert_eq!(walker.observable(Observable::Passage), 3.0);
    walker.set_passage_start(2);
    assert_eq!(walker.observable(Observable::Passage), -1.0);

    let params = WalkerParams {
        walk_type: WalkType::Lattice,
        dimension: 2,
        steps: 4,
        hull_algorithm: HullAlgorithm::Andrew,
        passage_start: 2,
        ..WalkerParams::default()
    };
    let mut built = build_walker(&params, &mut RngHandle::from_seed(0)).unwrap();
    built.set_random_numbers(&[0.4, 0.1, 0.1, 0.1]).unwrap();
    assert_eq!(built.passage_start(), 2);
    assert_eq!(built.observable(Observable::Passage), -1.0);
}

#[test]
fn correlation_reads_coordinates() {
    let walker = hook();
    assert_eq!(walker.correlation(&[0, 2, 3], 0).unwrap(), vec![0.0, 2.0, 2.0]);
    assert_eq!(walker.correlation(&[3], 1).unwrap(), vec![1.0]);
    match walker.correlation(&[1, 4], 0).unwrap_err() {
        WalkError::Walker(info) => {
            assert_eq!(info.code, "time-out-of-range");
            assert_eq!(info.context.get("t").map(String::as_str), Some("4"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn real_walks_have_no_site_counts() {
    let params = WalkerParams {
        walk_type: WalkType::Gaussian,
        ..WalkerParams::default()
    };
    let walker = build_walker(&params, &mut RngHandle::from_seed(3)).unwrap();
    assert_eq!(walker.visited_sites(), None);
    assert_eq!(walker.enclosed_sites(), None);
}

#[test]
fn lattice_degenerate_configurations() {
    let mut rng = RngHandle::from_seed(0);
    let mut walker = lattice(4, &[0.5; 4]);

    walker.degenerate(Degenerate::MaxVolume, &mut rng).unwrap();
    assert!((walker.volume() - 2.0).abs() < 1e-12);

    walker.degenerate(Degenerate::MinVolume, &mut rng).unwrap();
    assert_eq!(walker.volume(), 0.0);
    assert!((walker.surface() - 8.0).abs() < 1e-12);

    walker.degenerate(Degenerate::MinSurface, &mut rng).unwrap();
    assert!((walker.surface() - 2.0).abs() < 1e-12);

    walker.degenerate(Degenerate::MaxSurface, &mut rng).unwrap();
    assert!((walker.surface() - 8.0).abs() < 1e-12);
}

#[test]
fn downhill_reaches_extreme_real_walks() {
    let params = WalkerParams {
        walk_type: WalkType::Real,
        steps: 20,
        ..WalkerParams::default()
    };
    let mut rng = RngHandle::from_seed(5);
    let mut walker = build_walker(&params, &mut rng).unwrap();
    let random = walker.volume();

    walker.degenerate(Degenerate::MaxVolume, &mut rng).unwrap();
    let max = walker.volume();
    assert!(max > random);
    // half a disc of circumference 2N bounds the area
    assert!(max <= 400.0 / (2.0 * std::f64::consts::PI) + 1e-9);

    walker.degenerate(Degenerate::MinVolume, &mut rng).unwrap();
    assert!(walker.volume() < max);
}
