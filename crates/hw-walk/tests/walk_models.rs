use hw_core::{HullAlgorithm, RngHandle, WalkError, WalkType};
use hw_walk::{build_walker, restore_walker, Walker, WalkerParams, WalkerRecord};
use proptest::prelude::*;

fn params(walk_type: WalkType, dimension: usize, steps: usize) -> WalkerParams {
    WalkerParams {
        walk_type,
        dimension,
        steps,
        hull_algorithm: HullAlgorithm::Incremental,
        ..WalkerParams::default()
    }
}

fn every_type(dimension: usize, steps: usize) -> Vec<WalkerParams> {
    WalkType::ALL
        .iter()
        .map(|walk_type| params(*walk_type, dimension, steps))
        .collect()
}

fn snapshot(walker: &dyn Walker) -> (Vec<f64>, f64, f64, Vec<Vec<f64>>) {
    let points = walker
        .points()
        .to_f64()
        .into_iter()
        .map(|p| p.coords().to_vec())
        .collect();
    (
        walker.random_numbers(),
        walker.volume(),
        walker.surface(),
        points,
    )
}

#[test]
fn same_seed_builds_the_same_walk() {
    for p in every_type(2, 24) {
        let a = build_walker(&p, &mut RngHandle::from_seed(7)).unwrap();
        let b = build_walker(&p, &mut RngHandle::from_seed(7)).unwrap();
        assert_eq!(snapshot(a.as_ref()), snapshot(b.as_ref()), "{}", p.walk_type);
    }
}

#[test]
fn walks_have_the_requested_shape() {
    for dimension in [2, 3] {
        for p in every_type(dimension, 16) {
            let walker = build_walker(&p, &mut RngHandle::from_seed(11)).unwrap();
            assert_eq!(walker.walk_type(), p.walk_type);
            assert_eq!(walker.dimension(), dimension);
            assert_eq!(walker.num_steps(), 16);
            assert_eq!(walker.points().len(), 17);
            assert_eq!(walker.points().is_lattice(), p.walk_type.is_lattice());
        }
    }
}

#[test]
fn undo_restores_walk_and_hull() {
    for p in every_type(2, 20) {
        let mut rng = RngHandle::from_seed(21);
        let mut walker = build_walker(&p, &mut rng).unwrap();
        for _ in 0..60 {
            let before = snapshot(walker.as_ref());
            walker.change(&mut rng, true).unwrap();
            walker.undo_change().unwrap();
            assert_eq!(snapshot(walker.as_ref()), before, "{}", p.walk_type);
        }
    }
}

#[test]
fn accepted_changes_keep_the_hull_current() {
    for p in every_type(3, 16) {
        let mut rng = RngHandle::from_seed(4);
        let mut walker = build_walker(&p, &mut rng).unwrap();
        for _ in 0..20 {
            walker.change(&mut rng, true).unwrap();
        }
        let (volume, surface) = (walker.volume(), walker.surface());
        walker.update_hull().unwrap();
        assert!((walker.volume() - volume).abs() < 1e-9, "{}", p.walk_type);
        assert!((walker.surface() - surface).abs() < 1e-9, "{}", p.walk_type);
    }
}

#[test]
fn restored_walks_match_their_source() {
    for p in every_type(2, 18) {
        let mut rng = RngHandle::from_seed(99);
        let mut walker = build_walker(&p, &mut rng).unwrap();
        for _ in 0..10 {
            walker.change(&mut rng, true).unwrap();
        }
        let record = WalkerRecord::from_bytes(&walker.serialize().unwrap()).unwrap();
        assert_eq!(record, walker.record());

        let restored = restore_walker(&p, &record.random_numbers).unwrap();
        assert_eq!(snapshot(restored.as_ref()), snapshot(walker.as_ref()), "{}", p.walk_type);
    }
}

#[test]
fn self_avoiding_walks_never_revisit() {
    let mut rng = RngHandle::from_seed(13);
    let mut walker = build_walker(&params(WalkType::SelfAvoiding, 2, 60), &mut rng).unwrap();
    for _ in 0..500 {
        walker.change(&mut rng, false).unwrap();
        assert_eq!(walker.visited_sites(), Some(61));
    }
}

#[test]
fn loop_erased_walks_never_revisit() {
    let mut rng = RngHandle::from_seed(17);
    let mut walker = build_walker(&params(WalkType::LoopErased, 3, 40), &mut rng).unwrap();
    for _ in 0..50 {
        walker.change(&mut rng, false).unwrap();
        assert_eq!(walker.visited_sites(), Some(41));
        assert!(walker.nrn() >= 40);
    }
}

#[test]
fn restored_walks_follow_the_same_changes() {
    for p in every_type(2, 40) {
        let mut rng = RngHandle::from_seed(29);
        let mut original = build_walker(&p, &mut rng).unwrap();
        for _ in 0..200 {
            original.change(&mut rng, true).unwrap();
        }
        let mut restored = restore_walker(&p, &original.random_numbers()).unwrap();
        assert_eq!(snapshot(restored.as_ref()), snapshot(original.as_ref()), "{}", p.walk_type);

        let mut rng_a = RngHandle::from_seed(31);
        let mut rng_b = RngHandle::from_seed(31);
        for i in 0..200 {
            original.change(&mut rng_a, true).unwrap();
            restored.change(&mut rng_b, true).unwrap();
            if i % 3 == 0 {
                original.undo_change().unwrap();
                restored.undo_change().unwrap();
            }
            assert_eq!(
                restored.random_numbers(),
                original.random_numbers(),
                "{} after change {i}",
                p.walk_type
            );
        }
        assert_eq!(snapshot(restored.as_ref()), snapshot(original.as_ref()), "{}", p.walk_type);
    }
}

#[test]
fn returning_walks_end_at_the_origin() {
    let mut rng = RngHandle::from_seed(23);
    let mut walker = build_walker(&params(WalkType::Returning, 3, 30), &mut rng).unwrap();
    for _ in 0..100 {
        walker.change(&mut rng, true).unwrap();
        assert_eq!(walker.r(), 0.0);
    }
}

#[test]
fn unit_step_walks_have_length_n() {
    for walk_type in [WalkType::Real, WalkType::Correlated, WalkType::Lattice] {
        let walker = build_walker(&params(walk_type, 3, 50), &mut RngHandle::from_seed(8)).unwrap();
        assert!((walker.length() - 50.0).abs() < 1e-9, "{walk_type}");
    }
}

#[test]
fn stored_state_of_wrong_length_is_rejected() {
    let mut walker =
        build_walker(&params(WalkType::Gaussian, 2, 10), &mut RngHandle::from_seed(1)).unwrap();
    let err = walker.set_random_numbers(&[0.5; 7]).unwrap_err();
    match err {
        WalkError::Walker(info) => assert_eq!(info.code, "walker-state-length"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invalid_parameters_are_config_errors() {
    let mut rng = RngHandle::from_seed(1);
    for (p, code) in [
        (params(WalkType::Returning, 2, 9), "odd-returning-steps"),
        (params(WalkType::Levy, 1, 10), "invalid-dimension"),
        (params(WalkType::Lattice, 2, 0), "invalid-steps"),
        (params(WalkType::Lattice, 0, 10), "invalid-dimension"),
    ] {
        match build_walker(&p, &mut rng) {
            Err(WalkError::Config(info)) => assert_eq!(info.code, code),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("{} accepted", p.walk_type),
        }
    }
}

#[test]
fn planar_hull_algorithms_need_two_dimensions() {
    let mut p = params(WalkType::Lattice, 3, 10);
    p.hull_algorithm = HullAlgorithm::Jarvis;
    let err = build_walker(&p, &mut RngHandle::from_seed(1)).err().unwrap();
    assert_eq!(err.code(), "hull-dimension");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn volume_matches_between_hull_algorithms(seed in any::<u64>(), steps in 3usize..60) {
        let p = params(WalkType::Lattice, 2, steps);
        let mut walker = build_walker(&p, &mut RngHandle::from_seed(seed)).unwrap();
        let reference = (walker.volume(), walker.surface(), walker.num_on_hull());
        for alg in [HullAlgorithm::Andrew, HullAlgorithm::JarvisAkl, HullAlgorithm::IncrementalAkl] {
            walker.set_hull_algorithm(alg).unwrap();
            prop_assert!((walker.volume() - reference.0).abs() < 1e-9);
            prop_assert!((walker.surface() - reference.1).abs() < 1e-9);
            prop_assert_eq!(walker.num_on_hull(), reference.2);
        }
    }
}
