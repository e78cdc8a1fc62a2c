use hw_core::{HullAlgorithm, Step, WalkError};
use proptest::prelude::*;

use hw_hull::ConvexHull;

const PLANAR: [HullAlgorithm; 6] = [
    HullAlgorithm::Incremental,
    HullAlgorithm::IncrementalAkl,
    HullAlgorithm::Andrew,
    HullAlgorithm::AndrewAkl,
    HullAlgorithm::Jarvis,
    HullAlgorithm::JarvisAkl,
];

fn lattice(points: &[(i64, i64)]) -> Vec<Step<i64>> {
    points
        .iter()
        .map(|(x, y)| Step::from_vec(vec![*x, *y]))
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

#[test]
fn unit_square_with_interior_points() {
    let points = lattice(&[(0, 0), (1, 0), (1, 1), (0, 1), (0, 0), (1, 1)]);
    for algorithm in PLANAR {
        let hull = ConvexHull::new(&points, algorithm).unwrap();
        assert!(close(hull.volume(), 1.0), "{algorithm}: {}", hull.volume());
        assert!(close(hull.surface(), 4.0), "{algorithm}: {}", hull.surface());
        assert_eq!(hull.num_vertices(), 4, "{algorithm}");
    }
}

#[test]
fn planar_vertices_are_counter_clockwise() {
    let points = lattice(&[(0, 0), (2, 0), (2, 1), (1, 3), (0, 1), (1, 1)]);
    for algorithm in PLANAR {
        let hull = ConvexHull::new(&points, algorithm).unwrap();
        let v = hull.vertices();
        let n = v.len();
        for k in 0..n {
            let turn = hw_core::geometry::cross2d_z(
                v[k].coords(),
                v[(k + 1) % n].coords(),
                v[(k + 2) % n].coords(),
            );
            assert!(turn > 0.0, "{algorithm} not counter-clockwise at {k}");
        }
        assert_eq!(v[0], Step::from_vec(vec![0.0, 0.0]));
    }
}

#[test]
fn collinear_points_have_twice_their_length_as_surface() {
    let points = lattice(&[(0, 0), (1, 0), (2, 0), (5, 0)]);
    for algorithm in PLANAR {
        let hull = ConvexHull::new(&points, algorithm).unwrap();
        assert_eq!(hull.volume(), 0.0);
        assert!(close(hull.surface(), 10.0), "{algorithm}: {}", hull.surface());
        assert_eq!(hull.num_vertices(), 2);
    }
}

#[test]
fn single_point_is_empty() {
    let points = lattice(&[(3, 4), (3, 4)]);
    for algorithm in PLANAR {
        let hull = ConvexHull::new(&points, algorithm).unwrap();
        assert_eq!(hull.volume(), 0.0);
        assert_eq!(hull.surface(), 0.0);
    }
}

#[test]
fn one_dimensional_hull_is_an_interval() {
    let points: Vec<Step<i64>> = [3, -2, 7, 0].iter().map(|x| Step::from_vec(vec![*x])).collect();
    let hull = ConvexHull::new(&points, HullAlgorithm::Incremental).unwrap();
    assert_eq!(hull.volume(), 9.0);
    assert_eq!(hull.surface(), 2.0);
    assert_eq!(hull.num_vertices(), 2);
}

#[test]
fn nop_skips_the_hull() {
    let points = lattice(&[(0, 0), (4, 0), (0, 4)]);
    let hull = ConvexHull::new(&points, HullAlgorithm::Nop).unwrap();
    assert_eq!(hull.volume(), 0.0);
    assert_eq!(hull.num_vertices(), 0);
}

#[test]
fn planar_algorithms_reject_three_dimensions() {
    let points = vec![Step::from_vec(vec![0i64, 0, 0]), Step::from_vec(vec![1, 1, 1])];
    for algorithm in [HullAlgorithm::Andrew, HullAlgorithm::JarvisAkl] {
        let err = ConvexHull::new(&points, algorithm).unwrap_err();
        match err {
            WalkError::Hull(info) => assert_eq!(info.code, "hull-dimension"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn tetrahedron_and_cube() {
    let tetra = vec![
        Step::from_vec(vec![0.0, 0.0, 0.0]),
        Step::from_vec(vec![1.0, 0.0, 0.0]),
        Step::from_vec(vec![0.0, 1.0, 0.0]),
        Step::from_vec(vec![0.0, 0.0, 1.0]),
    ];
    let hull = ConvexHull::new(&tetra, HullAlgorithm::Incremental).unwrap();
    assert!(close(hull.volume(), 1.0 / 6.0));
    assert!(close(hull.surface(), 1.5 + 3f64.sqrt() / 2.0));
    assert_eq!(hull.facets().len(), 4);

    let mut cube = Vec::new();
    for code in 0..8i64 {
        cube.push(Step::from_vec(vec![code & 1, (code >> 1) & 1, (code >> 2) & 1]));
    }
    for algorithm in [HullAlgorithm::Incremental, HullAlgorithm::IncrementalAkl] {
        let hull = ConvexHull::new(&cube, algorithm).unwrap();
        assert!(close(hull.volume(), 1.0));
        assert!(close(hull.surface(), 6.0));
        assert_eq!(hull.num_vertices(), 8);
    }
}

#[test]
fn four_dimensional_hypercube() {
    let mut points = Vec::new();
    for code in 0..16i64 {
        points.push(Step::from_vec((0..4).map(|i| 2 * ((code >> i) & 1)).collect()));
    }
    let hull = ConvexHull::new(&points, HullAlgorithm::Incremental).unwrap();
    assert!(close(hull.volume(), 16.0));
    // eight cubic cells of volume 8
    assert!(close(hull.surface(), 64.0));
}

#[test]
fn perimeter_exceeds_twice_the_diameter() {
    let points = lattice(&[(0, 0), (5, 1), (3, 4), (-1, 2)]);
    let hull = ConvexHull::new(&points, HullAlgorithm::Andrew).unwrap();
    assert!(hull.surface() > 2.0 * hull.max_diameter());
}

proptest! {
    #[test]
    fn planar_algorithms_agree(raw in prop::collection::vec((-20i64..20, -20i64..20), 1..60)) {
        let points = lattice(&raw);
        let reference = ConvexHull::new(&points, HullAlgorithm::Andrew).unwrap();
        for algorithm in PLANAR {
            let hull = ConvexHull::new(&points, algorithm).unwrap();
            prop_assert!(close(hull.volume(), reference.volume()), "{} area {} vs {}", algorithm, hull.volume(), reference.volume());
            prop_assert!(close(hull.surface(), reference.surface()), "{} perimeter {} vs {}", algorithm, hull.surface(), reference.surface());
            prop_assert_eq!(hull.num_vertices(), reference.num_vertices());
        }
    }

    #[test]
    fn akl_prefilter_keeps_the_hull_in_three_dimensions(
        raw in prop::collection::vec((-8i64..8, -8i64..8, -8i64..8), 4..50)
    ) {
        let points: Vec<Step<i64>> = raw.iter().map(|(x, y, z)| Step::from_vec(vec![*x, *y, *z])).collect();
        let plain = ConvexHull::new(&points, HullAlgorithm::Incremental).unwrap();
        let filtered = ConvexHull::new(&points, HullAlgorithm::IncrementalAkl).unwrap();
        prop_assert!(close(plain.volume(), filtered.volume()));
        prop_assert!(close(plain.surface(), filtered.surface()));
        prop_assert_eq!(plain.num_vertices(), filtered.num_vertices());
    }
}
