use std::fs;

use hw_core::{HullAlgorithm, RngHandle, WalkError, WalkType};
use hw_vis::{render, render_scene, RenderFormat, Scene};
use hw_walk::{build_walker, Walker, WalkerParams};

fn walker(walk_type: WalkType, dimension: usize, steps: usize) -> Box<dyn Walker> {
    let params = WalkerParams {
        walk_type,
        dimension,
        steps,
        hull_algorithm: HullAlgorithm::Incremental,
        ..WalkerParams::default()
    };
    build_walker(&params, &mut RngHandle::from_seed(13)).unwrap()
}

#[test]
fn svg_draws_walk_and_hull() {
    let w = walker(WalkType::Lattice, 2, 50);
    let scene = Scene::from_walker(w.as_ref());
    let svg = render_scene(RenderFormat::Svg, &scene).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<polyline"));
    assert!(svg.contains("<polygon"));
    assert_eq!(svg.matches("<circle").count(), w.hull().num_vertices());
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn planar_gnuplot_closes_the_hull() {
    let w = walker(WalkType::Real, 2, 30);
    let scene = Scene::from_walker(w.as_ref());
    let script = render_scene(RenderFormat::Gnuplot, &scene).unwrap();
    assert!(script.contains("plot $walk"));
    assert!(!script.contains("splot"));
    let hull_block = script
        .split("$hull << EOD\n")
        .nth(1)
        .and_then(|rest| rest.split("EOD").next())
        .unwrap();
    let rows: Vec<&str> = hull_block.lines().collect();
    assert_eq!(rows.len(), w.hull().num_vertices() + 1);
    assert_eq!(rows.first(), rows.last());
}

#[test]
fn spatial_renderings_carry_facets() {
    let w = walker(WalkType::Gaussian, 3, 40);
    let scene = Scene::from_walker(w.as_ref());
    let triangles = scene.triangles().len();
    assert!(triangles >= 4);

    let script = render_scene(RenderFormat::Gnuplot, &scene).unwrap();
    assert!(script.contains("splot $walk"));

    let pov = render_scene(RenderFormat::Povray, &scene).unwrap();
    assert_eq!(pov.matches("triangle {").count(), triangles);
    assert_eq!(pov.matches("sphere {").count(), 41);

    let html = render_scene(RenderFormat::Threejs, &scene).unwrap();
    assert!(html.contains("var hullTriangles = ["));
    assert!(html.contains("THREE.Mesh"));
}

#[test]
fn render_writes_into_new_directories() {
    let dir = tempfile::tempdir().unwrap();
    let w = walker(WalkType::Lattice, 3, 20);
    for format in RenderFormat::ALL {
        let path = dir
            .path()
            .join("pictures")
            .join(format!("walk.{}", format.extension()));
        render(*format, w.as_ref(), &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}

#[test]
fn unwritable_target_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let w = walker(WalkType::Lattice, 2, 10);
    let err = render(RenderFormat::Svg, w.as_ref(), dir.path()).unwrap_err();
    assert!(matches!(err, WalkError::Serde(ref info) if info.code == "render-write"));
}
