//! Beneath-beyond convex hull in `d >= 2` dimensions.
//!
//! Facets are `(d-1)`-simplices stored as sorted vertex index lists together
//! with an outward unit normal. Points are inserted one at a time: every facet
//! the point sees is removed and the hole is closed with a cone from the point
//! to the horizon. Facets whose hyperplane contains the new point are removed
//! too, so coplanar points never produce degenerate facets and points lying
//! on the boundary are not reported as vertices.

use std::collections::{BTreeMap, BTreeSet};

use hw_core::geometry::{facet_normal, factorial};

use crate::hull::Geometry;

const REL_EPS: f64 = 1e-9;

/// Oriented supporting hyperplane `normal . x = offset` of a hull facet.
#[derive(Debug, Clone)]
pub(crate) struct Plane {
    normal: Vec<f64>,
    offset: f64,
}

impl Plane {
    /// Signed distance, positive outside the hull.
    pub(crate) fn distance(&self, p: &[f64]) -> f64 {
        dot(&self.normal, p) - self.offset
    }
}

struct Facet {
    vertices: Vec<usize>,
    plane: Plane,
    /// Length of the cofactor normal, `(d-1)!` times the facet area.
    measure: f64,
}

pub(crate) fn hull(points: &[Vec<f64>], d: usize) -> Geometry {
    hull_with_planes(points, d).0
}

/// Hull geometry plus the facet hyperplanes; no planes for degenerate input.
pub(crate) fn hull_with_planes(points: &[Vec<f64>], d: usize) -> (Geometry, Vec<Plane>) {
    match points.len() {
        0 => return (Geometry::default(), Vec::new()),
        1 => {
            let geometry = Geometry {
                vertex_ids: vec![0],
                ..Geometry::default()
            };
            return (geometry, Vec::new());
        }
        _ => {}
    }

    let eps = tolerance(points);
    let (simplex, basis) = affine_span(points, d, eps);
    let rank = basis.len();

    if rank == d {
        return beneath_beyond(points, d, &simplex, eps);
    }

    if rank + 1 == d {
        let origin = &points[simplex[0]];
        let projected: Vec<Vec<f64>> = points
            .iter()
            .map(|p| {
                let rel = sub(p, origin);
                basis.iter().map(|b| dot(&rel, b)).collect()
            })
            .collect();
        let geometry = if rank == 1 {
            let (mut lo, mut hi) = (0, 0);
            for (i, p) in projected.iter().enumerate() {
                if p[0] < projected[lo][0] {
                    lo = i;
                }
                if p[0] > projected[hi][0] {
                    hi = i;
                }
            }
            Geometry {
                volume: 0.0,
                surface: 2.0 * (projected[hi][0] - projected[lo][0]),
                vertex_ids: vec![lo, hi],
                facets: Vec::new(),
            }
        } else {
            let flat = hull(&projected, rank);
            Geometry {
                volume: 0.0,
                surface: 2.0 * flat.volume,
                vertex_ids: flat.vertex_ids,
                facets: Vec::new(),
            }
        };
        return (geometry, Vec::new());
    }

    let mut vertex_ids = simplex;
    vertex_ids.sort_unstable();
    let geometry = Geometry {
        vertex_ids,
        ..Geometry::default()
    };
    (geometry, Vec::new())
}

fn beneath_beyond(
    points: &[Vec<f64>],
    d: usize,
    simplex: &[usize],
    eps: f64,
) -> (Geometry, Vec<Plane>) {
    let mut interior = vec![0.0; d];
    for &id in simplex {
        for (c, x) in interior.iter_mut().zip(&points[id]) {
            *c += x / simplex.len() as f64;
        }
    }

    let mut facets: Vec<Facet> = Vec::new();
    for skip in 0..simplex.len() {
        let mut vertices: Vec<usize> = simplex
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != skip)
            .map(|(_, id)| *id)
            .collect();
        vertices.sort_unstable();
        if let Some(facet) = make_facet(points, vertices, &interior) {
            facets.push(facet);
        }
    }

    for (id, p) in points.iter().enumerate() {
        if simplex.contains(&id) || !facets.iter().any(|f| f.plane.distance(p) > eps) {
            continue;
        }

        let visible: Vec<bool> = facets
            .iter()
            .map(|f| f.plane.distance(p) > -eps)
            .collect();
        let mut ridges: BTreeMap<Vec<usize>, usize> = BTreeMap::new();
        for (facet, _) in facets.iter().zip(&visible).filter(|(_, v)| **v) {
            for skip in 0..facet.vertices.len() {
                let mut ridge = facet.vertices.clone();
                ridge.remove(skip);
                *ridges.entry(ridge).or_insert(0) += 1;
            }
        }

        let mut flags = visible.iter();
        facets.retain(|_| !flags.next().copied().unwrap_or(false));

        for (ridge, count) in ridges {
            if count != 1 {
                continue;
            }
            let mut vertices = ridge;
            vertices.push(id);
            vertices.sort_unstable();
            if let Some(facet) = make_facet(points, vertices, &interior) {
                facets.push(facet);
            }
        }
    }

    let mut volume = 0.0;
    let mut surface = 0.0;
    for facet in &facets {
        volume += facet.measure * (facet.plane.offset - dot(&facet.plane.normal, &interior));
        surface += facet.measure;
    }
    volume /= factorial(d);
    surface /= factorial(d - 1);

    let mut vertex_ids: Vec<usize> = facets
        .iter()
        .flat_map(|f| f.vertices.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if d == 2 {
        sort_counter_clockwise(&mut vertex_ids, points, &interior);
    }

    let planes = facets.iter().map(|f| f.plane.clone()).collect();
    let geometry = Geometry {
        volume,
        surface,
        vertex_ids,
        facets: facets.into_iter().map(|f| f.vertices).collect(),
    };
    (geometry, planes)
}

fn make_facet(points: &[Vec<f64>], vertices: Vec<usize>, interior: &[f64]) -> Option<Facet> {
    let corners: Vec<&[f64]> = vertices.iter().map(|&v| points[v].as_slice()).collect();
    let raw = facet_normal(&corners);
    let measure = dot(&raw, &raw).sqrt();
    if !(measure > 0.0) || !measure.is_finite() {
        return None;
    }
    let mut normal: Vec<f64> = raw.iter().map(|c| c / measure).collect();
    let mut offset = dot(&normal, corners[0]);
    if dot(&normal, interior) - offset > 0.0 {
        normal.iter_mut().for_each(|c| *c = -*c);
        offset = -offset;
    }
    Some(Facet {
        vertices,
        plane: Plane { normal, offset },
        measure,
    })
}

/// Greedy affine basis: start at the first point, then repeatedly add the
/// point farthest from the current affine span (Gram-Schmidt residual).
fn affine_span(points: &[Vec<f64>], d: usize, eps: f64) -> (Vec<usize>, Vec<Vec<f64>>) {
    let origin = &points[0];
    let mut chosen = vec![0];
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(d);
    while basis.len() < d {
        let mut best: Option<(usize, Vec<f64>, f64)> = None;
        for (i, p) in points.iter().enumerate() {
            let mut residual = sub(p, origin);
            for b in &basis {
                let proj = dot(&residual, b);
                residual.iter_mut().zip(b).for_each(|(r, x)| *r -= proj * x);
            }
            let len = dot(&residual, &residual).sqrt();
            if len > eps && best.as_ref().map_or(true, |(_, _, l)| len > *l) {
                best = Some((i, residual, len));
            }
        }
        let Some((i, residual, len)) = best else {
            break;
        };
        chosen.push(i);
        basis.push(residual.into_iter().map(|x| x / len).collect());
    }
    (chosen, basis)
}

fn sort_counter_clockwise(ids: &mut Vec<usize>, points: &[Vec<f64>], centre: &[f64]) {
    let angle = |id: usize| (points[id][1] - centre[1]).atan2(points[id][0] - centre[0]);
    ids.sort_by(|a, b| {
        angle(*a)
            .partial_cmp(&angle(*b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(first) = ids.iter().enumerate().min_by_key(|(_, id)| **id).map(|(k, _)| k) {
        ids.rotate_left(first);
    }
}

fn tolerance(points: &[Vec<f64>]) -> f64 {
    let scale = points
        .iter()
        .flat_map(|p| p.iter())
        .fold(1.0f64, |acc, x| acc.max(x.abs()));
    REL_EPS * scale
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Vec<Vec<f64>> {
        let mut pts = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    pts.push(vec![x as f64, y as f64, z as f64]);
                }
            }
        }
        pts.push(vec![0.5, 0.5, 0.5]);
        pts.push(vec![0.5, 0.0, 0.5]);
        pts
    }

    #[test]
    fn cube_volume_and_surface() {
        let g = hull(&unit_cube(), 3);
        assert!((g.volume - 1.0).abs() < 1e-9);
        assert!((g.surface - 6.0).abs() < 1e-9);
        assert_eq!(g.vertex_ids.len(), 8);
        assert_eq!(g.facets.len(), 12);
    }

    #[test]
    fn flat_point_set_reports_twice_its_area() {
        let pts = vec![
            vec![0.0, 0.0, 1.0],
            vec![2.0, 0.0, 1.0],
            vec![0.0, 2.0, 1.0],
            vec![2.0, 2.0, 1.0],
        ];
        let g = hull(&pts, 3);
        assert_eq!(g.volume, 0.0);
        assert!((g.surface - 8.0).abs() < 1e-9);
        assert_eq!(g.vertex_ids.len(), 4);
    }

    #[test]
    fn collinear_in_three_dimensions_is_empty() {
        let pts = vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0], vec![2.0, 2.0, 2.0]];
        let g = hull(&pts, 3);
        assert_eq!(g.volume, 0.0);
        assert_eq!(g.surface, 0.0);
    }

    #[test]
    fn square_vertices_start_at_smallest_x_then_y() {
        let pts = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let g = hull(&pts, 2);
        assert_eq!(g.vertex_ids, vec![0, 2, 3, 1]);
        assert!((g.volume - 1.0).abs() < 1e-12);
        assert!((g.surface - 4.0).abs() < 1e-12);
    }
}
