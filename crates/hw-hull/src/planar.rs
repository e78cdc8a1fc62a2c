//! Andrew's monotone chain and the Jarvis march for planar point sets.
//!
//! Both expect lexicographically sorted, deduplicated input and return the
//! hull counter-clockwise starting at the lexicographically smallest point,
//! smallest `x` first and smallest `y` among those.

use hw_core::geometry::cross2d_z;

use crate::hull::Geometry;

pub(crate) fn andrew(points: &[Vec<f64>]) -> Geometry {
    if points.len() < 3 {
        return polygon((0..points.len()).collect(), points);
    }

    let mut lower: Vec<usize> = Vec::with_capacity(points.len());
    for i in 0..points.len() {
        while lower.len() >= 2
            && cross2d_z(
                &points[lower[lower.len() - 2]],
                &points[lower[lower.len() - 1]],
                &points[i],
            ) <= 0.0
        {
            lower.pop();
        }
        lower.push(i);
    }

    let mut upper: Vec<usize> = Vec::with_capacity(points.len());
    for i in (0..points.len()).rev() {
        while upper.len() >= 2
            && cross2d_z(
                &points[upper[upper.len() - 2]],
                &points[upper[upper.len() - 1]],
                &points[i],
            ) <= 0.0
        {
            upper.pop();
        }
        upper.push(i);
    }

    // the last point of each chain is the first of the other one
    lower.pop();
    upper.pop();
    lower.extend(upper);
    polygon(lower, points)
}

pub(crate) fn jarvis(points: &[Vec<f64>]) -> Geometry {
    if points.len() < 3 {
        return polygon((0..points.len()).collect(), points);
    }

    let start = 0;
    let mut hull = Vec::new();
    let mut current = start;
    loop {
        hull.push(current);
        let mut candidate = if current == 0 { 1 } else { 0 };
        for i in 0..points.len() {
            if i == current || i == candidate {
                continue;
            }
            let turn = cross2d_z(&points[current], &points[candidate], &points[i]);
            if turn < 0.0 {
                candidate = i;
            } else if turn == 0.0 {
                let (c, q, r) = (&points[current], &points[candidate], &points[i]);
                let ahead = (q[0] - c[0]) * (r[0] - c[0]) + (q[1] - c[1]) * (r[1] - c[1]) > 0.0;
                if ahead && dist2(c, r) > dist2(c, q) {
                    candidate = i;
                }
            }
        }
        current = candidate;
        if current == start || hull.len() > points.len() {
            break;
        }
    }
    polygon(hull, points)
}

fn dist2(a: &[f64], b: &[f64]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Shoelace area and perimeter of the closed polygon through `ids`.
fn polygon(ids: Vec<usize>, points: &[Vec<f64>]) -> Geometry {
    let n = ids.len();
    let mut twice_area = 0.0;
    let mut perimeter = 0.0;
    if n >= 2 {
        for k in 0..n {
            let a = &points[ids[k]];
            let b = &points[ids[(k + 1) % n]];
            twice_area += a[0] * b[1] - b[0] * a[1];
            perimeter += dist2(a, b).sqrt();
        }
    }
    Geometry {
        volume: twice_area.abs() / 2.0,
        surface: perimeter,
        vertex_ids: ids,
        facets: Vec::new(),
    }
}
