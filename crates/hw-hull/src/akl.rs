//! Akl-Toussaint heuristic: discard points strictly inside the polytope
//! spanned by the extreme points along a fixed set of directions.

use std::collections::BTreeSet;

use tracing::trace;

use crate::incremental;

/// Diagonal directions grow as `2^d`; above this they cost more than they save.
const MAX_DIAGONAL_DIMENSION: usize = 6;

pub(crate) fn prefilter(points: Vec<Vec<f64>>, d: usize) -> Vec<Vec<f64>> {
    if points.len() <= d + 1 {
        return points;
    }

    let extremes: BTreeSet<usize> = directions(d)
        .iter()
        .filter_map(|dir| {
            points
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.iter().zip(dir).map(|(x, y)| x * y).sum::<f64>()))
                .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
                    Some((_, b)) if b >= v => best,
                    _ => Some((i, v)),
                })
                .map(|(i, _)| i)
        })
        .collect();
    if extremes.len() <= d {
        return points;
    }

    let corners: Vec<Vec<f64>> = extremes.iter().map(|&i| points[i].clone()).collect();
    let (_, planes) = incremental::hull_with_planes(&corners, d);
    if planes.is_empty() {
        return points;
    }

    let eps = 1e-9
        * points
            .iter()
            .flat_map(|p| p.iter())
            .fold(1.0f64, |acc, x| acc.max(x.abs()));
    let total = points.len();
    let kept: Vec<Vec<f64>> = points
        .into_iter()
        .filter(|p| planes.iter().any(|plane| plane.distance(p) > -eps))
        .collect();
    trace!(total, kept = kept.len(), "akl prefilter");
    kept
}

fn directions(d: usize) -> Vec<Vec<f64>> {
    let mut dirs = Vec::new();
    for i in 0..d {
        for sign in [1.0, -1.0] {
            let mut dir = vec![0.0; d];
            dir[i] = sign;
            dirs.push(dir);
        }
    }
    if d <= MAX_DIAGONAL_DIMENSION {
        for mask in 0..(1usize << d) {
            dirs.push(
                (0..d)
                    .map(|i| if mask & (1 << i) == 0 { 1.0 } else { -1.0 })
                    .collect(),
            );
        }
    }
    dirs
}
