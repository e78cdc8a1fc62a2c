//! Orientation predicates and small dense linear algebra on `f64` points.

use crate::step::Step;

/// z-component of `(a - o) x (b - o)`.
///
/// Positive if `o, a, b` make a counter-clockwise turn, negative for a
/// clockwise turn and zero if the points are collinear.
pub fn cross2d_z(o: &[f64], a: &[f64], b: &[f64]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Which side of the directed line `p1 -> p2` the point `p` lies on.
///
/// Positive for left, negative for right, zero on the line.
pub fn side2d(p1: &[f64], p2: &[f64], p: &[f64]) -> f64 {
    cross2d_z(p1, p2, p)
}

/// Which side of the plane through `p1, p2, p3` the point `p` lies on.
///
/// `p1, p2, p3` ordered counter-clockwise seen from the front: positive means
/// behind, negative in front, zero on the plane.
pub fn side3d(p1: &[f64], p2: &[f64], p3: &[f64], p: &[f64]) -> f64 {
    let c1 = [p2[0] - p1[0], p2[1] - p1[1], p2[2] - p1[2]];
    let c2 = [p3[0] - p1[0], p3[1] - p1[1], p3[2] - p1[2]];
    (p1[0] - p[0]) * (c1[1] * c2[2] - c1[2] * c2[1])
        + (p1[1] - p[1]) * (c1[2] * c2[0] - c1[0] * c2[2])
        + (p1[2] - p[2]) * (c1[0] * c2[1] - c1[1] * c2[0])
}

/// Orientation of the triple: `1` counter-clockwise, `-1` clockwise, `0` collinear.
pub fn orientation(o: &[f64], a: &[f64], b: &[f64]) -> i32 {
    let val = cross2d_z(o, a, b);
    if val > 0.0 {
        1
    } else if val < 0.0 {
        -1
    } else {
        0
    }
}

/// Convenience overload of [`cross2d_z`] for steps.
pub fn cross2d_z_steps(o: &Step<f64>, a: &Step<f64>, b: &Step<f64>) -> f64 {
    cross2d_z(o.coords(), a.coords(), b.coords())
}

/// Determinant of a square row-major matrix, via Gaussian elimination with partial pivoting.
pub fn determinant(mut rows: Vec<Vec<f64>>) -> f64 {
    let n = rows.len();
    if n == 0 {
        return 1.0;
    }
    let mut det = 1.0;
    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if rows[row][col].abs() > rows[pivot][col].abs() {
                pivot = row;
            }
        }
        if rows[pivot][col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            rows.swap(pivot, col);
            det = -det;
        }
        let diag = rows[col][col];
        det *= diag;
        for row in col + 1..n {
            let factor = rows[row][col] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                rows[row][k] -= factor * rows[col][k];
            }
        }
    }
    det
}

/// Cofactor normal of the hyperplane spanned by `d` points in `d` dimensions.
///
/// With `e_k = v_k - v_0` the normal satisfies `n . x = det[e_1 .. e_{d-1}, x]`,
/// so its length is `(d-1)!` times the `(d-1)`-volume of the simplex.
pub fn facet_normal(vertices: &[&[f64]]) -> Vec<f64> {
    let d = vertices.len();
    let origin = vertices[0];
    let edges: Vec<Vec<f64>> = vertices[1..]
        .iter()
        .map(|v| v.iter().zip(origin).map(|(a, b)| a - b).collect())
        .collect();
    let mut normal = Vec::with_capacity(d);
    for j in 0..d {
        let minor: Vec<Vec<f64>> = edges
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(k, _)| *k != j)
                    .map(|(_, v)| *v)
                    .collect()
            })
            .collect();
        let sign = if (d - 1 + j) % 2 == 0 { 1.0 } else { -1.0 };
        normal.push(sign * determinant(minor));
    }
    normal
}

/// `n!` as a float.
pub fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}
