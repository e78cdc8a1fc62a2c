use hw_core::Step;
use hw_hull::ConvexHull;
use hw_walk::Walker;
use tracing::warn;

/// A point padded or cut to three axes.
pub type Point3 = [f64; 3];

/// Positions of a walk together with its hull, in at most three dimensions.
///
/// Walks in more than three dimensions are projected onto their first three
/// axes, missing axes are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Dimension of the walk before projection.
    pub dimension: usize,
    /// Positions in walk order, starting at the origin.
    pub walk: Vec<Point3>,
    /// Hull vertices; counter-clockwise in 2D.
    pub hull: Vec<Point3>,
    /// Facets as indices into `hull`, empty below three dimensions.
    pub facets: Vec<Vec<usize>>,
}

fn project(step: &Step<f64>) -> Point3 {
    let mut p = [0.0; 3];
    for (axis, value) in p.iter_mut().enumerate().take(step.d()) {
        *value = step.component(axis);
    }
    p
}

impl Scene {
    /// Captures the current state of a walker.
    pub fn from_walker(walker: &dyn Walker) -> Self {
        Self::from_parts(walker.dimension(), &walker.points().to_f64(), walker.hull())
    }

    /// Builds a scene from positions and a hull over them.
    pub fn from_parts(dimension: usize, points: &[Step<f64>], hull: &ConvexHull) -> Self {
        if dimension > 3 {
            warn!(dimension, "only the first three axes are rendered");
        }
        Self {
            dimension,
            walk: points.iter().map(project).collect(),
            hull: hull.vertices().iter().map(project).collect(),
            facets: hull.facets().to_vec(),
        }
    }

    /// True if the scene is drawn in the plane.
    pub fn is_planar(&self) -> bool {
        self.dimension <= 2
    }

    /// Componentwise minimum and maximum over the walk and the hull.
    pub fn bounds(&self) -> (Point3, Point3) {
        let mut lo = [0.0f64; 3];
        let mut hi = [0.0f64; 3];
        for p in self.walk.iter().chain(&self.hull) {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
        }
        (lo, hi)
    }

    /// Center of the bounding box and its largest edge, at least one.
    pub fn extent(&self) -> (Point3, f64) {
        let (lo, hi) = self.bounds();
        let center = [
            (lo[0] + hi[0]) / 2.0,
            (lo[1] + hi[1]) / 2.0,
            (lo[2] + hi[2]) / 2.0,
        ];
        let size = (0..3).map(|a| hi[a] - lo[a]).fold(1.0, f64::max);
        (center, size)
    }

    /// Hull facets split into triangles by a fan around their first vertex.
    pub fn triangles(&self) -> Vec<[Point3; 3]> {
        let mut triangles = Vec::new();
        for facet in &self.facets {
            let corners: Vec<Point3> = facet
                .iter()
                .filter_map(|&i| self.hull.get(i).copied())
                .collect();
            for k in 1..corners.len().saturating_sub(1) {
                triangles.push([corners[0], corners[k], corners[k + 1]]);
            }
        }
        triangles
    }

    /// Consecutive positions that differ, as segments.
    pub fn segments(&self) -> Vec<(Point3, Point3)> {
        self.walk
            .windows(2)
            .filter(|w| w[0] != w[1])
            .map(|w| (w[0], w[1]))
            .collect()
    }
}
