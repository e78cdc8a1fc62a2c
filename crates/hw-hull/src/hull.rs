use serde::{Deserialize, Serialize};

use hw_core::{Coord, ErrorInfo, HullAlgorithm, Step, WalkError};

use crate::{akl, incremental, planar};

/// Measures and vertices of a hull, with vertices as indices into the input.
#[derive(Debug, Clone, Default)]
pub(crate) struct Geometry {
    pub volume: f64,
    pub surface: f64,
    pub vertex_ids: Vec<usize>,
    pub facets: Vec<Vec<usize>>,
}

/// Convex hull of a point set together with its volume and surface.
///
/// In two dimensions "volume" is the enclosed area and "surface" the
/// perimeter. Hulls of lower-dimensional point sets are flattened: a point
/// set spanning a hyperplane has zero volume and twice the hyperplane area as
/// surface, anything thinner has both measures zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexHull {
    dimension: usize,
    algorithm: HullAlgorithm,
    volume: f64,
    surface: f64,
    vertices: Vec<Step<f64>>,
    facets: Vec<Vec<usize>>,
}

impl ConvexHull {
    /// An empty hull with both measures zero.
    pub fn empty(dimension: usize, algorithm: HullAlgorithm) -> Self {
        Self {
            dimension,
            algorithm,
            volume: 0.0,
            surface: 0.0,
            vertices: Vec::new(),
            facets: Vec::new(),
        }
    }

    /// Builds the hull of `points` with the requested algorithm.
    ///
    /// Fails with `hull-dimension` when a planar-only algorithm is asked for
    /// a point set that does not live in two dimensions, and with
    /// `hull-mixed-dimension` when the points disagree on their dimension.
    pub fn new<T: Coord>(points: &[Step<T>], algorithm: HullAlgorithm) -> Result<Self, WalkError> {
        let Some(first) = points.first() else {
            return Ok(Self::empty(0, algorithm));
        };
        let d = first.d();
        if algorithm.planar_only() && d != 2 {
            return Err(WalkError::Hull(
                ErrorInfo::new(
                    "hull-dimension",
                    format!("{algorithm} only supports two dimensions"),
                )
                .with_context("dimension", d.to_string())
                .with_hint("use the incremental algorithm for d != 2"),
            ));
        }
        if points.iter().any(|p| p.d() != d) {
            return Err(WalkError::Hull(
                ErrorInfo::new("hull-mixed-dimension", "points differ in dimension")
                    .with_context("dimension", d.to_string()),
            ));
        }
        if algorithm == HullAlgorithm::Nop {
            return Ok(Self::empty(d, algorithm));
        }

        let mut coords: Vec<Vec<f64>> = points
            .iter()
            .map(|p| p.coords().iter().map(|c| c.to_f64()).collect())
            .collect();
        coords.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        coords.dedup();

        if d == 1 {
            return Ok(Self::interval(&coords, algorithm));
        }

        if algorithm.uses_akl() {
            coords = akl::prefilter(coords, d);
        }

        let geometry = match algorithm {
            HullAlgorithm::Andrew | HullAlgorithm::AndrewAkl => planar::andrew(&coords),
            HullAlgorithm::Jarvis | HullAlgorithm::JarvisAkl => planar::jarvis(&coords),
            _ => incremental::hull(&coords, d),
        };
        Ok(Self::from_geometry(d, algorithm, &coords, geometry))
    }

    fn interval(coords: &[Vec<f64>], algorithm: HullAlgorithm) -> Self {
        // coords are sorted, so the ends are the extremes
        let (Some(lo), Some(hi)) = (coords.first(), coords.last()) else {
            return Self::empty(1, algorithm);
        };
        let mut vertices = vec![Step::from_vec(lo.clone())];
        if hi != lo {
            vertices.push(Step::from_vec(hi.clone()));
        }
        Self {
            dimension: 1,
            algorithm,
            volume: hi[0] - lo[0],
            surface: 2.0,
            vertices,
            facets: Vec::new(),
        }
    }

    fn from_geometry(
        dimension: usize,
        algorithm: HullAlgorithm,
        coords: &[Vec<f64>],
        geometry: Geometry,
    ) -> Self {
        let vertices = geometry
            .vertex_ids
            .iter()
            .map(|&id| Step::from_vec(coords[id].clone()))
            .collect();
        let facets = if dimension >= 3 {
            geometry
                .facets
                .iter()
                .map(|facet| {
                    facet
                        .iter()
                        .filter_map(|id| geometry.vertex_ids.iter().position(|v| v == id))
                        .collect()
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            dimension,
            algorithm,
            volume: geometry.volume,
            surface: geometry.surface,
            vertices,
            facets,
        }
    }

    /// Dimension of the embedding space.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Algorithm the hull was built with.
    pub fn algorithm(&self) -> HullAlgorithm {
        self.algorithm
    }

    /// Enclosed `d`-volume (area in 2D).
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// `(d-1)`-volume of the boundary (perimeter in 2D).
    pub fn surface(&self) -> f64 {
        self.surface
    }

    /// Hull vertices; counter-clockwise and unclosed in 2D.
    pub fn vertices(&self) -> &[Step<f64>] {
        &self.vertices
    }

    /// Number of hull vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Facets as indices into [`ConvexHull::vertices`], only filled for `d >= 3`.
    pub fn facets(&self) -> &[Vec<usize>] {
        &self.facets
    }

    /// Largest Euclidean distance between two hull vertices.
    pub fn max_diameter(&self) -> f64 {
        let mut best = 0.0f64;
        for (i, a) in self.vertices.iter().enumerate() {
            for b in &self.vertices[i + 1..] {
                best = best.max(a.dist(b));
            }
        }
        best
    }
}
