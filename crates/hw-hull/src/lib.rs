#![deny(missing_docs)]

//! Convex hulls of walk point sets in arbitrary dimension.
//!
//! [`ConvexHull::new`] dispatches on [`HullAlgorithm`]: the planar algorithms
//! (Andrew's monotone chain, Jarvis march) handle `d = 2`, the incremental
//! beneath-beyond construction handles every `d >= 2`, and `d = 1` is treated
//! as an interval. The `*-akl` variants drop points inside the polytope
//! spanned by the axis and diagonal extremes before building the hull.

mod akl;
/// Hull construction entry point and result type.
pub mod hull;
mod incremental;
mod planar;

pub use hull::ConvexHull;
pub use hw_core::HullAlgorithm;
