#![deny(missing_docs)]

//! Random walk models whose state is a vector of random numbers.
//!
//! Every walk type implements [`Walker`]: the walk is rebuilt
//! deterministically from its random numbers, `change` perturbs a few of
//! them and `undo_change` reverts the last perturbation. Observables of the
//! walk and of its convex hull are provided as default trait methods.

mod chain;
/// Unit-step walks with correlated directions.
pub mod correlated;
/// Gaussian walks resetting to the origin.
pub mod gaussian_resetting;
/// Lattice random walks.
pub mod lattice;
/// Loop-erased lattice walks.
pub mod loop_erased;
/// Off-lattice walks with independent steps.
pub mod off_lattice;
/// Walker parameters and construction.
pub mod params;
/// Lattice walks resetting to the origin.
pub mod resetting;
/// Lattice walks returning to the origin.
pub mod returning;
/// Self-avoiding lattice walks.
pub mod self_avoiding;
/// True self-avoiding lattice walks.
pub mod true_self_avoiding;
/// The walker trait and observables.
pub mod walker;

pub use correlated::CorrelatedWalker;
pub use gaussian_resetting::GaussianResettingWalker;
pub use lattice::LatticeWalker;
pub use loop_erased::LoopErasedWalker;
pub use off_lattice::{GaussianWalker, LevyWalker, RealWalker};
pub use params::{build_walker, restore_walker, WalkerParams};
pub use resetting::ResettingWalker;
pub use returning::ReturningWalker;
pub use self_avoiding::SelfAvoidingWalker;
pub use true_self_avoiding::TrueSelfAvoidingWalker;
pub use walker::{Degenerate, Points, Walker, WalkerRecord, DEFAULT_STAGNATE};
