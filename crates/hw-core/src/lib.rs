#![deny(missing_docs)]
#![doc = "Core data types shared by the hullwalk crates: errors, deterministic randomness, steps and geometry."]

pub mod errors;
pub mod geometry;
pub mod labels;
pub mod rng;
pub mod step;

pub use errors::{ErrorInfo, WalkError};
pub use labels::{HullAlgorithm, Observable, SamplingMethod, WalkType};
pub use rng::{derive_substream_seed, RngHandle};
pub use step::{Coord, Step};
