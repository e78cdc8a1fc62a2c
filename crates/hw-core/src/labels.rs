//! Stable labels for walk types, hull algorithms, observables and samplers.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, WalkError};

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable kebab-case label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = WalkError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let known: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        WalkError::Config(
                            ErrorInfo::new(concat!("unknown-", $what), format!("unknown {} '{s}'", $what))
                                .with_hint(format!("expected one of: {}", known.join(", "))),
                        )
                    })
            }
        }
    };
}

labelled_enum! {
    /// Kind of random walk to sample.
    WalkType, "walk-type" {
        /// Simple random walk on the hypercubic lattice.
        Lattice => "lattice",
        /// Lattice walk with chronological loop erasure.
        LoopErased => "loop-erased",
        /// Self-avoiding lattice walk.
        SelfAvoiding => "self-avoiding",
        /// Off-lattice walk with unit steps in uniform directions.
        Real => "real",
        /// Off-lattice walk with gaussian displacements.
        Gaussian => "gaussian",
        /// Lévy flight with Cauchy distributed step lengths.
        Levy => "levy",
        /// Unit steps whose direction is correlated with the previous step.
        Correlated => "correlated",
        /// Lattice walk that avoids previously visited sites exponentially.
        TrueSelfAvoiding => "true-self-avoiding",
        /// Lattice walk resetting to the origin with a fixed rate.
        Resetting => "resetting",
        /// Lattice walk whose second half retraces the first back to the origin.
        Returning => "returning",
        /// Gaussian walk resetting to the origin with a fixed rate.
        GaussianResetting => "gaussian-resetting",
    }
}

impl WalkType {
    /// True for walks living on the integer lattice.
    pub fn is_lattice(&self) -> bool {
        matches!(
            self,
            WalkType::Lattice
                | WalkType::LoopErased
                | WalkType::SelfAvoiding
                | WalkType::TrueSelfAvoiding
                | WalkType::Resetting
                | WalkType::Returning
        )
    }
}

labelled_enum! {
    /// Convex hull construction algorithm.
    HullAlgorithm, "hull-algorithm" {
        /// Skip the hull, every observable derived from it is zero.
        Nop => "nop",
        /// Beneath-beyond incremental construction, any dimension.
        Incremental => "incremental",
        /// Incremental construction after Akl-Toussaint elimination.
        IncrementalAkl => "incremental-akl",
        /// Andrew's monotone chain (2D).
        Andrew => "andrew",
        /// Andrew's monotone chain after Akl-Toussaint elimination (2D).
        AndrewAkl => "andrew-akl",
        /// Jarvis march / gift wrapping (2D).
        Jarvis => "jarvis",
        /// Jarvis march after Akl-Toussaint elimination (2D).
        JarvisAkl => "jarvis-akl",
    }
}

impl HullAlgorithm {
    /// True if the algorithm applies the Akl-Toussaint prefilter.
    pub fn uses_akl(&self) -> bool {
        matches!(
            self,
            HullAlgorithm::IncrementalAkl | HullAlgorithm::AndrewAkl | HullAlgorithm::JarvisAkl
        )
    }

    /// True if the algorithm only works in the plane.
    pub fn planar_only(&self) -> bool {
        matches!(
            self,
            HullAlgorithm::Andrew
                | HullAlgorithm::AndrewAkl
                | HullAlgorithm::Jarvis
                | HullAlgorithm::JarvisAkl
        )
    }
}

impl Default for HullAlgorithm {
    fn default() -> Self {
        HullAlgorithm::Incremental
    }
}

labelled_enum! {
    /// Observable whose distribution is sampled.
    Observable, "observable" {
        /// Surface of the hull (perimeter in 2D).
        Surface => "surface",
        /// Volume of the hull (area in 2D).
        Volume => "volume",
        /// First passage time through the origin along the x axis.
        Passage => "passage",
    }
}

impl Default for Observable {
    fn default() -> Self {
        Observable::Surface
    }
}

labelled_enum! {
    /// Monte Carlo scheme used to sample the observable.
    SamplingMethod, "sampling-method" {
        /// Independent samples.
        Simple => "simple",
        /// Biased Metropolis chain at fixed temperature.
        Metropolis => "metropolis",
        /// Metropolis replicas at several temperatures with exchanges.
        ParallelTempering => "parallel-tempering",
        /// Wang-Landau flat histogram sampling.
        WangLandau => "wang-landau",
        /// 1/t Wang-Landau followed by entropic sampling.
        FastWangLandau => "fast-wang-landau",
    }
}

impl Default for SamplingMethod {
    fn default() -> Self {
        SamplingMethod::Metropolis
    }
}
