use serde::{Deserialize, Serialize};
use tracing::debug;

use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, WalkError, WalkType};

use crate::correlated::CorrelatedWalker;
use crate::gaussian_resetting::GaussianResettingWalker;
use crate::lattice::LatticeWalker;
use crate::loop_erased::LoopErasedWalker;
use crate::off_lattice::{GaussianWalker, LevyWalker, RealWalker};
use crate::resetting::ResettingWalker;
use crate::returning::ReturningWalker;
use crate::self_avoiding::SelfAvoidingWalker;
use crate::true_self_avoiding::TrueSelfAvoidingWalker;
use crate::walker::Walker;

/// Parameters selecting and shaping a walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerParams {
    /// Walk model.
    #[serde(default = "default_walk_type", rename = "type")]
    pub walk_type: WalkType,
    /// Dimension `d`.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Number of steps `N`.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Hull construction algorithm.
    #[serde(default)]
    pub hull_algorithm: HullAlgorithm,
    /// Mean turning angle of correlated walks.
    #[serde(default)]
    pub mu: f64,
    /// Spread of the turning angle of correlated walks.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    /// Repulsion of true self-avoiding walks.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Reset probability per step of resetting walks.
    #[serde(default = "default_reset_rate")]
    pub reset_rate: f64,
    /// Start time `t1` of the sampled passage time.
    #[serde(default)]
    pub passage_start: usize,
}

fn default_walk_type() -> WalkType {
    WalkType::Lattice
}

fn default_dimension() -> usize {
    2
}

fn default_steps() -> usize {
    100
}

fn default_sigma() -> f64 {
    1.0
}

fn default_beta() -> f64 {
    1.0
}

fn default_reset_rate() -> f64 {
    0.1
}

impl Default for WalkerParams {
    fn default() -> Self {
        Self {
            walk_type: default_walk_type(),
            dimension: default_dimension(),
            steps: default_steps(),
            hull_algorithm: HullAlgorithm::default(),
            mu: 0.0,
            sigma: default_sigma(),
            beta: default_beta(),
            reset_rate: default_reset_rate(),
            passage_start: 0,
        }
    }
}

fn invalid(code: &str, message: impl Into<String>, params: &WalkerParams) -> WalkError {
    WalkError::Config(
        ErrorInfo::new(code, message)
            .with_context("type", params.walk_type.as_str())
            .with_context("dimension", params.dimension.to_string())
            .with_context("steps", params.steps.to_string()),
    )
}

impl WalkerParams {
    /// Checks the combination of walk type, dimension and length.
    pub fn validate(&self) -> Result<(), WalkError> {
        if self.dimension == 0 {
            return Err(invalid("invalid-dimension", "dimension must be at least 1", self));
        }
        if self.steps == 0 {
            return Err(invalid("invalid-steps", "a walk needs at least one step", self));
        }
        if self.walk_type == WalkType::Returning && self.steps % 2 != 0 {
            return Err(invalid(
                "odd-returning-steps",
                "returning walks need an even number of steps",
                self,
            ));
        }
        let needs_angles = matches!(
            self.walk_type,
            WalkType::Correlated | WalkType::Real | WalkType::Levy
        );
        if needs_angles && self.dimension < 2 {
            return Err(invalid(
                "invalid-dimension",
                format!("{} walks need at least two dimensions", self.walk_type),
                self,
            ));
        }
        if !(0.0..=1.0).contains(&self.reset_rate) {
            return Err(invalid("invalid-reset-rate", "reset rate must lie in [0, 1]", self));
        }
        Ok(())
    }
}

/// Validates `params` and builds a fresh walk from `rng`.
pub fn build_walker(
    params: &WalkerParams,
    rng: &mut RngHandle,
) -> Result<Box<dyn Walker>, WalkError> {
    params.validate()?;
    let WalkerParams {
        walk_type,
        dimension: d,
        steps: n,
        hull_algorithm: alg,
        ..
    } = *params;
    debug!(walk = %walk_type, d, n, hull = %alg, "building walker");

    let mut walker: Box<dyn Walker> = match walk_type {
        WalkType::Lattice => Box::new(LatticeWalker::new(d, n, alg, rng)?),
        WalkType::LoopErased => Box::new(LoopErasedWalker::new(d, n, alg, rng)?),
        WalkType::SelfAvoiding => Box::new(SelfAvoidingWalker::new(d, n, alg, rng)?),
        WalkType::Real => Box::new(RealWalker::new(d, n, alg, rng)?),
        WalkType::Gaussian => Box::new(GaussianWalker::new(d, n, alg, rng)?),
        WalkType::Levy => Box::new(LevyWalker::new(d, n, alg, rng)?),
        WalkType::Correlated => Box::new(CorrelatedWalker::new(
            d,
            n,
            params.mu,
            params.sigma,
            alg,
            rng,
        )?),
        WalkType::TrueSelfAvoiding => {
            Box::new(TrueSelfAvoidingWalker::new(d, n, params.beta, alg, rng)?)
        }
        WalkType::Resetting => {
            Box::new(ResettingWalker::new(d, n, params.reset_rate, alg, rng)?)
        }
        WalkType::Returning => Box::new(ReturningWalker::new(d, n, alg, rng)?),
        WalkType::GaussianResetting => Box::new(GaussianResettingWalker::new(
            d,
            n,
            params.reset_rate,
            alg,
            rng,
        )?),
    };
    walker.set_passage_start(params.passage_start);
    Ok(walker)
}

/// Rebuilds a stored walk from its random numbers.
pub fn restore_walker(
    params: &WalkerParams,
    random_numbers: &[f64],
) -> Result<Box<dyn Walker>, WalkError> {
    let mut rng = RngHandle::from_seed(0);
    let mut walker = build_walker(params, &mut rng)?;
    walker.set_random_numbers(random_numbers)?;
    Ok(walker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_fill_missing_fields() {
        let params: WalkerParams = serde_yaml::from_str("type: levy\nsteps: 40\n").unwrap();
        assert_eq!(params.walk_type, WalkType::Levy);
        assert_eq!(params.steps, 40);
        assert_eq!(params.dimension, 2);
        assert_eq!(params.hull_algorithm, HullAlgorithm::Incremental);
        assert_eq!(params.reset_rate, 0.1);
    }

    #[test]
    fn one_dimensional_real_walks_are_rejected() {
        let params = WalkerParams {
            walk_type: WalkType::Real,
            dimension: 1,
            ..WalkerParams::default()
        };
        assert_eq!(params.validate().unwrap_err().code(), "invalid-dimension");
    }
}
