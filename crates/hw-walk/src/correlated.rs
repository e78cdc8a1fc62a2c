use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, spherical, Chain};
use crate::walker::Walker;

/// Unit-step walk in `d >= 2` dimensions whose direction drifts.
///
/// Each step stores `d - 1` standard normal numbers `g`. The hyperspherical
/// angles of step `i` are those of step `i - 1` plus `mu + sigma * g`, the
/// first step turns away from the zero angles.
pub struct CorrelatedWalker {
    chain: Chain<f64>,
    mu: f64,
    sigma: f64,
    random_numbers: Vec<f64>,
    undo: Option<(usize, Vec<f64>)>,
}

impl CorrelatedWalker {
    /// Builds a correlated walk with turning angle mean `mu` and spread `sigma`.
    pub fn new(
        d: usize,
        num_steps: usize,
        mu: f64,
        sigma: f64,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        if d < 2 {
            return Err(WalkError::Walker(
                ErrorInfo::new("walker-dimension", "correlated walks need at least two dimensions")
                    .with_context("dimension", d.to_string()),
            ));
        }
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            mu,
            sigma,
            random_numbers: Vec::new(),
            undo: None,
        };
        walker.reconstruct(rng)?;
        Ok(walker)
    }

    fn rebuild_steps(&mut self) {
        let k = self.chain.d - 1;
        let mut angles = vec![0.0; k];
        let mut steps = Vec::with_capacity(self.chain.num_steps);
        for block in self.random_numbers.chunks(k) {
            for (angle, g) in angles.iter_mut().zip(block) {
                *angle += self.mu + self.sigma * g;
            }
            steps.push(spherical(1.0, &angles));
        }
        self.chain.set_steps(steps);
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        self.rebuild_steps();
        self.chain.update_hull()
    }
}

impl Walker for CorrelatedWalker {
    delegate_chain!(Real);

    fn walk_type(&self) -> WalkType {
        WalkType::Correlated
    }

    fn random_numbers(&self) -> Vec<f64> {
        self.random_numbers.clone()
    }

    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError> {
        let expected = (self.chain.d - 1) * self.chain.num_steps;
        check_len(self.walk_type(), numbers, expected)?;
        self.random_numbers = numbers.to_vec();
        self.rebuild()
    }

    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        self.random_numbers = rng.gaussian_vec((self.chain.d - 1) * self.chain.num_steps);
        self.rebuild()
    }

    // Every later direction depends on the changed step.
    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError> {
        self.chain.begin_change();
        let k = self.chain.d - 1;
        let index = rng.below(self.chain.num_steps);
        let block = &mut self.random_numbers[index * k..(index + 1) * k];
        let old = block.to_vec();
        block.iter_mut().for_each(|g| *g = rng.gaussian(1.0));
        self.undo = Some((index, old));
        self.rebuild_steps();
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        if let Some((index, old)) = self.undo.take() {
            let k = old.len();
            self.random_numbers[index * k..(index + 1) * k].copy_from_slice(&old);
            self.rebuild_steps();
            self.chain.restore_hull();
        }
        Ok(())
    }
}
