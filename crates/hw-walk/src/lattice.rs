use hw_core::{HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, Chain};
use crate::walker::Walker;

/// Simple random walk on the hypercubic lattice, one random number per step.
pub struct LatticeWalker {
    chain: Chain<i64>,
    random_numbers: Vec<f64>,
    undo: Option<(usize, f64, bool)>,
}

impl LatticeWalker {
    /// Builds a walk of `num_steps` steps in `d` dimensions.
    pub fn new(
        d: usize,
        num_steps: usize,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            random_numbers: rng.uniform_vec(num_steps),
            undo: None,
        };
        walker.rebuild()?;
        Ok(walker)
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        let d = self.chain.d;
        let steps = self
            .random_numbers
            .iter()
            .map(|rn| Step::from_rn(d, *rn))
            .collect();
        self.chain.set_steps(steps);
        self.chain.update_hull()
    }
}

impl Walker for LatticeWalker {
    delegate_chain!(Lattice);

    fn walk_type(&self) -> WalkType {
        WalkType::Lattice
    }

    fn random_numbers(&self) -> Vec<f64> {
        self.random_numbers.clone()
    }

    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError> {
        check_len(self.walk_type(), numbers, self.chain.num_steps)?;
        self.random_numbers = numbers.to_vec();
        self.rebuild()
    }

    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        self.random_numbers = rng.uniform_vec(self.chain.num_steps);
        self.rebuild()
    }

    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError> {
        self.chain.begin_change();
        let idx = rng.below(self.random_numbers.len());
        let old = self.random_numbers[idx];
        self.random_numbers[idx] = rng.uniform();

        let step = Step::from_rn(self.chain.d, self.random_numbers[idx]);
        let changed = step != self.chain.steps[idx];
        self.undo = Some((idx, old, changed));
        if !changed {
            return Ok(());
        }
        self.chain.set_step(idx, step);
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        if let Some((idx, old, changed)) = self.undo.take() {
            self.random_numbers[idx] = old;
            if changed {
                self.chain.set_step(idx, Step::from_rn(self.chain.d, old));
                self.chain.restore_hull();
            }
        }
        Ok(())
    }
}
