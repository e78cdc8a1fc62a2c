use hw_core::{HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, Chain};
use crate::resetting::check_reset_rate;
use crate::walker::Walker;

/// Gaussian walk that resets to the origin with probability `reset_rate`.
///
/// Each step owns `d + 1` random numbers: a uniform reset number followed by
/// `d` standard normal displacements. On a reset the step also carries the
/// jump `-position` back to the origin.
pub struct GaussianResettingWalker {
    chain: Chain<f64>,
    reset_rate: f64,
    random_numbers: Vec<f64>,
    undo: Option<(usize, Vec<f64>)>,
}

impl GaussianResettingWalker {
    /// Builds a walk resetting with probability `reset_rate` per step.
    pub fn new(
        d: usize,
        num_steps: usize,
        reset_rate: f64,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        check_reset_rate(reset_rate)?;
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            reset_rate,
            random_numbers: Vec::new(),
            undo: None,
        };
        walker.reconstruct(rng)?;
        Ok(walker)
    }

    fn stride(&self) -> usize {
        self.chain.d + 1
    }

    fn resets(&self) -> impl Iterator<Item = bool> + '_ {
        self.random_numbers
            .chunks(self.stride())
            .map(|block| block[0] < self.reset_rate)
    }

    fn rebuild_steps(&mut self) {
        let mut position = Step::zeros(self.chain.d);
        let mut steps = Vec::with_capacity(self.chain.num_steps);
        for block in self.random_numbers.chunks(self.stride()) {
            let mut step = Step::from_vec(block[1..].to_vec());
            if block[0] < self.reset_rate {
                step -= &position;
            }
            position += &step;
            steps.push(step);
        }
        self.chain.set_steps(steps);
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        self.rebuild_steps();
        self.chain.update_hull()
    }
}

impl Walker for GaussianResettingWalker {
    delegate_chain!(Real);

    fn walk_type(&self) -> WalkType {
        WalkType::GaussianResetting
    }

    fn random_numbers(&self) -> Vec<f64> {
        self.random_numbers.clone()
    }

    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError> {
        check_len(self.walk_type(), numbers, self.stride() * self.chain.num_steps)?;
        self.random_numbers = numbers.to_vec();
        self.rebuild()
    }

    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        let stride = self.stride();
        let mut numbers = rng.gaussian_vec(stride * self.chain.num_steps);
        for block in numbers.chunks_mut(stride) {
            block[0] = rng.uniform();
        }
        self.random_numbers = numbers;
        self.rebuild()
    }

    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError> {
        self.chain.begin_change();
        let stride = self.stride();
        let index = rng.below(self.chain.num_steps);
        let block = &mut self.random_numbers[index * stride..(index + 1) * stride];
        let old = block.to_vec();
        if rng.uniform() > 0.5 {
            block[0] = rng.uniform();
        } else {
            block[1..].iter_mut().for_each(|g| *g = rng.gaussian(1.0));
        }
        self.undo = Some((index, old));
        self.rebuild_steps();
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        if let Some((index, old)) = self.undo.take() {
            let stride = old.len();
            self.random_numbers[index * stride..(index + 1) * stride].copy_from_slice(&old);
            self.rebuild_steps();
            self.chain.restore_hull();
        }
        Ok(())
    }

    fn num_resets(&self) -> usize {
        self.resets().filter(|reset| *reset).count()
    }

    fn longest_streak(&self) -> usize {
        let mut longest = 0;
        let mut streak = 0;
        for reset in self.resets() {
            streak = if reset { 1 } else { streak + 1 };
            longest = longest.max(streak);
        }
        longest
    }
}
