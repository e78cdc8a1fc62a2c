use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, Chain};
use crate::walker::Walker;

/// Lattice walk that jumps back to the origin with probability `reset_rate`
/// before a step.
///
/// A number `rn < r` resets and then steps by `from_rn(rn / r)`, any other
/// number steps by `from_rn((rn - r) / (1 - r))`.
pub struct ResettingWalker {
    chain: Chain<i64>,
    reset_rate: f64,
    random_numbers: Vec<f64>,
    num_resets: usize,
    longest_streak: usize,
    undo: Option<(usize, f64)>,
}

pub(crate) fn check_reset_rate(reset_rate: f64) -> Result<(), WalkError> {
    if (0.0..=1.0).contains(&reset_rate) {
        return Ok(());
    }
    Err(WalkError::Walker(
        ErrorInfo::new("walker-reset-rate", "reset rate must lie in [0, 1]")
            .with_context("reset_rate", reset_rate.to_string()),
    ))
}

impl ResettingWalker {
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
            random_numbers: rng.uniform_vec(num_steps),
            num_resets: 0,
            longest_streak: 0,
            undo: None,
        };
        walker.rebuild()?;
        Ok(walker)
    }

    /// Probability of a reset before each step.
    pub fn reset_rate(&self) -> f64 {
        self.reset_rate
    }

    /// Changes the reset rate and rebuilds the walk.
    pub fn set_reset_rate(&mut self, reset_rate: f64) -> Result<(), WalkError> {
        check_reset_rate(reset_rate)?;
        if self.reset_rate == reset_rate {
            return Ok(());
        }
        self.reset_rate = reset_rate;
        self.rebuild()
    }

    fn rebuild_steps(&mut self) {
        let d = self.chain.d;
        let r = self.reset_rate;
        let mut position = Step::zeros(d);
        let mut steps = Vec::with_capacity(self.chain.num_steps);
        let mut streak = 1;
        self.num_resets = 0;
        self.longest_streak = 0;

        for rn in &self.random_numbers {
            let step = if *rn < r {
                self.num_resets += 1;
                streak = 1;
                &Step::from_rn(d, rn / r) - &position
            } else {
                streak += 1;
                Step::from_rn(d, (rn - r) / (1.0 - r))
            };
            position += &step;
            steps.push(step);
            self.longest_streak = self.longest_streak.max(streak);
        }
        self.chain.set_steps(steps);
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        self.rebuild_steps();
        self.chain.update_hull()
    }
}

impl Walker for ResettingWalker {
    delegate_chain!(Lattice);

    fn walk_type(&self) -> WalkType {
        WalkType::Resetting
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
        let idx = rng.below(self.chain.num_steps);
        self.undo = Some((idx, self.random_numbers[idx]));
        self.random_numbers[idx] = rng.uniform();
        self.rebuild_steps();
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        if let Some((idx, old)) = self.undo.take() {
            self.random_numbers[idx] = old;
            self.rebuild_steps();
            self.chain.restore_hull();
        }
        Ok(())
    }

    fn num_resets(&self) -> usize {
        self.num_resets
    }

    fn longest_streak(&self) -> usize {
        self.longest_streak
    }
}
