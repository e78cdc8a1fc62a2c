use std::collections::HashMap;

use hw_core::{HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, Chain};
use crate::walker::Walker;

/// Lattice walk repelled by its own past.
///
/// The first step follows its random number directly. Afterwards a
/// neighbour visited `n` times is entered with weight `exp(-beta * n)`, the
/// random number picks from the cumulative weights. The origin counts as
/// visited once.
pub struct TrueSelfAvoidingWalker {
    chain: Chain<i64>,
    beta: f64,
    random_numbers: Vec<f64>,
    undo: Option<(usize, f64)>,
}

impl TrueSelfAvoidingWalker {
    /// Builds a walk with repulsion strength `beta`.
    pub fn new(
        d: usize,
        num_steps: usize,
        beta: f64,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            beta,
            random_numbers: rng.uniform_vec(num_steps),
            undo: None,
        };
        walker.rebuild()?;
        Ok(walker)
    }

    /// Repulsion strength.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Changes the repulsion strength and rebuilds the walk.
    pub fn set_beta(&mut self, beta: f64) -> Result<(), WalkError> {
        if self.beta == beta {
            return Ok(());
        }
        self.beta = beta;
        self.rebuild()
    }

    fn rebuild_steps(&mut self) {
        let d = self.chain.d;
        let mut visits: HashMap<Step<i64>, u32> = HashMap::new();
        let mut steps = Vec::with_capacity(self.chain.num_steps);
        let mut head = Step::zeros(d);
        let mut cumulative = Vec::with_capacity(2 * d);

        for (t, rn) in self.random_numbers.iter().enumerate() {
            *visits.entry(head.clone()).or_insert(0) += 1;
            let step = if t == 0 {
                Step::from_rn(d, *rn)
            } else {
                let neighbors = head.neighbors(false);
                cumulative.clear();
                let mut norm = 0.0;
                for n in &neighbors {
                    let seen = visits.get(n).copied().unwrap_or(0);
                    norm += (-self.beta * seen as f64).exp();
                    cumulative.push(norm);
                }
                let target = rn * norm;
                let idx = cumulative
                    .iter()
                    .position(|c| target <= *c)
                    .unwrap_or(neighbors.len() - 1);
                &neighbors[idx] - &head
            };
            head += &step;
            steps.push(step);
        }
        self.chain.set_steps(steps);
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        self.rebuild_steps();
        self.chain.update_hull()
    }
}

impl Walker for TrueSelfAvoidingWalker {
    delegate_chain!(Lattice);

    fn walk_type(&self) -> WalkType {
        WalkType::TrueSelfAvoiding
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
}
