use std::collections::HashMap;

use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{delegate_chain, Chain};
use crate::walker::Walker;

/// Lattice walk with chronological loop erasure.
///
/// Steps are taken as for a [`crate::LatticeWalker`]; whenever the walk
/// returns to a site already on the path, the loop is cut away. Random
/// numbers are consumed until the erased path has `N` steps, so the number
/// in use varies between walks. Numbers drawn beyond those in use are kept
/// and exported with the rest, so a restored walk continues identically.
pub struct LoopErasedWalker {
    chain: Chain<i64>,
    random_numbers: Vec<f64>,
    used: usize,
    undo: Option<(usize, f64, bool)>,
}

impl LoopErasedWalker {
    /// Builds a walk of `num_steps` erased steps in `d` dimensions.
    pub fn new(
        d: usize,
        num_steps: usize,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            random_numbers: rng.uniform_vec(num_steps),
            used: 0,
            undo: None,
        };
        walker.rebuild(Some(rng))?;
        walker.chain.update_hull()?;
        Ok(walker)
    }

    /// Replays the random numbers; draws more from `rng` when they run out.
    fn rebuild(&mut self, mut rng: Option<&mut RngHandle>) -> Result<(), WalkError> {
        let d = self.chain.d;
        let target = self.chain.num_steps + 1;
        let origin = Step::zeros(d);
        let mut path = vec![origin.clone()];
        let mut index: HashMap<Step<i64>, usize> = HashMap::from([(origin, 0)]);

        let mut i = 0;
        while path.len() < target {
            if i >= self.random_numbers.len() {
                let Some(rng) = rng.as_deref_mut() else {
                    return Err(WalkError::Walker(
                        ErrorInfo::new(
                            "walker-random-numbers-exhausted",
                            "loop-erased walk ran out of random numbers",
                        )
                        .with_context("available", self.random_numbers.len().to_string()),
                    ));
                };
                let extra = self.random_numbers.len().max(1);
                self.random_numbers.extend(rng.uniform_vec(extra));
            }
            let next = &path[path.len() - 1] + &Step::from_rn(d, self.random_numbers[i]);
            i += 1;
            match index.get(&next) {
                Some(&k) => {
                    for erased in path.drain(k + 1..) {
                        index.remove(&erased);
                    }
                }
                None => {
                    index.insert(next.clone(), path.len());
                    path.push(next);
                }
            }
        }
        self.used = i;

        let steps = path.windows(2).map(|w| &w[1] - &w[0]).collect();
        self.chain.set_steps(steps);
        Ok(())
    }
}

impl Walker for LoopErasedWalker {
    delegate_chain!(Lattice);

    fn walk_type(&self) -> WalkType {
        WalkType::LoopErased
    }

    fn random_numbers(&self) -> Vec<f64> {
        self.random_numbers.clone()
    }

    fn nrn(&self) -> usize {
        self.used
    }

    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError> {
        self.random_numbers = numbers.to_vec();
        self.rebuild(None)?;
        self.chain.update_hull()
    }

    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        self.random_numbers = rng.uniform_vec(self.chain.num_steps);
        self.rebuild(Some(rng))?;
        self.chain.update_hull()
    }

    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError> {
        self.chain.begin_change();
        let d = self.chain.d;
        let idx = rng.below(self.used);
        let old = self.random_numbers[idx];
        self.random_numbers[idx] = rng.uniform();

        let changed = Step::from_rn(d, old) != Step::from_rn(d, self.random_numbers[idx]);
        self.undo = Some((idx, old, changed));
        if !changed {
            return Ok(());
        }
        self.rebuild(Some(rng))?;
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        if let Some((idx, old, changed)) = self.undo.take() {
            self.random_numbers[idx] = old;
            if changed {
                self.rebuild(None)?;
                self.chain.restore_hull();
            }
        }
        Ok(())
    }
}
