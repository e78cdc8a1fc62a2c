use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, Chain};
use crate::walker::Walker;

/// Lattice walk of even length that ends where it started.
///
/// The first `N/2` random numbers encode the outward steps. The other
/// `N/2` are sort keys: the way back takes the negated outward steps in the
/// order of ascending keys, so the walk returns to the origin.
pub struct ReturningWalker {
    chain: Chain<i64>,
    random_numbers: Vec<f64>,
    undo: Option<Undo>,
}

enum Undo {
    Redraw { index: usize, old: f64, changed: bool },
    Swap { a: usize, b: usize },
}

impl ReturningWalker {
    /// Builds a walk of `num_steps` steps; `num_steps` must be even.
    pub fn new(
        d: usize,
        num_steps: usize,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        if num_steps % 2 != 0 {
            return Err(WalkError::Walker(
                ErrorInfo::new("walker-odd-length", "returning walks need an even number of steps")
                    .with_context("num_steps", num_steps.to_string())
                    .with_hint("use an even number of steps"),
            ));
        }
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            random_numbers: rng.uniform_vec(num_steps),
            undo: None,
        };
        walker.rebuild()?;
        Ok(walker)
    }

    fn half(&self) -> usize {
        self.chain.num_steps / 2
    }

    /// Order in which the outward steps are retraced.
    fn return_order(&self) -> Vec<usize> {
        let keys = &self.random_numbers[self.half()..];
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|a, b| keys[*a].total_cmp(&keys[*b]));
        order
    }

    fn rebuild_steps(&mut self) {
        let d = self.chain.d;
        let half = self.half();
        let mut steps: Vec<Step<i64>> = self.random_numbers[..half]
            .iter()
            .map(|rn| Step::from_rn(d, *rn))
            .collect();
        for i in self.return_order() {
            let back = -&steps[i];
            steps.push(back);
        }
        self.chain.set_steps(steps);
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        self.rebuild_steps();
        self.chain.update_hull()
    }
}

impl Walker for ReturningWalker {
    delegate_chain!(Lattice);

    fn walk_type(&self) -> WalkType {
        WalkType::Returning
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
        let half = self.half();
        if rng.uniform() < 0.5 {
            let index = rng.below(half);
            let old = self.random_numbers[index];
            self.random_numbers[index] = rng.uniform();
            let changed =
                Step::from_rn(self.chain.d, self.random_numbers[index]) != self.chain.steps[index];
            self.undo = Some(Undo::Redraw { index, old, changed });
            if !changed {
                return Ok(());
            }
        } else {
            let a = half + rng.below(half);
            let b = half + rng.below(half);
            self.random_numbers.swap(a, b);
            self.undo = Some(Undo::Swap { a, b });
        }
        self.rebuild_steps();
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        match self.undo.take() {
            Some(Undo::Redraw { index, old, changed }) => {
                self.random_numbers[index] = old;
                if !changed {
                    return Ok(());
                }
            }
            Some(Undo::Swap { a, b }) => self.random_numbers.swap(a, b),
            None => return Ok(()),
        }
        self.rebuild_steps();
        self.chain.restore_hull();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::Points;

    #[test]
    fn keys_order_the_way_back() {
        let mut rng = RngHandle::from_seed(2);
        let mut walker = ReturningWalker::new(2, 4, HullAlgorithm::Andrew, &mut rng).unwrap();
        // out: +x, +y; keys put the second step first on the way back
        walker.set_random_numbers(&[0.1, 0.6, 0.9, 0.2]).unwrap();
        let Points::Lattice(points) = walker.points() else {
            unreachable!()
        };
        assert_eq!(points[2], Step::from_vec(vec![1, 1]));
        assert_eq!(points[3], Step::from_vec(vec![1, 0]));
        assert_eq!(points[4], Step::zeros(2));
    }

    #[test]
    fn odd_lengths_are_rejected() {
        let mut rng = RngHandle::from_seed(2);
        let err = ReturningWalker::new(2, 5, HullAlgorithm::Andrew, &mut rng)
            .err()
            .unwrap();
        assert_eq!(err.code(), "walker-odd-length");
    }
}
