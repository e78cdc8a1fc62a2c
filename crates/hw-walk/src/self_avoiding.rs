use std::collections::HashSet;

use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{check_len, delegate_chain, Chain};
use crate::walker::Walker;

/// Walks up to this length are generated naively during dimerisation.
const DIMERIZATION_THRESHOLD: usize = 10;

/// Probability that a change is a pivot instead of a single-step change.
const PIVOT_PROBABILITY: f64 = 0.2;

/// Lattice symmetry `y_i = sign_i * x_{perm_i}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symmetry {
    perm: Vec<usize>,
    signs: Vec<i64>,
}

impl Symmetry {
    /// Uniformly random signed permutation other than the identity.
    pub fn random(d: usize, rng: &mut RngHandle) -> Self {
        loop {
            let mut perm: Vec<usize> = (0..d).collect();
            for i in (1..d).rev() {
                perm.swap(i, rng.below(i + 1));
            }
            let signs = (0..d)
                .map(|_| if rng.uniform() < 0.5 { 1 } else { -1 })
                .collect();
            let symmetry = Self { perm, signs };
            if !symmetry.is_identity() {
                return symmetry;
            }
        }
    }

    fn is_identity(&self) -> bool {
        self.perm.iter().enumerate().all(|(i, p)| i == *p) && self.signs.iter().all(|s| *s == 1)
    }

    /// Applies the symmetry to a step.
    pub fn apply(&self, step: &Step<i64>) -> Step<i64> {
        Step::from_vec(
            self.perm
                .iter()
                .zip(&self.signs)
                .map(|(p, s)| s * step[*p])
                .collect(),
        )
    }

    /// The symmetry undoing this one.
    pub fn inverse(&self) -> Self {
        let d = self.perm.len();
        let mut perm = vec![0; d];
        let mut signs = vec![1; d];
        for (i, p) in self.perm.iter().enumerate() {
            perm[*p] = i;
            signs[*p] = self.signs[i];
        }
        Self { perm, signs }
    }
}

enum Undo {
    Pivot { index: usize, inverse: Symmetry },
    Step { index: usize, old: Step<i64> },
}

/// Self-avoiding walk on the hypercubic lattice.
///
/// Fresh walks come from dimerisation. Changes are pivots (a lattice
/// symmetry applied to the tail after a random site) or single-step
/// replacements; moves that would overlap are rejected on the spot. The
/// steps are the state, [`Walker::random_numbers`] encodes them through
/// [`Step::read_to_rn`].
pub struct SelfAvoidingWalker {
    chain: Chain<i64>,
    undo: Option<Undo>,
}

impl SelfAvoidingWalker {
    /// Builds a dimerised walk of `num_steps` steps in `d` dimensions.
    pub fn new(
        d: usize,
        num_steps: usize,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            undo: None,
        };
        walker.chain.set_steps(dimerize(d, num_steps, rng));
        walker.chain.update_hull()?;
        Ok(walker)
    }

    /// Tests whether pivoting the tail from `index` on keeps the walk self-avoiding.
    ///
    /// Walks outward from the pivot site in both directions at once, the
    /// collision is usually found close to the pivot.
    fn pivot_is_free(&self, index: usize, symmetry: &Symmetry) -> bool {
        let steps = &self.chain.steps;
        let n = steps.len();
        let mut occupied = HashSet::with_capacity(n + 1);
        let mut back = Step::zeros(self.chain.d);
        let mut front = Step::zeros(self.chain.d);
        occupied.insert(back.clone());

        let (mut i, mut j) = (index, index);
        while i > 0 || j < n {
            if i > 0 {
                i -= 1;
                back -= &steps[i];
                if !occupied.insert(back.clone()) {
                    return false;
                }
            }
            if j < n {
                front += &symmetry.apply(&steps[j]);
                j += 1;
                if !occupied.insert(front.clone()) {
                    return false;
                }
            }
        }
        true
    }

    fn apply_pivot(&mut self, index: usize, symmetry: &Symmetry) {
        for step in &mut self.chain.steps[index..] {
            *step = symmetry.apply(step);
        }
        self.chain.update_points(index + 1);
    }
}

fn overlap_free(steps: &[Step<i64>], d: usize) -> bool {
    let mut position = Step::zeros(d);
    let mut occupied = HashSet::with_capacity(steps.len() + 1);
    occupied.insert(position.clone());
    steps.iter().all(|s| {
        position += s;
        occupied.insert(position.clone())
    })
}

/// Dimerisation: glue two independent halves until the result is self-avoiding.
fn dimerize(d: usize, n: usize, rng: &mut RngHandle) -> Vec<Step<i64>> {
    if n <= DIMERIZATION_THRESHOLD {
        loop {
            let mut steps: Vec<Step<i64>> = Vec::with_capacity(n);
            while steps.len() < n {
                let step = Step::from_rn(d, rng.uniform());
                if steps.last().map_or(true, |last| step != -last) {
                    steps.push(step);
                }
            }
            if overlap_free(&steps, d) {
                return steps;
            }
        }
    }
    loop {
        let mut steps = dimerize(d, n / 2, rng);
        steps.extend(dimerize(d, n - n / 2, rng));
        if overlap_free(&steps, d) {
            return steps;
        }
    }
}

impl Walker for SelfAvoidingWalker {
    delegate_chain!(Lattice);

    fn walk_type(&self) -> WalkType {
        WalkType::SelfAvoiding
    }

    fn random_numbers(&self) -> Vec<f64> {
        self.chain.steps.iter().map(Step::read_to_rn).collect()
    }

    fn nrn(&self) -> usize {
        self.chain.num_steps
    }

    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError> {
        check_len(self.walk_type(), numbers, self.chain.num_steps)?;
        let d = self.chain.d;
        let steps: Vec<Step<i64>> = numbers.iter().map(|rn| Step::from_rn(d, *rn)).collect();
        if !overlap_free(&steps, d) {
            return Err(WalkError::Walker(
                ErrorInfo::new("walker-self-overlap", "random numbers describe an overlapping walk")
                    .with_hint("self-avoiding walks only accept overlap-free configurations"),
            ));
        }
        self.chain.set_steps(steps);
        self.chain.update_hull()
    }

    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        let steps = dimerize(self.chain.d, self.chain.num_steps, rng);
        self.chain.set_steps(steps);
        self.chain.update_hull()
    }

    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError> {
        self.chain.begin_change();
        self.undo = None;
        let n = self.chain.num_steps;
        let index = rng.below(n);

        if rng.uniform() < PIVOT_PROBABILITY {
            let symmetry = Symmetry::random(self.chain.d, rng);
            if !self.pivot_is_free(index, &symmetry) {
                return Ok(());
            }
            self.apply_pivot(index, &symmetry);
            self.undo = Some(Undo::Pivot {
                index,
                inverse: symmetry.inverse(),
            });
        } else {
            let step = Step::from_rn(self.chain.d, rng.uniform());
            if step == self.chain.steps[index] {
                return Ok(());
            }
            let old = std::mem::replace(&mut self.chain.steps[index], step);
            self.chain.update_points(index + 1);
            let mut occupied = HashSet::with_capacity(n + 1);
            if !self.chain.points.iter().all(|p| occupied.insert(p)) {
                self.chain.set_step(index, old);
                return Ok(());
            }
            self.undo = Some(Undo::Step { index, old });
        }
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        match self.undo.take() {
            Some(Undo::Pivot { index, inverse }) => {
                self.apply_pivot(index, &inverse);
                self.chain.restore_hull();
            }
            Some(Undo::Step { index, old }) => {
                self.chain.set_step(index, old);
                self.chain.restore_hull();
            }
            None => {}
        }
        Ok(())
    }
}
