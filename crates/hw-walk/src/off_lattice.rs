use std::marker::PhantomData;

use hw_core::{ErrorInfo, HullAlgorithm, RngHandle, Step, WalkError, WalkType};

use crate::chain::{angles_from_uniform, check_len, delegate_chain, spherical, Chain};
use crate::walker::Walker;

/// Distribution of a single off-lattice step, drawn from a fixed-size block
/// of random numbers.
pub trait StepLaw: Send + 'static {
    /// Walk type reported by walkers using this law.
    const WALK_TYPE: WalkType;

    /// Random numbers per step.
    fn numbers_per_step(d: usize) -> usize;

    /// Fills `block` with fresh random numbers.
    fn draw(rng: &mut RngHandle, block: &mut [f64]);

    /// The step encoded by `block`.
    fn step(d: usize, block: &[f64]) -> Step<f64>;
}

/// Unit steps in uniformly drawn hyperspherical directions.
pub struct UnitSphere;

impl StepLaw for UnitSphere {
    const WALK_TYPE: WalkType = WalkType::Real;

    fn numbers_per_step(d: usize) -> usize {
        d - 1
    }

    fn draw(rng: &mut RngHandle, block: &mut [f64]) {
        block.iter_mut().for_each(|x| *x = rng.uniform());
    }

    fn step(_d: usize, block: &[f64]) -> Step<f64> {
        spherical(1.0, &angles_from_uniform(block))
    }
}

/// Independent standard normal displacement in every direction.
pub struct Gaussian;

impl StepLaw for Gaussian {
    const WALK_TYPE: WalkType = WalkType::Gaussian;

    fn numbers_per_step(d: usize) -> usize {
        d
    }

    fn draw(rng: &mut RngHandle, block: &mut [f64]) {
        block.iter_mut().for_each(|x| *x = rng.gaussian(1.0));
    }

    fn step(_d: usize, block: &[f64]) -> Step<f64> {
        Step::from_vec(block.to_vec())
    }
}

/// Cauchy distributed length, uniform direction. The first number of a
/// block is the length, the remaining `d - 1` the angles.
pub struct CauchyFlight;

impl StepLaw for CauchyFlight {
    const WALK_TYPE: WalkType = WalkType::Levy;

    fn numbers_per_step(d: usize) -> usize {
        d
    }

    fn draw(rng: &mut RngHandle, block: &mut [f64]) {
        block[0] = rng.cauchy(1.0).abs();
        block[1..].iter_mut().for_each(|x| *x = rng.uniform());
    }

    fn step(_d: usize, block: &[f64]) -> Step<f64> {
        spherical(block[0], &angles_from_uniform(&block[1..]))
    }
}

/// Off-lattice walk whose steps are independent draws of a [`StepLaw`].
pub struct OffLatticeWalker<L: StepLaw> {
    chain: Chain<f64>,
    random_numbers: Vec<f64>,
    undo: Option<(usize, Vec<f64>)>,
    law: PhantomData<L>,
}

/// Unit steps in uniform directions.
pub type RealWalker = OffLatticeWalker<UnitSphere>;
/// Gaussian displacements.
pub type GaussianWalker = OffLatticeWalker<Gaussian>;
/// Lévy flight with Cauchy step lengths.
pub type LevyWalker = OffLatticeWalker<CauchyFlight>;

impl<L: StepLaw> OffLatticeWalker<L> {
    /// Builds a walk of `num_steps` steps in `d >= 2` dimensions.
    pub fn new(
        d: usize,
        num_steps: usize,
        algorithm: HullAlgorithm,
        rng: &mut RngHandle,
    ) -> Result<Self, WalkError> {
        if d == 0 || L::numbers_per_step(d) == 0 {
            return Err(WalkError::Walker(
                ErrorInfo::new("walker-dimension", format!("{} walks need more dimensions", L::WALK_TYPE))
                    .with_context("dimension", d.to_string()),
            ));
        }
        let mut walker = Self {
            chain: Chain::new(d, num_steps, algorithm),
            random_numbers: vec![0.0; L::numbers_per_step(d) * num_steps],
            undo: None,
            law: PhantomData,
        };
        walker.reconstruct(rng)?;
        Ok(walker)
    }

    fn block(&self, index: usize) -> &[f64] {
        let k = L::numbers_per_step(self.chain.d);
        &self.random_numbers[index * k..(index + 1) * k]
    }

    fn rebuild(&mut self) -> Result<(), WalkError> {
        let d = self.chain.d;
        let steps = (0..self.chain.num_steps)
            .map(|i| L::step(d, self.block(i)))
            .collect();
        self.chain.set_steps(steps);
        self.chain.update_hull()
    }
}

impl<L: StepLaw> Walker for OffLatticeWalker<L> {
    delegate_chain!(Real);

    fn walk_type(&self) -> WalkType {
        L::WALK_TYPE
    }

    fn random_numbers(&self) -> Vec<f64> {
        self.random_numbers.clone()
    }

    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError> {
        check_len(self.walk_type(), numbers, self.random_numbers.len())?;
        self.random_numbers = numbers.to_vec();
        self.rebuild()
    }

    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        let k = L::numbers_per_step(self.chain.d);
        for block in self.random_numbers.chunks_mut(k) {
            L::draw(rng, block);
        }
        self.rebuild()
    }

    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError> {
        self.chain.begin_change();
        let k = L::numbers_per_step(self.chain.d);
        let index = rng.below(self.chain.num_steps);
        let block = &mut self.random_numbers[index * k..(index + 1) * k];
        let old = block.to_vec();
        L::draw(rng, block);
        self.undo = Some((index, old));

        let step = L::step(self.chain.d, self.block(index));
        self.chain.set_step(index, step);
        self.chain.update_hull_if(update_hull)
    }

    fn undo_change(&mut self) -> Result<(), WalkError> {
        if let Some((index, old)) = self.undo.take() {
            let k = old.len();
            self.random_numbers[index * k..(index + 1) * k].copy_from_slice(&old);
            let step = L::step(self.chain.d, &old);
            self.chain.set_step(index, step);
            self.chain.restore_hull();
        }
        Ok(())
    }
}
