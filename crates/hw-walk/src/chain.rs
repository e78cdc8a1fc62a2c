//! Steps, positions and hull shared by every walk type.

use hw_core::{Coord, ErrorInfo, HullAlgorithm, Step, WalkError, WalkType};
use hw_hull::ConvexHull;

pub(crate) struct Chain<T: Coord> {
    pub d: usize,
    pub num_steps: usize,
    pub steps: Vec<Step<T>>,
    pub points: Vec<Step<T>>,
    pub hull: ConvexHull,
    pub passage_start: usize,
    saved_hull: Option<ConvexHull>,
    algorithm: HullAlgorithm,
}

impl<T: Coord> Chain<T> {
    pub fn new(d: usize, num_steps: usize, algorithm: HullAlgorithm) -> Self {
        Self {
            d,
            num_steps,
            steps: vec![Step::zeros(d); num_steps],
            points: vec![Step::zeros(d); num_steps + 1],
            hull: ConvexHull::empty(d, algorithm),
            passage_start: 0,
            saved_hull: None,
            algorithm,
        }
    }

    /// Replaces every step and recomputes the positions, not the hull.
    pub fn set_steps(&mut self, steps: Vec<Step<T>>) {
        self.steps = steps;
        self.update_points(1);
    }

    /// Replaces step `index` and moves every later position.
    pub fn set_step(&mut self, index: usize, step: Step<T>) {
        self.steps[index] = step;
        self.update_points(index + 1);
    }

    pub fn update_points(&mut self, start: usize) {
        for i in start.max(1)..=self.num_steps {
            self.points[i] = &self.points[i - 1] + &self.steps[i - 1];
        }
    }

    /// Forgets the hull remembered by the previous change.
    pub fn begin_change(&mut self) {
        self.saved_hull = None;
    }

    /// Recomputes the hull and remembers the old one for [`Chain::restore_hull`].
    pub fn update_hull(&mut self) -> Result<(), WalkError> {
        let fresh = ConvexHull::new(&self.points, self.algorithm)?;
        self.saved_hull = Some(std::mem::replace(&mut self.hull, fresh));
        Ok(())
    }

    pub fn update_hull_if(&mut self, update: bool) -> Result<(), WalkError> {
        if update {
            self.update_hull()
        } else {
            Ok(())
        }
    }

    pub fn restore_hull(&mut self) {
        if let Some(hull) = self.saved_hull.take() {
            self.hull = hull;
        }
    }

    pub fn set_algorithm(&mut self, algorithm: HullAlgorithm) -> Result<(), WalkError> {
        self.algorithm = algorithm;
        self.update_hull()
    }
}

/// Fails with `walker-state-length` unless `numbers` has `expected` entries.
pub(crate) fn check_len(
    walk_type: WalkType,
    numbers: &[f64],
    expected: usize,
) -> Result<(), WalkError> {
    if numbers.len() == expected {
        return Ok(());
    }
    Err(WalkError::Walker(
        ErrorInfo::new(
            "walker-state-length",
            format!("{walk_type} walk expects {expected} random numbers"),
        )
        .with_context("expected", expected.to_string())
        .with_context("actual", numbers.len().to_string()),
    ))
}

/// Unit vector (scaled by `radius`) from hyperspherical angles.
///
/// `x_0 = cos a_0`, `x_k = sin a_0 .. sin a_{k-1} cos a_k` and the last
/// component is the product of all sines.
pub(crate) fn spherical(radius: f64, angles: &[f64]) -> Step<f64> {
    let d = angles.len() + 1;
    let mut coords = Vec::with_capacity(d);
    let mut sines = radius;
    for angle in angles {
        coords.push(sines * angle.cos());
        sines *= angle.sin();
    }
    coords.push(sines);
    Step::from_vec(coords)
}

/// Uniform numbers in `[0, 1)` to hyperspherical angles: `pi u` for all but
/// the last, which covers the full circle.
pub(crate) fn angles_from_uniform(numbers: &[f64]) -> Vec<f64> {
    let last = numbers.len().saturating_sub(1);
    numbers
        .iter()
        .enumerate()
        .map(|(k, u)| {
            if k == last {
                2.0 * std::f64::consts::PI * u
            } else {
                std::f64::consts::PI * u
            }
        })
        .collect()
}

/// Delegates the bookkeeping methods of [`crate::Walker`] to a `chain` field.
macro_rules! delegate_chain {
    ($variant:ident) => {
        fn dimension(&self) -> usize {
            self.chain.d
        }

        fn num_steps(&self) -> usize {
            self.chain.num_steps
        }

        fn hull(&self) -> &hw_hull::ConvexHull {
            &self.chain.hull
        }

        fn points(&self) -> $crate::walker::Points<'_> {
            $crate::walker::Points::$variant(&self.chain.points)
        }

        fn passage_start(&self) -> usize {
            self.chain.passage_start
        }

        fn set_passage_start(&mut self, t1: usize) {
            self.chain.passage_start = t1;
        }

        fn update_hull(&mut self) -> Result<(), hw_core::WalkError> {
            self.chain.update_hull()
        }

        fn set_hull_algorithm(
            &mut self,
            algorithm: hw_core::HullAlgorithm,
        ) -> Result<(), hw_core::WalkError> {
            self.chain.set_algorithm(algorithm)
        }
    };
}

pub(crate) use delegate_chain;
