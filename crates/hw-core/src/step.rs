//! `d`-dimensional steps and positions for lattice and off-lattice walks.

use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Scalar type a [`Step`] can be built from.
///
/// Implemented for `i64` (lattice walks) and `f64` (off-lattice walks).
pub trait Coord:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + SubAssign
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// Additive identity.
    const ZERO: Self;

    /// Lossless (for lattice coordinates below 2^53) conversion to `f64`.
    fn to_f64(self) -> f64;

    /// Distance between two coordinate vectors.
    ///
    /// Lattice coordinates use the Manhattan metric, real ones the Euclidean.
    fn distance(a: &[Self], b: &[Self]) -> f64;
}

impl Coord for i64 {
    const ZERO: Self = 0;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn distance(a: &[Self], b: &[Self]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).unsigned_abs())
            .sum::<u64>() as f64
    }
}

impl Coord for f64 {
    const ZERO: Self = 0.0;

    fn to_f64(self) -> f64 {
        self
    }

    fn distance(a: &[Self], b: &[Self]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}

/// A `d`-component vector used both as displacement and as position.
#[derive(Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Step<T> {
    coords: Vec<T>,
}

impl<T: Coord> Step<T> {
    /// The zero vector in `d` dimensions.
    pub fn zeros(d: usize) -> Self {
        Self {
            coords: vec![T::ZERO; d],
        }
    }

    /// Wraps an explicit coordinate vector.
    pub fn from_vec(coords: Vec<T>) -> Self {
        Self { coords }
    }

    /// Dimension of the vector.
    pub fn d(&self) -> usize {
        self.coords.len()
    }

    /// Coordinates as a slice.
    pub fn coords(&self) -> &[T] {
        &self.coords
    }

    /// Mutable coordinates.
    pub fn coords_mut(&mut self) -> &mut [T] {
        &mut self.coords
    }

    /// First component.
    pub fn x(&self) -> T {
        self.component(0)
    }

    /// Second component.
    pub fn y(&self) -> T {
        self.component(1)
    }

    /// Third component.
    pub fn z(&self) -> T {
        self.component(2)
    }

    /// Component `i`, zero if the vector has fewer dimensions.
    pub fn component(&self, i: usize) -> T {
        self.coords.get(i).copied().unwrap_or(T::ZERO)
    }

    /// Resets every component to zero.
    pub fn set_zero(&mut self) {
        self.coords.iter_mut().for_each(|c| *c = T::ZERO);
    }

    /// True if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.coords.iter().all(|c| *c == T::ZERO)
    }

    /// Scalar product.
    pub fn dot(&self, other: &Self) -> T {
        self.coords
            .iter()
            .zip(&other.coords)
            .fold(T::ZERO, |acc, (a, b)| acc + *a * *b)
    }

    /// Squared Euclidean length.
    pub fn length2(&self) -> f64 {
        self.coords.iter().map(|c| c.to_f64() * c.to_f64()).sum()
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.length2().sqrt()
    }

    /// Angle of the projection on the `(i, j)` plane.
    pub fn angle(&self, i: usize, j: usize) -> f64 {
        self.component(j).to_f64().atan2(self.component(i).to_f64())
    }

    /// Distance to `other` (Manhattan on the lattice, Euclidean otherwise).
    pub fn dist(&self, other: &Self) -> f64 {
        T::distance(&self.coords, &other.coords)
    }

    /// Cross product, only meaningful for `d == 3`.
    pub fn cross(&self, other: &Self) -> Self {
        let (a, b) = (self, other);
        Self::from_vec(vec![
            a.y() * b.z() - a.z() * b.y(),
            a.z() * b.x() - a.x() * b.z(),
            a.x() * b.y() - a.y() * b.x(),
        ])
    }

    /// Converts the vector to floating point coordinates.
    pub fn to_f64(&self) -> Step<f64> {
        Step::from_vec(self.coords.iter().map(|c| c.to_f64()).collect())
    }
}

impl Step<i64> {
    /// Builds a lattice unit step from a number in `[0, 1)`.
    ///
    /// The interval is cut into `2d` slices: direction `i` covers
    /// `[i/d, (i+1)/d)`, its lower half is the positive direction.
    /// Values `>= 1` produce the zero step.
    pub fn from_rn(d: usize, rn: f64) -> Self {
        let mut step = Self::zeros(d);
        step.fill_from_rn(rn);
        step
    }

    /// Overwrites this step with the lattice unit step encoded by `rn`.
    pub fn fill_from_rn(&mut self, rn: f64) {
        self.set_zero();
        let scaled = rn * self.d() as f64;
        for i in 0..self.d() {
            if scaled < (i + 1) as f64 {
                self.coords[i] = if scaled - (i as f64) < 0.5 { 1 } else { -1 };
                break;
            }
        }
    }

    /// Inverse of [`Step::from_rn`]: a number at the centre of the slice encoding this step.
    pub fn read_to_rn(&self) -> f64 {
        let d = self.d() as f64;
        for (i, c) in self.coords.iter().enumerate() {
            if *c != 0 {
                let mut rn = i as f64 / d + 0.5 / (2.0 * d);
                if *c < 0 {
                    rn += 0.5 / d;
                }
                return rn;
            }
        }
        0.0
    }

    /// Lattice neighbours: `2d` direct ones, `3^d - 1` if diagonals are included.
    pub fn neighbors(&self, diagonal: bool) -> Vec<Self> {
        let d = self.d();
        if !diagonal {
            let mut out = Vec::with_capacity(2 * d);
            for i in 0..d {
                let mut up = self.clone();
                up.coords[i] += 1;
                out.push(up);
                let mut down = self.clone();
                down.coords[i] -= 1;
                out.push(down);
            }
            return out;
        }

        let total = 3usize.pow(d as u32);
        let mut out = Vec::with_capacity(total - 1);
        for code in 0..total {
            let mut rest = code;
            let mut neighbor = self.clone();
            let mut moved = false;
            for i in 0..d {
                let offset = (rest % 3) as i64 - 1;
                rest /= 3;
                neighbor.coords[i] += offset;
                moved |= offset != 0;
            }
            if moved {
                out.push(neighbor);
            }
        }
        out
    }

    /// The step rotated by a quarter turn counter-clockwise (2D).
    pub fn left_turn(&self) -> Self {
        Self::from_vec(vec![-self.y(), self.x()])
    }

    /// The step rotated by a quarter turn clockwise (2D).
    pub fn right_turn(&self) -> Self {
        Self::from_vec(vec![self.y(), -self.x()])
    }

    /// Turn from this step into `next` (2D): `+1` left, `-1` right, `0` otherwise.
    pub fn winding_angle(&self, next: &Self) -> i32 {
        if *next == self.left_turn() {
            1
        } else if *next == self.right_turn() {
            -1
        } else {
            0
        }
    }
}

impl Eq for Step<i64> {}

impl Ord for Step<i64> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.coords.cmp(&other.coords)
    }
}

impl Hash for Step<i64> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coords.hash(state);
    }
}

impl<T: Coord> Debug for Step<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, c) in self.coords.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

impl<T: Coord> Display for Step<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, c) in self.coords.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl<T> Index<usize> for Step<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.coords[index]
    }
}

impl<T> IndexMut<usize> for Step<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.coords[index]
    }
}

impl<T: Coord> Add<&Step<T>> for &Step<T> {
    type Output = Step<T>;

    fn add(self, other: &Step<T>) -> Step<T> {
        Step::from_vec(
            self.coords
                .iter()
                .zip(&other.coords)
                .map(|(a, b)| *a + *b)
                .collect(),
        )
    }
}

impl<T: Coord> Add for Step<T> {
    type Output = Step<T>;

    fn add(self, other: Step<T>) -> Step<T> {
        &self + &other
    }
}

impl<T: Coord> Sub<&Step<T>> for &Step<T> {
    type Output = Step<T>;

    fn sub(self, other: &Step<T>) -> Step<T> {
        Step::from_vec(
            self.coords
                .iter()
                .zip(&other.coords)
                .map(|(a, b)| *a - *b)
                .collect(),
        )
    }
}

impl<T: Coord> Sub for Step<T> {
    type Output = Step<T>;

    fn sub(self, other: Step<T>) -> Step<T> {
        &self - &other
    }
}

impl<T: Coord> Neg for &Step<T> {
    type Output = Step<T>;

    fn neg(self) -> Step<T> {
        Step::from_vec(self.coords.iter().map(|c| -*c).collect())
    }
}

impl<T: Coord> Neg for Step<T> {
    type Output = Step<T>;

    fn neg(self) -> Step<T> {
        -&self
    }
}

impl<T: Coord> Mul<T> for &Step<T> {
    type Output = Step<T>;

    fn mul(self, factor: T) -> Step<T> {
        Step::from_vec(self.coords.iter().map(|c| *c * factor).collect())
    }
}

impl<T: Coord> AddAssign<&Step<T>> for Step<T> {
    fn add_assign(&mut self, other: &Step<T>) {
        for (a, b) in self.coords.iter_mut().zip(&other.coords) {
            *a += *b;
        }
    }
}

impl<T: Coord> SubAssign<&Step<T>> for Step<T> {
    fn sub_assign(&mut self, other: &Step<T>) {
        for (a, b) in self.coords.iter_mut().zip(&other.coords) {
            *a -= *b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rn_covers_every_direction_once() {
        let d = 3;
        let mut seen = std::collections::BTreeSet::new();
        for k in 0..(2 * d) {
            let rn = (k as f64 + 0.5) / (2 * d) as f64;
            let step = Step::from_rn(d, rn);
            assert_eq!(step.length2(), 1.0);
            seen.insert(step);
        }
        assert_eq!(seen.len(), 2 * d);
    }

    #[test]
    fn rn_out_of_range_is_zero_step() {
        assert!(Step::from_rn(2, 1.0).is_zero());
    }
}
