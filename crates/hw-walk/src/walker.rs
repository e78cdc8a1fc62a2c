use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use hw_core::geometry::cross2d_z;
use hw_core::{ErrorInfo, HullAlgorithm, Observable, RngHandle, Step, WalkError, WalkType};
use hw_hull::ConvexHull;

/// Changes per batch in [`Walker::go_downhill`] before checking for progress.
pub const DEFAULT_STAGNATE: usize = 1000;

/// Positions of a walk, `num_steps + 1` entries starting at the origin.
#[derive(Debug, Clone, Copy)]
pub enum Points<'a> {
    /// Positions on the integer lattice.
    Lattice(&'a [Step<i64>]),
    /// Off-lattice positions.
    Real(&'a [Step<f64>]),
}

impl<'a> Points<'a> {
    /// Number of positions.
    pub fn len(&self) -> usize {
        match self {
            Points::Lattice(p) => p.len(),
            Points::Real(p) => p.len(),
        }
    }

    /// True if there are no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for lattice walks.
    pub fn is_lattice(&self) -> bool {
        matches!(self, Points::Lattice(_))
    }

    /// Coordinate `axis` of position `index` as a float.
    pub fn coordinate(&self, index: usize, axis: usize) -> f64 {
        match self {
            Points::Lattice(p) => p[index].component(axis) as f64,
            Points::Real(p) => p[index].component(axis),
        }
    }

    /// Position `index` converted to floating point.
    pub fn position(&self, index: usize) -> Step<f64> {
        match self {
            Points::Lattice(p) => p[index].to_f64(),
            Points::Real(p) => p[index].clone(),
        }
    }

    /// All positions converted to floating point.
    pub fn to_f64(&self) -> Vec<Step<f64>> {
        (0..self.len()).map(|i| self.position(i)).collect()
    }
}

/// Hand-built extreme configurations used as starting points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Degenerate {
    /// L shape spanning all `d` axes.
    MaxVolume,
    /// L shape in `d - 1` dimensions.
    MaxSurface,
    /// Straight line.
    MinVolume,
    /// Back and forth along the last axis.
    MinSurface,
}

impl Degenerate {
    /// Whether the configuration maximises its observable.
    pub fn maximize(&self) -> bool {
        matches!(self, Degenerate::MaxVolume | Degenerate::MaxSurface)
    }

    /// The hull observable the configuration is extreme in.
    pub fn observable(&self) -> Observable {
        match self {
            Degenerate::MaxVolume | Degenerate::MinVolume => Observable::Volume,
            Degenerate::MaxSurface | Degenerate::MinSurface => Observable::Surface,
        }
    }

    /// Random numbers producing the configuration for a lattice walk.
    ///
    /// Walks that may not revisit sites get a straight line instead of the
    /// back and forth pattern.
    pub fn lattice_numbers(&self, d: usize, len: usize, self_avoiding: bool) -> Vec<f64> {
        let l_shape = |dims: usize| -> Vec<f64> {
            let dims = dims.max(1) as f64;
            (0..len)
                .map(|i| 0.99 / (dims * (i + 1) as f64 / len as f64).ceil())
                .collect()
        };
        match self {
            Degenerate::MaxVolume => l_shape(d),
            Degenerate::MaxSurface => l_shape(d.saturating_sub(1)),
            Degenerate::MinVolume => vec![0.99; len],
            Degenerate::MinSurface if self_avoiding => vec![0.99; len],
            Degenerate::MinSurface => (0..len)
                .map(|i| if i % 2 == 1 { 0.99 } else { 0.99 - 0.5 / d as f64 })
                .collect(),
        }
    }

    /// Starting random numbers for an off-lattice walk, refined downhill afterwards.
    pub fn real_numbers(&self, d: usize, current: &[f64], num_steps: usize) -> Vec<f64> {
        let len = current.len();
        let mut numbers = current.to_vec();
        let l_shape = |numbers: &mut Vec<f64>| {
            let dims = d.saturating_sub(1).max(1) as f64;
            for (i, rn) in numbers.iter_mut().enumerate() {
                *rn = 0.99 / (dims * (i + 1) as f64 / len as f64).ceil();
            }
        };
        match self {
            Degenerate::MaxVolume | Degenerate::MinVolume => {
                for (i, rn) in numbers.iter_mut().take(num_steps).enumerate() {
                    *rn = 0.5 / (i + 1) as f64;
                }
            }
            Degenerate::MaxSurface if d == 2 => numbers.iter_mut().for_each(|rn| *rn = 0.99),
            Degenerate::MaxSurface | Degenerate::MinSurface => l_shape(&mut numbers),
        }
        numbers
    }
}

/// Serialized walker state: everything needed to rebuild the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerRecord {
    /// Walk type of the stored walk.
    pub walk_type: WalkType,
    /// Dimension.
    pub dimension: usize,
    /// Number of steps.
    pub num_steps: usize,
    /// Random numbers the walk is built from.
    pub random_numbers: Vec<f64>,
}

impl WalkerRecord {
    /// Encodes the record with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WalkError> {
        bincode::serialize(self).map_err(|err| {
            WalkError::Serde(ErrorInfo::new("walker-encode", err.to_string()))
        })
    }

    /// Decodes a record written by [`WalkerRecord::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalkError> {
        bincode::deserialize(bytes).map_err(|err| {
            WalkError::Serde(ErrorInfo::new("walker-decode", err.to_string()))
        })
    }
}

/// A random walk fully described by a vector of random numbers.
///
/// Implementations keep the steps, positions and convex hull consistent with
/// the random numbers after every operation. `change` remembers enough to
/// let a single following `undo_change` restore the previous walk and hull.
pub trait Walker: Send {
    /// Kind of walk.
    fn walk_type(&self) -> WalkType;

    /// Dimension of the embedding space.
    fn dimension(&self) -> usize;

    /// Number of steps `N`.
    fn num_steps(&self) -> usize;

    /// Random numbers the current walk is built from.
    fn random_numbers(&self) -> Vec<f64>;

    /// Number of random numbers in use.
    fn nrn(&self) -> usize {
        self.random_numbers().len()
    }

    /// Replaces the state and rebuilds the walk.
    fn set_random_numbers(&mut self, numbers: &[f64]) -> Result<(), WalkError>;

    /// Draws fresh random numbers and rebuilds the walk.
    fn reconstruct(&mut self, rng: &mut RngHandle) -> Result<(), WalkError>;

    /// Produces a walk independent of the current one.
    fn generate_independent_sample(&mut self, rng: &mut RngHandle) -> Result<(), WalkError> {
        self.reconstruct(rng)
    }

    /// Applies a small random modification. The hull is recomputed only if
    /// `update_hull` is set; call [`Walker::update_hull`] later otherwise.
    fn change(&mut self, rng: &mut RngHandle, update_hull: bool) -> Result<(), WalkError>;

    /// Reverts the last [`Walker::change`].
    fn undo_change(&mut self) -> Result<(), WalkError>;

    /// Recomputes the hull of the current positions.
    fn update_hull(&mut self) -> Result<(), WalkError>;

    /// Switches the hull algorithm and recomputes the hull.
    fn set_hull_algorithm(&mut self, algorithm: HullAlgorithm) -> Result<(), WalkError>;

    /// Convex hull of the positions.
    fn hull(&self) -> &ConvexHull;

    /// Positions of the walk.
    fn points(&self) -> Points<'_>;

    /// Start time of [`Observable::Passage`].
    fn passage_start(&self) -> usize;

    /// Sets the start time of [`Observable::Passage`].
    fn set_passage_start(&mut self, t1: usize);

    /// Number of resets to the origin, zero for walks without resetting.
    fn num_resets(&self) -> usize {
        0
    }

    /// Longest stretch of steps without a reset.
    fn longest_streak(&self) -> usize {
        self.steps_taken()
    }

    /// Stored representation of the state.
    fn record(&self) -> WalkerRecord {
        WalkerRecord {
            walk_type: self.walk_type(),
            dimension: self.dimension(),
            num_steps: self.num_steps(),
            random_numbers: self.random_numbers(),
        }
    }

    /// Bincode encoding of [`Walker::record`].
    fn serialize(&self) -> Result<Vec<u8>, WalkError> {
        self.record().to_bytes()
    }

    /// Moves the walk into a degenerate configuration.
    ///
    /// Lattice walks get the configuration exactly. Off-lattice walks start
    /// from an approximation that is improved by [`Walker::go_downhill`].
    fn degenerate(&mut self, kind: Degenerate, rng: &mut RngHandle) -> Result<(), WalkError> {
        if self.points().is_lattice() {
            let self_avoiding = matches!(
                self.walk_type(),
                WalkType::SelfAvoiding | WalkType::LoopErased
            );
            let numbers = kind.lattice_numbers(self.dimension(), self.nrn(), self_avoiding);
            self.set_random_numbers(&numbers)
        } else {
            let numbers =
                kind.real_numbers(self.dimension(), &self.random_numbers(), self.num_steps());
            self.set_random_numbers(&numbers)?;
            self.go_downhill(kind.maximize(), kind.observable(), rng, DEFAULT_STAGNATE)
        }
    }

    /// Greedy optimisation of an observable.
    ///
    /// Batches of `stagnate` changes are applied, each change that does not
    /// improve the observable is undone. Stops once a whole batch improved by
    /// less than `1e-5`.
    fn go_downhill(
        &mut self,
        maximize: bool,
        observable: Observable,
        rng: &mut RngHandle,
        stagnate: usize,
    ) -> Result<(), WalkError> {
        loop {
            let very_old = self.observable(observable);
            for _ in 0..stagnate {
                let old = self.observable(observable);
                self.change(rng, true)?;
                if maximize != (self.observable(observable) > old) {
                    self.undo_change()?;
                }
            }
            let now = self.observable(observable);
            let stalled = if maximize {
                now <= very_old + 1e-5
            } else {
                now >= very_old - 1e-5
            };
            if stalled {
                return Ok(());
            }
        }
    }

    /// Hull volume `A`.
    fn volume(&self) -> f64 {
        self.hull().volume()
    }

    /// Hull surface `L`.
    fn surface(&self) -> f64 {
        self.hull().surface()
    }

    /// Largest distance between two hull vertices.
    fn max_diameter(&self) -> f64 {
        self.hull().max_diameter()
    }

    /// Distance between start and end point.
    fn r(&self) -> f64 {
        let points = self.points();
        let last = points.len() - 1;
        (&points.position(0) - &points.position(last)).length()
    }

    /// Squared distance between start and end point.
    fn r2(&self) -> f64 {
        let r = self.r();
        r * r
    }

    /// x component of start minus end.
    fn rx(&self) -> f64 {
        let points = self.points();
        points.coordinate(0, 0) - points.coordinate(points.len() - 1, 0)
    }

    /// y component of start minus end.
    fn ry(&self) -> f64 {
        let points = self.points();
        points.coordinate(0, 1) - points.coordinate(points.len() - 1, 1)
    }

    /// Index of the first position with minimal x (the origin counts as `x = 0`).
    fn argminx(&self) -> usize {
        let points = self.points();
        let mut best = (0, 0.0);
        for i in 0..points.len() {
            let x = points.coordinate(i, 0);
            if x < best.1 {
                best = (i, x);
            }
        }
        best.0
    }

    /// Index of the first position with maximal x.
    fn argmaxx(&self) -> usize {
        let points = self.points();
        let mut best = (0, 0.0);
        for i in 0..points.len() {
            let x = points.coordinate(i, 0);
            if x > best.1 {
                best = (i, x);
            }
        }
        best.0
    }

    /// Minimal x coordinate.
    fn minx(&self) -> f64 {
        let points = self.points();
        (0..points.len())
            .map(|i| points.coordinate(i, 0))
            .fold(0.0, f64::min)
    }

    /// Maximal x coordinate.
    fn maxx(&self) -> f64 {
        let points = self.points();
        (0..points.len())
            .map(|i| points.coordinate(i, 0))
            .fold(0.0, f64::max)
    }

    /// Number of hull vertices.
    fn num_on_hull(&self) -> usize {
        self.hull().num_vertices()
    }

    /// Longest hull diameter over twice the largest extent perpendicular to it.
    ///
    /// Gives one for a disc. The perpendicular extent is measured in the
    /// xy projection.
    fn oblateness(&self) -> f64 {
        let vertices = self.hull().vertices();
        let mut long_axis = 0.0;
        let (mut a, mut b) = (0, 0);
        for i in 0..vertices.len() {
            for j in 0..i {
                let diameter = vertices[i].dist(&vertices[j]);
                if diameter > long_axis {
                    long_axis = diameter;
                    a = i;
                    b = j;
                }
            }
        }
        if vertices.is_empty() {
            return f64::NAN;
        }

        let project = |v: &Step<f64>| [v.x(), v.y()];
        let (pa, pb) = (project(&vertices[a]), project(&vertices[b]));
        let mut short_axis = 0.0;
        let mut max_cross = 0.0;
        for v in vertices {
            let cross = cross2d_z(&pa, &project(v), &pb).abs();
            if cross > max_cross {
                max_cross = cross;
                short_axis = cross / vertices[a].dist(&vertices[b]);
            }
        }
        long_axis / short_axis / 2.0
    }

    /// Sum of the Euclidean step lengths.
    fn length(&self) -> f64 {
        let points = self.points();
        (1..points.len())
            .map(|i| (&points.position(i) - &points.position(i - 1)).length())
            .sum()
    }

    /// Number of steps performed.
    fn steps_taken(&self) -> usize {
        self.num_steps()
    }

    /// Number of distinct lattice sites visited, `None` off the lattice.
    fn visited_sites(&self) -> Option<usize> {
        match self.points() {
            Points::Lattice(points) => Some(points.iter().collect::<HashSet<_>>().len()),
            Points::Real(_) => None,
        }
    }

    /// Number of lattice sites enclosed by the walk, `None` off the lattice.
    ///
    /// Flood fills the bounding box enlarged by one site from its upper
    /// corner, never entering visited sites. Every site not reached is
    /// enclosed or visited.
    fn enclosed_sites(&self) -> Option<usize> {
        let Points::Lattice(points) = self.points() else {
            return None;
        };
        let d = self.dimension();
        let mut lower = vec![0i64; d];
        let mut upper = vec![0i64; d];
        for p in points {
            for i in 0..d {
                lower[i] = lower[i].min(p[i]);
                upper[i] = upper[i].max(p[i]);
            }
        }
        lower.iter_mut().for_each(|x| *x -= 1);
        upper.iter_mut().for_each(|x| *x += 1);
        let size: usize = lower
            .iter()
            .zip(&upper)
            .map(|(lo, hi)| (hi - lo + 1) as usize)
            .product();

        let visited: HashSet<&Step<i64>> = points.iter().collect();
        let start = Step::from_vec(upper.clone());
        let mut seen = HashSet::new();
        seen.insert(start.clone());
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for n in current.neighbors(false) {
                let inside = (0..d).all(|i| n[i] >= lower[i] && n[i] <= upper[i]);
                if inside && !visited.contains(&n) && !seen.contains(&n) {
                    seen.insert(n.clone());
                    stack.push(n);
                }
            }
        }
        Some(size - seen.len())
    }

    /// First index after `t1` at which the sign of coordinate `axis` flips.
    ///
    /// The reference sign is the first non-zero sign at or after `t1`.
    /// `None` if `t1 >= N` or no flip happens before the last step.
    fn passage(&self, t1: usize, axis: usize) -> Option<usize> {
        let n = self.num_steps();
        if t1 >= n {
            return None;
        }
        let points = self.points();
        let sign = |i: usize| {
            let x = points.coordinate(i, axis);
            if x > 0.0 {
                1
            } else if x < 0.0 {
                -1
            } else {
                0
            }
        };
        let mut t = t1;
        let mut start = sign(t);
        while start == 0 {
            if t >= n {
                return None;
            }
            t += 1;
            start = sign(t);
        }
        (t + 1..n).find(|&i| {
            let s = sign(i);
            s != 0 && s != start
        })
    }

    /// Coordinate `axis` at each of the times `ts`.
    fn correlation(&self, ts: &[usize], axis: usize) -> Result<Vec<f64>, WalkError> {
        let n = self.num_steps();
        if let Some(t) = ts.iter().copied().find(|t| *t >= n) {
            return Err(WalkError::Walker(
                ErrorInfo::new("time-out-of-range", "correlation time beyond the walk")
                    .with_context("t", t.to_string())
                    .with_context("num_steps", n.to_string()),
            ));
        }
        let points = self.points();
        Ok(ts.iter().map(|t| points.coordinate(*t, axis)).collect())
    }

    /// Value of the sampled observable `S`.
    ///
    /// The passage time starts at [`Walker::passage_start`] and is `-1`
    /// when the walk never crosses.
    fn observable(&self, which: Observable) -> f64 {
        match which {
            Observable::Surface => self.surface(),
            Observable::Volume => self.volume(),
            Observable::Passage => self
                .passage(self.passage_start(), 0)
                .map_or(-1.0, |t| t as f64),
        }
    }
}
