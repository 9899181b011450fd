use std::fmt;
use std::iter::FusedIterator;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{RangeError, Result};
use crate::index::{Indexed, SeqIndex, Slice};

/// A lazily evaluated sequence of floats `start, start + step, ...` bounded
/// by the exclusive `stop`.
///
/// The triple is fixed once constructed. Slicing produces a new range and
/// iteration hands out a fresh [`Iter`] each time, so the same range can be
/// traversed any number of times.
///
/// A negative `step` describes a descending sequence that ends before
/// falling to `stop`.
///
/// # Examples
///
/// ```rust
/// # use frange::FloatRange;
/// let r = FloatRange::new(5.0, 0.0, 2.0);
/// assert_eq!(r.iter().collect::<Vec<_>>(), vec![0.0, 2.0, 4.0]);
/// assert_eq!(r.len(), 3);
/// assert_eq!(r.to_string(), "frange(0, 5, 2)");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFloatRange")]
pub struct FloatRange {
    start: f64,
    stop: f64,
    step: f64,
}

#[derive(Deserialize)]
struct RawFloatRange {
    #[serde(default)]
    start: f64,
    stop: f64,
    #[serde(default = "default_step")]
    step: f64,
}

fn default_step() -> f64 {
    1.0
}

impl TryFrom<RawFloatRange> for FloatRange {
    type Error = RangeError;

    fn try_from(raw: RawFloatRange) -> Result<Self> {
        FloatRange::try_new(raw.stop, raw.start, raw.step)
    }
}

impl FloatRange {
    /// Creates a range ending before `stop`. Note the argument order: the
    /// logical stop comes first.
    ///
    /// # Panics
    ///
    /// Panics if `step` is zero or any component is not finite.
    #[inline]
    pub fn new(stop: f64, start: f64, step: f64) -> Self {
        match Self::try_new(stop, start, step) {
            Ok(range) => range,
            Err(err) => panic!("Invalid frange: {err}"),
        }
    }

    /// Creates a range, rejecting a zero `step` and non-finite components.
    ///
    /// ```rust
    /// # use frange::{FloatRange, RangeError};
    /// assert!(FloatRange::try_new(1.0, 0.0, 0.25).is_ok());
    /// assert_eq!(FloatRange::try_new(1.0, 0.0, 0.0), Err(RangeError::ZeroStep));
    /// ```
    pub fn try_new(stop: f64, start: f64, step: f64) -> Result<Self> {
        if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
            return Err(RangeError::NonFinite);
        }
        if step == 0.0 {
            return Err(RangeError::ZeroStep);
        }
        Ok(Self { start, stop, step })
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> f64 {
        self.stop
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of elements, computed without iterating.
    ///
    /// This is `ceil((stop - start) / step)` clamped at zero, less one when
    /// rounding puts the last computed element on or past `stop`.
    pub fn len(&self) -> usize {
        let steps = ((self.stop - self.start) / self.step).ceil();
        if steps <= 0.0 {
            return 0;
        }
        let mut len = steps as usize;
        if !self.before_stop(self.value_at(len - 1)) {
            len -= 1;
        }
        len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<f64> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<f64> {
        self.iter().next_back()
    }

    /// Whether `item` lies on the step grid inside the half-open bounds.
    ///
    /// Alignment is an exact remainder test, so values that are only on the
    /// grid up to rounding are reported as absent.
    pub fn contains(&self, item: f64) -> bool {
        let in_bounds = if self.step > 0.0 {
            self.start <= item && item < self.stop
        } else {
            self.stop < item && item <= self.start
        };
        in_bounds && (item - self.start) % self.step == 0.0
    }

    /// Element at `index`. Negative indices count from the end.
    ///
    /// ```rust
    /// # use frange::FloatRange;
    /// let r = FloatRange::new(10.0, 0.0, 1.0);
    /// assert_eq!(r.get(-1), Ok(9.0));
    /// assert!(r.get(-11).is_err());
    /// ```
    pub fn get(&self, index: isize) -> Result<f64> {
        let len = self.len();
        let position = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        match position {
            Some(k) if k < len => Ok(self.value_at(k)),
            _ => Err(RangeError::IndexOutOfRange { index, len }),
        }
    }

    /// Sub-range selected by slice indices, expressed in this range's
    /// coordinates. Bounds are not clamped to the receiver.
    pub fn slice(&self, slice: Slice) -> Result<FloatRange> {
        let len = self.len() as f64;
        let resolve = |bound: Option<isize>, default: f64| match bound {
            Some(b) if b < 0 => b as f64 + len,
            Some(b) => b as f64,
            None => default,
        };
        let lo = resolve(slice.start, 0.0);
        let hi = resolve(slice.stop, len);
        let stride = slice.step.unwrap_or(1) as f64;

        FloatRange::try_new(
            self.start + self.step * hi,
            self.start + self.step * lo,
            stride * self.step,
        )
    }

    pub fn index(&self, index: impl Into<SeqIndex>) -> Result<Indexed> {
        match index.into() {
            SeqIndex::Index(i) => self.get(i).map(Indexed::Value),
            SeqIndex::Slice(s) => self.slice(s).map(Indexed::Range),
        }
    }

    /// Starts a fresh traversal.
    #[inline]
    pub fn iter(&self) -> Iter {
        Iter {
            start: self.start,
            step: self.step,
            front: 0,
            back: self.len(),
        }
    }

    /// Parallel traversal backed by indexed access.
    pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = f64> + use<> {
        let (start, step) = (self.start, self.step);
        (0..self.len())
            .into_par_iter()
            .map(move |k| start + k as f64 * step)
    }

    #[inline]
    fn value_at(&self, k: usize) -> f64 {
        self.start + k as f64 * self.step
    }

    #[inline]
    fn before_stop(&self, value: f64) -> bool {
        if self.step > 0.0 {
            value < self.stop
        } else {
            value > self.stop
        }
    }
}

impl fmt::Display for FloatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frange({}, {}, {})", self.start, self.stop, self.step)
    }
}

impl IntoIterator for FloatRange {
    type Item = f64;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

impl IntoIterator for &FloatRange {
    type Item = f64;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

/// Cursor over a [`FloatRange`]. Owns its position; the range is untouched.
#[derive(Clone, Debug)]
pub struct Iter {
    start: f64,
    step: f64,
    front: usize,
    back: usize,
}

impl Iter {
    #[inline]
    fn value_at(&self, k: usize) -> f64 {
        self.start + k as f64 * self.step
    }
}

impl Iterator for Iter {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let res = self.value_at(self.front);
        self.front += 1;
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Iter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.value_at(self.back))
    }
}

impl ExactSizeIterator for Iter {}

impl FusedIterator for Iter {}

/// Range-style constructor: `frange(stop, None, None)`,
/// `frange(start, Some(stop), None)` or `frange(start, Some(stop), Some(step))`.
///
/// # Panics
///
/// Panics on a zero step or non-finite arguments. See [`try_frange`].
///
/// ```rust
/// # use frange::{frange, FloatRange};
/// assert_eq!(frange(5.0, None, None), FloatRange::new(5.0, 0.0, 1.0));
/// assert_eq!(frange(2.0, Some(10.0), Some(3.0)), FloatRange::new(10.0, 2.0, 3.0));
/// ```
pub fn frange(start: f64, stop: Option<f64>, step: Option<f64>) -> FloatRange {
    match try_frange(start, stop, step) {
        Ok(range) => range,
        Err(err) => panic!("Invalid frange: {err}"),
    }
}

pub fn try_frange(start: f64, stop: Option<f64>, step: Option<f64>) -> Result<FloatRange> {
    let step = step.unwrap_or(1.0);
    match stop {
        Some(stop) => FloatRange::try_new(stop, start, step),
        None => FloatRange::try_new(start, 0.0, step),
    }
}
